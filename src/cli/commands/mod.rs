//! One module per subcommand; each exposes an `execute` function.

pub mod add;
pub mod categories;
pub mod dates;
pub mod delete;
pub mod edit;
pub mod generate;
pub mod get;
pub mod init;
pub mod list;
