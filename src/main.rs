use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lockbox::cli::commands::{self, edit::EditArgs};
use lockbox::cli::{output, Cli, Commands};

/// Log to stderr; stdout carries command output.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lockbox=warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::Add {
            ref title,
            ref fields,
        } => commands::add::execute(&cli, title, fields),
        Commands::Get { id, copy } => commands::get::execute(&cli, id, copy),
        Commands::List {
            ref category,
            ref search,
        } => commands::list::execute(&cli, category.as_deref(), search.as_deref()),
        Commands::Edit {
            id,
            ref title,
            ref fields,
            unfavorite,
            no_expiry,
        } => {
            let args = EditArgs {
                title: title.as_deref(),
                fields,
                unfavorite,
                no_expiry,
            };
            commands::edit::execute(&cli, id, &args)
        }
        Commands::Delete { id, force } => commands::delete::execute(&cli, id, force),
        Commands::Categories { ref add } => commands::categories::execute(&cli, add.as_deref()),
        Commands::Generate { ref options, copy } => commands::generate::execute(options, copy),
        Commands::Dates { ref action } => commands::dates::execute(&cli, action),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
