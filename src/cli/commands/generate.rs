//! `lockbox generate` — print a random password.  Needs no vault.

use crate::cli::output;
use crate::cli::{copy_to_clipboard, GenerateArgs};
use crate::crypto::generator::{self, GeneratorOptions};
use crate::errors::Result;

/// Execute the `generate` command.
pub fn execute(args: &GenerateArgs, copy: bool) -> Result<()> {
    let password = generator::generate(&options(args));

    if copy {
        copy_to_clipboard(&password)?;
        output::success("Generated password copied to clipboard.");
    } else {
        println!("{}", password.as_str());
    }
    Ok(())
}

fn options(args: &GenerateArgs) -> GeneratorOptions {
    GeneratorOptions {
        length: args.length,
        uppercase: !args.no_uppercase,
        lowercase: !args.no_lowercase,
        digits: !args.no_digits,
        symbols: !args.no_symbols,
        exclude_look_alikes: !args.allow_look_alikes,
    }
}
