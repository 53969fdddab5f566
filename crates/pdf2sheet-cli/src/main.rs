mod blocks_cmd;
mod cli;
mod convert_cmd;
mod page_range;
mod shared;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    shared::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            ref file,
            ref output,
            ref extraction,
            no_numbers,
            ref sheet_prefix,
            metadata,
        } => convert_cmd::run(
            file,
            convert_cmd::ConvertOptions {
                output: output.as_deref(),
                extraction,
                no_numbers,
                sheet_prefix,
                metadata,
            },
        ),
        Commands::Blocks {
            ref file,
            ref extraction,
            format,
        } => blocks_cmd::run(file, extraction, format),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
