// CLI entry point for the brick map tools.
//
// Generates random brick maps, validates and describes map files, and
// manages a JSON-file map store. Logs go to stderr through `tracing`
// (filter with `RUST_LOG`, default `info`); command output goes to stdout.
// See `args.rs` for the command grammar and `commands.rs` for execution.
//
// Usage:
//   bricks generate [--bricks N] [--seed S] [--max-height H] [--name NAME]
//                   [--config FILE] [--save-as ID] [--store FILE]
//   bricks validate <FILE>
//   bricks describe <FILE>
//   bricks store (list | show <ID> | delete <ID>) [--store FILE]
//
// Exit codes: 0 success, 1 usage error or a map that failed validation,
// 2 client error (bad request, bad input, unlucky generation), 3 internal
// error (I/O failure, broken invariant).

mod args;
mod commands;

use brick_map::error::ErrorClass;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let command = match args::parse_args(&argv) {
        Ok(command) => command,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!("{}", args::usage());
            std::process::exit(1);
        }
    };

    match commands::run(command) {
        Ok(output) => {
            if !output.text.is_empty() {
                println!("{}", output.text.trim_end());
            }
            if !output.success {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!(error = %e, "command failed");
            let code = match e.class() {
                ErrorClass::Client => 2,
                ErrorClass::Internal => 3,
            };
            std::process::exit(code);
        }
    }
}
