mod app;
mod commands;
mod output;

use anyhow::Context;
use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .context("failed to set Ctrl+C handler")?;

    let cli = Cli::parse();

    // dotdoc info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("dotdoc", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Parse {
            path,
            no_namespaces,
            parser,
        } => commands::parse::run(path, !*no_namespaces, parser, &cli.global),
        Command::Key {
            path,
            undocumented,
            parser,
        } => commands::key::run(path, *undocumented, parser, &cli.global),
        Command::Lookup { xml, key } => commands::lookup::run(xml, key, &cli.global),
    }
}
