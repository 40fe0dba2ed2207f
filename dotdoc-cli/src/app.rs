use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dotdoc::ParserConfig;

/// dotdoc - documented API of .NET assemblies
#[derive(Debug, Parser)]
#[command(name = "dotdoc", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Which members are listed and how keys are spelled.
#[derive(Debug, Args)]
pub struct ParserOptions {
    /// List public members only.
    #[arg(long, conflicts_with = "complete")]
    pub public_only: bool,

    /// List members of every accessibility and use compiler-style generic method keys.
    #[arg(long)]
    pub complete: bool,

    /// Append the generic arity to generic method names in keys (``Map``1``).
    #[arg(long)]
    pub arity: bool,

    /// Extension of the documentation file next to the binary.
    #[arg(long, value_name = "EXT", default_value = "xml")]
    pub extension: String,
}

impl ParserOptions {
    pub fn config(&self) -> ParserConfig {
        let mut config = if self.complete {
            ParserConfig::complete()
        } else if self.public_only {
            ParserConfig::public_only()
        } else {
            ParserConfig::default()
        };
        if self.arity {
            config.method_arity_suffix = true;
        }
        config.with_comments_extension(self.extension.as_str())
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the documentation tree of an assembly and print it.
    Parse {
        /// Path to the .NET assembly file; its documentation file must sit next to it.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Only read the assembly identity; the documentation file is not needed.
        #[arg(long)]
        no_namespaces: bool,

        #[command(flatten)]
        parser: ParserOptions,
    },

    /// List the documentation key of every visible type and member.
    Key {
        /// Path to the .NET assembly file.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Show only keys the documentation file has no entry for.
        #[arg(long)]
        undocumented: bool,

        #[command(flatten)]
        parser: ParserOptions,
    },

    /// Print the documentation stored under one key.
    Lookup {
        /// Path to the XML documentation file.
        #[arg(value_name = "XML")]
        xml: PathBuf,

        /// Member key, e.g. M:Acme.Widget.Resize(System.Int32).
        #[arg(value_name = "KEY")]
        key: String,
    },
}
