// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Trestle command-line interface.
//!
//! This is the main entry point for the `trestle` command.

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, Subcommand};
use miette::Result;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod diagnostic;

use commands::parse::{GrammarChoice, TreeFormat};

/// Trestle: lossless device-tree source parsing
#[derive(Debug, Parser)]
#[command(name = "trestle")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (default: `trestle.toml` in the working directory)
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse one file and print its syntax tree
    Parse {
        /// Source file to parse
        file: Utf8PathBuf,

        /// Grammar to parse the file with
        #[arg(long, value_enum, default_value_t = GrammarChoice::Dts)]
        grammar: GrammarChoice,

        /// How to print the tree
        #[arg(long, value_enum, default_value_t = TreeFormat::Tree)]
        format: TreeFormat,

        /// Parse embedded macros and print their trees too
        #[arg(long)]
        expand_macros: bool,
    },

    /// Check device-tree sources for syntax errors
    Check {
        /// Files or directories to check
        #[arg(default_value = ".")]
        paths: Vec<Utf8PathBuf>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    let directive = match (&config.log.filter, cli.verbose) {
        (Some(filter), 0) => filter.clone(),
        _ => directive_for_verbosity(cli.verbose).to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Parse {
            file,
            grammar,
            format,
            expand_macros,
        } => commands::parse::run(&file, grammar, format, expand_macros, &config.parse),
        Command::Check { paths } => commands::check::run(&paths, &config.parse),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "trestle=info,trestle_core=warn",
        1 => "trestle=debug,trestle_core=debug",
        _ => "trestle=trace,trestle_core=trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn directive_defaults() {
        assert_eq!(directive_for_verbosity(0), "trestle=info,trestle_core=warn");
        assert_eq!(directive_for_verbosity(1), "trestle=debug,trestle_core=debug");
        assert_eq!(directive_for_verbosity(5), "trestle=trace,trestle_core=trace");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_flags() {
        let cli = Cli::parse_from([
            "trestle",
            "-vv",
            "parse",
            "board.dts",
            "--format",
            "sexp",
            "--expand-macros",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Parse {
            file,
            grammar,
            format,
            expand_macros,
        } = cli.command
        else {
            panic!("expected the parse command");
        };
        assert_eq!(file, "board.dts");
        assert_eq!(grammar, GrammarChoice::Dts);
        assert_eq!(format, TreeFormat::Sexp);
        assert!(expand_macros);
    }

    #[test]
    fn check_defaults_to_current_directory() {
        let cli = Cli::parse_from(["trestle", "check"]);
        let Command::Check { paths } = cli.command else {
            panic!("expected the check command");
        };
        assert_eq!(paths, vec![Utf8PathBuf::from(".")]);
    }
}
