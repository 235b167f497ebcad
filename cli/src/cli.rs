// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, ffi::OsString, path::PathBuf};

use clap::{ArgAction, ArgMatches, Command, ValueHint, arg, builder::styling, crate_version, value_parser};
use tracing_subscriber::EnvFilter;

use crate::cmd_discover::CmdDiscover;
use crate::cmd_sync::CmdSync;
use crate::config::parse_config;

/// Name of the binary, also used for the config and state directories.
pub const APP_NAME: &str = "davsync";

/// Run the davsync command-line interface.
pub async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse()?;
    init_tracing(cli.verbose);
    cli.run().await
}

/// Logs to stderr; `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Command-line interface
#[derive(Debug)]
pub struct Cli {
    /// Path to the configuration file
    pub config: Option<PathBuf>,

    /// Number of `-v` flags
    pub verbose: u8,

    /// The command to execute
    pub command: Commands,
}

impl Cli {
    /// Create the command-line interface
    pub fn command() -> Command {
        const STYLES: styling::Styles = styling::Styles::styled()
            .header(styling::AnsiColor::Green.on_default().bold())
            .usage(styling::AnsiColor::Green.on_default().bold())
            .literal(styling::AnsiColor::Blue.on_default().bold())
            .placeholder(styling::AnsiColor::Cyan.on_default());

        Command::new(APP_NAME)
            .about("Synchronize CalDAV/CardDAV collections with a local store.")
            .author("Zexin Yuan <aim@yzx9.xyz>")
            .version(crate_version!())
            .styles(STYLES)
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                arg!(-c --config [CONFIG] "Path to the configuration file")
                    .long_help(
                        "\
Path to the configuration file. Defaults to $DAVSYNC_CONFIG, then \
$XDG_CONFIG_HOME/davsync/config.toml on Linux and MacOS, %APPDATA%/davsync/config.toml on Windows.",
                    )
                    .global(true)
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
            .arg(
                arg!(-v --verbose "Log more, repeat for even more")
                    .global(true)
                    .action(ArgAction::Count),
            )
            .subcommand(CmdSync::command())
            .subcommand(CmdDiscover::command())
    }

    /// Parse the command-line arguments
    pub fn parse() -> Result<Self, Box<dyn Error>> {
        let commands = Self::command();
        let matches = commands.get_matches();
        Self::from(&matches)
    }

    /// Parse the specified arguments
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, Box<dyn Error>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let commands = Self::command();
        let matches = commands.try_get_matches_from(args)?;
        Self::from(&matches)
    }

    /// Create a CLI instance from the `ArgMatches`
    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let command = match matches.subcommand() {
            Some((CmdSync::NAME, matches)) => Commands::Sync(CmdSync::from(matches)),
            Some((CmdDiscover::NAME, matches)) => Commands::Discover(CmdDiscover::from(matches)?),
            _ => return Err("No command given".into()),
        };

        Ok(Cli {
            config: matches.get_one("config").cloned(),
            verbose: matches.get_count("verbose"),
            command,
        })
    }

    /// Run the command
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        self.command.run(self.config).await
    }
}

/// The commands available in the CLI
#[derive(Debug, Clone)]
pub enum Commands {
    /// Synchronize configured collections
    Sync(CmdSync),

    /// List the home sets reachable from a principal
    Discover(CmdDiscover),
}

impl Commands {
    /// Run the command with the given configuration
    pub async fn run(self, config: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
        tracing::debug!("parsing configuration...");
        let config = parse_config(config).await?;
        match self {
            Self::Sync(a) => a.run(&config).await,
            Self::Discover(a) => a.run(&config).await,
        }
    }
}
