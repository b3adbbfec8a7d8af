//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, ControlFlags, OutputFlags};
use crate::commands;
use crate::infra::config::YamlConfigLoader;

/// Manage virtual BMCs for hypervisor domains
#[derive(Parser)]
#[command(
    name = "vbmc",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Print the raw control reply as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    ///
    /// `NO_COLOR` follows the usual convention: any value other than an
    /// empty or false-like one disables color.
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Configuration file (overrides $VIRTUALBMC_CONFIG)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Control channel port (overrides the configured server_port)
    #[arg(long, global = true, value_name = "PORT")]
    pub server_port: Option<u16>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new BMC for a domain
    Add(commands::add::AddArgs),

    /// Delete BMCs
    Delete(commands::DomainNames),

    /// Start BMCs
    Start(commands::DomainNames),

    /// Stop BMCs
    Stop(commands::DomainNames),

    /// List all BMCs
    List,

    /// Show the properties of one BMC
    Show {
        /// Name of the domain
        domain_name: String,
    },
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, the arguments are
    /// invalid, or the control plane cannot be reached.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            config,
            server_port,
            command,
        } = self;
        let config = YamlConfigLoader::new(config).load()?;
        let app = AppContext::new(
            &OutputFlags {
                no_color,
                quiet,
                json,
            },
            &ControlFlags {
                port: server_port.unwrap_or(config.server.server_port),
                timeout: config.response_timeout(),
            },
        );

        match command {
            Command::Add(args) => commands::add::run(&app, args).await,
            Command::Delete(args) => commands::delete::run(&app, args).await,
            Command::Start(args) => commands::start::run(&app, args).await,
            Command::Stop(args) => commands::stop::run(&app, args).await,
            Command::List => commands::list::run(&app).await,
            Command::Show { domain_name } => commands::show::run(&app, domain_name).await,
        }
    }
}
