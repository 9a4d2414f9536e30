//! fastdev CLI - Command-line interface
//!
//! This binary runs the fastdev development server and manages its
//! configuration file.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::serve::{BackendArg, ServeArgs};

#[derive(Parser)]
#[command(name = "fastdev")]
#[command(version = fastdev::VERSION)]
#[command(about = "Development server that compiles TypeScript and Sass on request", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a directory, compiling sources on request
    Serve {
        /// Host to bind ("localhost" binds every interface)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind
        #[arg(long, short)]
        port: Option<u16>,

        /// Directory to serve (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Compile backend for scripts
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,

        /// Disable minification of compiled output
        #[arg(long)]
        no_minify: bool,

        /// Config file to use instead of ~/.fastdev/config.ini
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enable debug logging
        #[arg(long)]
        debug: bool,
    },

    /// Manage the configuration file
    Config {
        /// Config file to use instead of ~/.fastdev/config.ini
        #[arg(long, global = true)]
        config: Option<PathBuf>,

        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            host,
            port,
            root,
            backend,
            no_minify,
            config,
            debug,
        } => commands::serve::run(ServeArgs {
            host,
            port,
            root,
            backend,
            no_minify,
            config,
            debug,
        }),
        Commands::Config { config, command } => commands::config::run(command, config),
    };

    if let Err(e) = result {
        e.exit();
    }
}
