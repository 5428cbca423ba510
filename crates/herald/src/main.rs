// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Herald - a notification plugin host.
//!
//! This is the binary entry point for the Herald daemon.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use herald_config::HeraldConfig;

/// Herald - a notification plugin host.
#[derive(Parser, Debug)]
#[command(name = "herald", version, about, long_about = None)]
struct Cli {
    /// Explicit configuration file (skips the XDG search hierarchy).
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Herald daemon (default).
    Serve {
        /// Override the plugin directory from configuration.
        #[arg(long, value_name = "DIR")]
        plugins_dir: Option<PathBuf>,
    },
    /// Inspect Herald configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Validate the configuration and exit.
    Check,
    /// Print the effective configuration as TOML.
    Show,
}

fn load_config(path: Option<&PathBuf>) -> HeraldConfig {
    let result = match path {
        Some(path) => herald_config::load_and_validate_path(path),
        None => herald_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            herald_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref());

    match cli.command {
        Some(Commands::Config { action }) => match action {
            ConfigAction::Check => {
                println!("configuration ok");
            }
            ConfigAction::Show => match toml::to_string_pretty(&config) {
                Ok(rendered) => print!("{rendered}"),
                Err(e) => {
                    eprintln!("herald: failed to render configuration: {e}");
                    std::process::exit(1);
                }
            },
        },
        // `serve` is the default when no subcommand is given.
        command => {
            if let Some(Commands::Serve {
                plugins_dir: Some(dir),
            }) = command
            {
                config.plugins.dir = dir.display().to_string();
            }
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("herald: {e}");
                std::process::exit(1);
            }
        }
    }
}
