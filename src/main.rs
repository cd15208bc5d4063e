// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::{Parser, Subcommand};
use jdkscan::commands::detect::DetectCommand;
use jdkscan::commands::watch::WatchCommand;
use jdkscan::config::ScanConfig;
use jdkscan::error::Result;
use jdkscan::logging;

#[derive(Parser)]
#[command(name = "jdkscan")]
#[command(author, version, about = "JDK installation detection tool", long_about = None)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect installed JDKs once
    #[command(visible_alias = "d")]
    Detect {
        /// Re-probe every candidate directory, bypassing the cache
        #[arg(short, long)]
        force: bool,

        /// Additional candidate directory (repeatable)
        #[arg(long = "path", value_name = "DIR")]
        paths: Vec<String>,

        /// Skip well-known OS locations, JAVA_HOME and PATH
        #[arg(long)]
        ignore_platform_paths: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Watch candidate directories and print results on every change
    #[command(visible_alias = "w")]
    Watch {
        /// Additional candidate directory (repeatable)
        #[arg(long = "path", value_name = "DIR")]
        paths: Vec<String>,

        /// Skip well-known OS locations, JAVA_HOME and PATH
        #[arg(long)]
        ignore_platform_paths: bool,
    },
}

fn run(cli: Cli) -> Result<()> {
    let config_dir = dirs::config_dir()
        .map(|dir| dir.join("jdkscan"))
        .unwrap_or_default();
    let config = ScanConfig::load(&config_dir)?;

    match cli.command {
        Commands::Detect {
            force,
            paths,
            ignore_platform_paths,
            json,
        } => DetectCommand::new(&config).execute(force, paths, ignore_platform_paths, json),
        Commands::Watch {
            paths,
            ignore_platform_paths,
        } => WatchCommand::new(&config).execute(paths, ignore_platform_paths),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::setup_logger(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
