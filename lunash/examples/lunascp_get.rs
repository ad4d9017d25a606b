//! Download a file from an appliance to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example lunascp_get -- --name hsm1 --path server.pem > server.pem
//! ```

use std::env;
use std::io::Write;
use std::process;

use lunash::{Client, config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let appliance = config::load_one(&args.config, &args.name)?;
    let client = Client::connect(&appliance).await?;

    let file = client.scp_get(&args.path).await?;
    client.close().await?;

    std::io::stdout().write_all(&file)?;
    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    path: String,
    name: String,
    config: String,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut path = String::new();
        let mut name = String::new();
        let mut config = config::DEFAULT_PATH.to_string();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--path" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        path = args[i].clone();
                    }
                }
                "--name" | "-n" => {
                    i += 1;
                    if i < args.len() {
                        name = args[i].clone();
                    }
                }
                "--config" => {
                    i += 1;
                    if i < args.len() {
                        config = args[i].clone();
                    }
                }
                "--help" | "-h" => {
                    Self::print_help();
                    process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        if path.is_empty() || name.is_empty() || config.is_empty() {
            Self::print_help();
            process::exit(1);
        }

        Self { path, name, config }
    }

    fn print_help() {
        eprintln!(
            r#"lunascp_get: copy a file from a Luna HSM appliance to stdout

USAGE:
    cargo run --example lunascp_get -- [OPTIONS]

OPTIONS:
    -p, --path <PATH>        Path of the file to get from the appliance
    -n, --name <NAME>        Appliance to get the file from (hostname or nickname)
    --config <PATH>          Path to the config file [default: ./lunash.json]
    -h, --help               Print this help message
"#
        );
    }
}
