//! Run lunash commands on one or more appliances.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example lunash -- --names hsm1,10.0.0.7 --command "hsm show; partition list"
//! cargo run --example lunash -- --all --login --command "partition show"
//! ```
//!
//! Set `RUST_LOG=debug` together with `--debug` to see every protocol step.

use std::env;
use std::process;

use lunash::{Client, config, steplog};

#[tokio::main]
async fn main() {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let appliances = if args.all {
        config::load_all(&args.config)
    } else {
        config::load_selected(&args.config, &args.names)
    };
    let appliances = match appliances {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error='{}'", e);
            process::exit(1);
        }
    };

    for appliance in &appliances {
        let host = &appliance.hostname;
        let log = steplog::from_flag(args.debug);

        let client = match Client::connect_with_log(appliance, log).await {
            Ok(c) => c,
            Err(e) => fail(host, &e),
        };

        let outcome = client.run(&args.commands, args.login).await;
        for (command, record) in args.commands.iter().zip(&outcome.records) {
            println!("host={} cmd={:?}\n{}", host, command, record.output);
        }

        if let Some(e) = &outcome.error {
            fail(host, e);
        }

        if let Err(e) = client.close().await {
            fail(host, &e);
        }
    }
}

fn fail(host: &str, err: &lunash::Error) -> ! {
    eprintln!("host={} error='{}'", host, err);
    process::exit(1);
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    commands: Vec<String>,
    names: Vec<String>,
    all: bool,
    login: bool,
    config: String,
    debug: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut commands = Vec::new();
        let mut names = Vec::new();
        let mut all = false;
        let mut login = false;
        let mut config = config::DEFAULT_PATH.to_string();
        let mut debug = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--command" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        commands = args[i]
                            .split(';')
                            .map(|c| c.trim().to_string())
                            .filter(|c| !c.is_empty())
                            .collect();
                    }
                }
                "--names" | "-n" => {
                    i += 1;
                    if i < args.len() {
                        names = args[i].split(',').map(str::to_string).collect();
                    }
                }
                "--all" => all = true,
                "--login" => login = true,
                "--config" => {
                    i += 1;
                    if i < args.len() {
                        config = args[i].clone();
                    }
                }
                "--debug" => debug = true,
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

        if commands.is_empty() || (!all && names.is_empty()) || config.is_empty() {
            Self::print_help();
            process::exit(1);
        }

        Self {
            commands,
            names,
            all,
            login,
            config,
            debug,
        }
    }

    fn print_help() {
        println!(
            r#"lunash: run commands on Luna HSM appliances

USAGE:
    cargo run --example lunash -- [OPTIONS]

OPTIONS:
    -c, --command <CMDS>     Semicolon delimited list of commands to run
    -n, --names <NAMES>      Comma separated list of appliances (hostname or nickname)
    --all                    Send commands to every appliance in the config file
    --login                  Run 'hsm login' before the commands
    --config <PATH>          Path to the config file [default: ./lunash.json]
    --debug                  Log every protocol step (with RUST_LOG=debug)
    -h, --help               Print this help message
"#
        );
    }
}
