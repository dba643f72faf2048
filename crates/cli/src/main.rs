// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

mod commands;

fn build_cli() -> Command {
    Command::new("adrelay")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resilient campaign operations across Meta, TikTok and Google Ads")
        .arg(
            Arg::new("config-dir")
                .short('c')
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml (defaults to the user config directory)")
                .global(true),
        )
        .subcommand(
            Command::new("run")
                .about("Perform one operation against the sandbox platforms")
                .arg(
                    Arg::new("platform")
                        .short('p')
                        .long("platform")
                        .required(true)
                        .value_name("PLATFORM")
                        .help("meta, tiktok or google"),
                )
                .arg(
                    Arg::new("operation")
                        .short('o')
                        .long("operation")
                        .required(true)
                        .value_name("OPERATION")
                        .help("e.g. create_campaign, pause_adset, get_status"),
                )
                .arg(
                    Arg::new("params")
                        .long("params")
                        .value_name("JSON")
                        .default_value("{}")
                        .help("Operation parameters as a JSON object"),
                )
                .arg(
                    Arg::new("inject")
                        .long("inject")
                        .value_name("STATUS")
                        .value_parser(clap::value_parser!(u16))
                        .action(ArgAction::Append)
                        .help("Fail the next platform call with this HTTP status (repeatable)"),
                ),
        )
        .subcommand(
            Command::new("status")
                .about("Read a campaign's delivery status")
                .arg(
                    Arg::new("platform")
                        .short('p')
                        .long("platform")
                        .required(true)
                        .value_name("PLATFORM"),
                )
                .arg(
                    Arg::new("campaign")
                        .long("campaign")
                        .required(true)
                        .value_name("CAMPAIGN_ID"),
                ),
        )
        .subcommand(
            Command::new("classify")
                .about("Show the error response reported for an error type")
                .arg(
                    Arg::new("kind")
                        .required(true)
                        .value_name("TYPE")
                        .help("e.g. RATE_LIMIT, TOKEN_EXPIRED"),
                )
                .arg(
                    Arg::new("platform")
                        .short('p')
                        .long("platform")
                        .value_name("PLATFORM")
                        .default_value("meta"),
                )
                .arg(
                    Arg::new("context")
                        .long("context")
                        .value_name("CONTEXT")
                        .default_value("cli"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Manage the configuration file")
                .subcommand_required(true)
                .subcommand(
                    Command::new("init").about("Write a default config file if none exists"),
                )
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print the config file location")),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = build_cli().get_matches();
    let config_dir = matches.get_one::<String>("config-dir").map(|s| s.as_str());

    match matches.subcommand() {
        Some(("run", sub_matches)) => {
            let config = commands::load_config(config_dir)?;
            commands::run_operation(&config, sub_matches).await
        }
        Some(("status", sub_matches)) => {
            let config = commands::load_config(config_dir)?;
            commands::show_status(&config, sub_matches).await
        }
        Some(("classify", sub_matches)) => commands::classify(sub_matches),
        Some(("config", sub_matches)) => {
            let manager = commands::config_manager(config_dir).context("Failed to locate config")?;
            match sub_matches.subcommand() {
                Some(("init", _)) => commands::config_init(&manager),
                Some(("show", _)) => commands::config_show(&manager),
                Some(("path", _)) => {
                    println!("{}", manager.config_path().display());
                    Ok(())
                }
                other => anyhow::bail!("Unknown config command: {:?}", other.map(|(name, _)| name)),
            }
        }
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
