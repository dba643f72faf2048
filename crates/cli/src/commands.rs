// FILE: crates/cli/src/commands.rs

use adrelay_cache::{CacheManager, MemoryStore};
use adrelay_config::{Config, ConfigManager};
use adrelay_core::{
    ErrorHandler, ErrorKind, ErrorResponse, MemoryCampaignStore, Operation, OperationRequest,
    Parameters, Platform, RelayError,
};
use adrelay_platforms::{
    CampaignGateway, OperationOutcome, PlatformAccounts, PlatformFailure, PlatformRouter,
    SandboxTransport,
};
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use console::style;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Opens the config directory given on the command line, or the user default
pub fn config_manager(config_dir: Option<&str>) -> Result<ConfigManager> {
    let manager = match config_dir {
        Some(dir) => ConfigManager::with_directory(dir.into())?,
        None => ConfigManager::new()?,
    };
    Ok(manager)
}

/// Loads the effective configuration and refuses to run on invalid values
pub fn load_config(config_dir: Option<&str>) -> Result<Config> {
    let manager = config_manager(config_dir)?;
    let config = manager
        .load_with_env_overrides()
        .with_context(|| format!("Failed to load {}", manager.config_path().display()))?;

    if let Err(errors) = config.validate() {
        let details = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n  ");
        bail!("Invalid configuration:\n  {}", details);
    }
    Ok(config)
}

/// Wires router, cache and campaign store over the given transport
pub fn build_gateway(config: &Config, transport: Arc<SandboxTransport>) -> CampaignGateway {
    let accounts = PlatformAccounts {
        tiktok_advertiser_id: config.accounts.tiktok_advertiser_id.clone(),
        google_customer_id: config.accounts.google_customer_id.clone(),
    };
    let router = PlatformRouter::builder()
        .with_standard_adapters(transport, &accounts)
        .with_retry_policy(config.retry.to_policy())
        .with_timeouts(config.timeouts.to_timeout_config())
        .build();
    let cache = CacheManager::new(Arc::new(MemoryStore::new()))
        .with_default_ttl(config.cache.default_ttl());

    CampaignGateway::new(Arc::new(router), Arc::new(cache))
        .with_store(Arc::new(MemoryCampaignStore::new()))
        .with_status_ttl(config.cache.status_ttl())
}

/// Parses `--params`, which must be a JSON object
pub fn parse_params(raw: &str) -> Result<Parameters> {
    let map: Map<String, Value> =
        serde_json::from_str(raw).context("--params must be a JSON object")?;
    Ok(Parameters::from(map))
}

/// `adrelay run`
pub async fn run_operation(config: &Config, matches: &ArgMatches) -> Result<()> {
    let platform = required(matches, "platform")?;
    let operation: Operation = required(matches, "operation")?.parse()?;
    let params = parse_params(required(matches, "params")?)?;

    let sandbox = Arc::new(SandboxTransport::new());
    if let Some(statuses) = matches.get_many::<u16>("inject") {
        for status in statuses {
            sandbox.fail_next(injected_failure(*status));
        }
    }

    let gateway = build_gateway(config, sandbox.clone());
    let request = OperationRequest::new(platform, operation, params);
    let result = gateway.execute(&request).await;
    log::info!("{} made {} platform call(s)", request.context(), sandbox.calls());
    print_result(result)
}

/// `adrelay status`
pub async fn show_status(config: &Config, matches: &ArgMatches) -> Result<()> {
    let request = OperationRequest::new(
        required(matches, "platform")?,
        Operation::GetStatus,
        Parameters::new().with("campaign_id", required(matches, "campaign")?),
    );
    let gateway = build_gateway(config, Arc::new(SandboxTransport::new()));
    print_result(gateway.execute(&request).await)
}

/// `adrelay classify`
pub fn classify(matches: &ArgMatches) -> Result<()> {
    let kind: ErrorKind = required(matches, "kind")?
        .parse()
        .map_err(anyhow::Error::msg)?;
    let platform: Platform = required(matches, "platform")?.parse()?;
    let context = required(matches, "context")?;

    let response = describe_kind(kind, platform, context);
    println!("{}", serde_json::to_string_pretty(&response.to_json())?);
    Ok(())
}

/// Error response the runtime reports for a representative failure of `kind`
pub fn describe_kind(kind: ErrorKind, platform: Platform, context: &str) -> ErrorResponse {
    let error = representative_error(kind, platform);
    ErrorHandler::respond(&error, context, Some(platform.as_str()))
}

/// A failure that classifies as `kind`
pub fn representative_error(kind: ErrorKind, platform: Platform) -> RelayError {
    match kind {
        ErrorKind::InvalidRequest => RelayError::missing_field("create_campaign", "name"),
        ErrorKind::InvalidPlatform => RelayError::UnknownPlatform("snapchat".to_string()),
        ErrorKind::RateLimit => RelayError::RateLimited {
            platform,
            retry_after: Some(Duration::from_secs(60)),
        },
        ErrorKind::PlatformServiceError => RelayError::PlatformService {
            platform,
            status: Some(503),
            message: "Service Unavailable".to_string(),
        },
        ErrorKind::PlatformTimeout => RelayError::PlatformTimeout {
            platform,
            after: Duration::from_secs(30),
        },
        ErrorKind::DependencyError => {
            RelayError::MissingDependency(format!("{} access token", platform.display_name()))
        }
        ErrorKind::McpConnectionError => {
            RelayError::PersistenceConnection("connection refused".to_string())
        }
        ErrorKind::McpTimeout => RelayError::PersistenceTimeout(Duration::from_secs(30)),
        ErrorKind::AiModelFailed => RelayError::Model("empty completion".to_string()),
        ErrorKind::TokenExpired => RelayError::TokenExpired { platform },
        ErrorKind::TokenInvalid => RelayError::TokenInvalid {
            platform,
            message: "token revoked".to_string(),
        },
        ErrorKind::PermissionDenied => RelayError::PermissionDenied {
            platform,
            message: "missing ads_management permission".to_string(),
        },
        ErrorKind::BudgetInsufficient => RelayError::InsufficientBudget {
            platform,
            message: "account spending limit reached".to_string(),
        },
        ErrorKind::CreativeRejected => RelayError::CreativeRejected {
            platform,
            reason: "text exceeds policy limits".to_string(),
        },
        ErrorKind::UnknownError => RelayError::Unexpected {
            message: "unrecognized failure".to_string(),
            source: None,
        },
    }
}

/// `adrelay config init`
pub fn config_init(manager: &ConfigManager) -> Result<()> {
    let path = manager.config_path();
    if manager.initialize()? {
        eprintln!("{} Wrote default config to {}", style("✓").green().bold(), path.display());
    } else {
        eprintln!("Config already exists at {}", path.display());
    }
    Ok(())
}

/// `adrelay config show`
pub fn config_show(manager: &ConfigManager) -> Result<()> {
    let config = manager.load_with_env_overrides()?;
    for problem in manager.validate().unwrap_or_default() {
        eprintln!("{} {}", style("warning:").yellow().bold(), problem);
    }
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn injected_failure(status: u16) -> PlatformFailure {
    let message = match status {
        401 => "Invalid OAuth access token",
        403 => "Permission denied",
        429 => "Too many requests",
        500..=599 => "Service Unavailable",
        _ => "Injected failure",
    };
    PlatformFailure::http(status, message)
}

fn print_result(result: std::result::Result<OperationOutcome, ErrorResponse>) -> Result<()> {
    match result {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(response) => {
            println!("{}", serde_json::to_string_pretty(&response.to_json())?);
            bail!(
                "{} failed with {} ({})",
                response.error.context,
                response.error.kind,
                response.error.code
            )
        }
    }
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow::anyhow!("--{} is required", id))
}
