// # ru-center-certbot-hook
//
// certbot `--manual-auth-hook` / `--manual-cleanup-hook` for zones hosted at
// RU-CENTER (nic.ru).
//
// This binary is a thin integration layer: it reads the environment, wires
// the registrar client and DNS lookups into `HookRunner`, and maps the result
// to an exit code. All DNS-01 logic lives in `dns01-core`.
//
// ## Invocation
//
// The action is chosen by the name the program is called under. Install it
// as two links:
//
// - `ru-center-certbot-auth-hook`: create the challenge record, commit, and
//   wait for the authoritative servers to serve it
// - `ru-center-certbot-cleanup-hook`: delete the challenge record and commit
//
// ## Configuration
//
// ### certbot
// - `CERTBOT_DOMAIN`: domain under validation
// - `CERTBOT_VALIDATION`: expected TXT value
//
// ### Registrar
// - `RUC_CONFIG_FILE`: JSON config file; when set, the `RUC_*` variables
//   below are ignored
// - `RUC_APPID`, `RUC_APPSECRET`: OAuth application credentials
// - `RUC_USER`, `RUC_PASS`: account login
// - `RUC_API_BASE`: API base URL (default `https://api.nic.ru`)
// - `RUC_HTTP_TIMEOUT_SECS`: HTTP timeout (default 30)
//
// ### Propagation wait
// - `RUC_PROPAGATION_WAIT`: `false` skips the wait (default `true`)
// - `RUC_PROPAGATION_ROUNDS`: polling rounds (default 20)
// - `RUC_PROPAGATION_INTERVAL_SECS`: pause between rounds (default 5)
//
// ### Logging
// - `RUC_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Exit codes
//
// - 0: success
// - 1: wrong program name, bad configuration, authentication failure
// - 2: zone listing failed or no zone holds the domain
// - 3: registrar rejected a record operation or commit

use anyhow::{Context, Result};
use dns01_core::{
    Challenge, ExitStatus, HookAction, HookConfig, HookOutcome, HookRunner,
};
use dns01_provider_rucenter::RuCenterClient;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Environment variable holding the log level
const LOG_LEVEL_ENV: &str = "RUC_LOG_LEVEL";

fn main() -> ExitCode {
    let program = env::args().next().unwrap_or_default();
    let action = match HookAction::from_program_name(&program) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("{}", e);
            return e.exit_status().into();
        }
    };

    // Initialize tracing
    let log_level = match parse_log_level(env::var(LOG_LEVEL_ENV).ok().as_deref()) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitStatus::Usage.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitStatus::Usage.into();
    }

    let lookup = |key: &str| env::var(key).ok();

    let challenge = match Challenge::from_lookup(lookup) {
        Ok(challenge) => challenge,
        Err(e) => {
            error!("{}", e);
            return e.exit_status().into();
        }
    };

    let config = match HookConfig::from_lookup(lookup) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return e.exit_status().into();
        }
    };

    let rt = match build_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("{:#}", e);
            return ExitStatus::Usage.into();
        }
    };

    let status = rt.block_on(async {
        match run_hook(action, &challenge, config).await {
            Ok(outcome) => {
                report(&outcome);
                ExitStatus::Success
            }
            Err(e) => {
                error!("{}", e);
                e.exit_status()
            }
        }
    });

    status.into()
}

/// Map `RUC_LOG_LEVEL` to a tracing level; unset means info
fn parse_log_level(value: Option<&str>) -> Result<Level> {
    match value.map(str::to_lowercase).as_deref() {
        None | Some("info") => Ok(Level::INFO),
        Some("trace") => Ok(Level::TRACE),
        Some("debug") => Ok(Level::DEBUG),
        Some("warn") => Ok(Level::WARN),
        Some("error") => Ok(Level::ERROR),
        Some(other) => anyhow::bail!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            LOG_LEVEL_ENV,
            other
        ),
    }
}

/// One hook run is a short sequence of awaited calls; a single thread is enough
fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
}

async fn run_hook(
    action: HookAction,
    challenge: &Challenge,
    config: HookConfig,
) -> dns01_core::Result<HookOutcome> {
    let client = RuCenterClient::authenticate(&config.registrar).await?;
    let runner = with_propagation(HookRunner::new(Box::new(client)), &config);

    runner.run(action, challenge).await
}

#[cfg(feature = "propagation")]
fn with_propagation(runner: HookRunner, config: &HookConfig) -> HookRunner {
    use dns01_resolver_hickory::HickoryLookup;

    if !config.propagation.enabled {
        info!("Propagation wait disabled");
        return runner;
    }

    match HickoryLookup::from_system() {
        Ok(lookup) => runner.with_propagation(Box::new(lookup), config.propagation.clone()),
        Err(e) => {
            tracing::warn!("{}; continuing without propagation wait", e);
            runner
        }
    }
}

#[cfg(not(feature = "propagation"))]
fn with_propagation(runner: HookRunner, config: &HookConfig) -> HookRunner {
    if config.propagation.enabled {
        tracing::warn!("Built without propagation support; not waiting for DNS");
    }
    runner
}

fn report(outcome: &HookOutcome) {
    match outcome {
        HookOutcome::Published {
            zone, record_id, ..
        } => info!("TXT record {} published in zone {}", record_id, zone),
        HookOutcome::CleanedUp { zone, deleted } => {
            info!("Removed {} TXT record(s) from zone {}", deleted.len(), zone)
        }
    }
}
