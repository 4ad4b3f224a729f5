use std::path::PathBuf;
use std::process::ExitCode;

use interaction::SandboxConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV_VAR: &str = "INTERACTION_SANDBOX_CONFIG";

pub(crate) struct AppWiring {
    pub(crate) config: SandboxConfig,
}

pub(crate) fn build_app() -> Result<AppWiring, ExitCode> {
    init_tracing();
    info!("=== Interaction Sandbox Startup ===");

    let config = match config_path_from_env() {
        Some(path) => {
            info!(path = %path.display(), "loading_sandbox_config");
            SandboxConfig::load(&path).map_err(|err| {
                error!(error = %err, "config_load_failed");
                ExitCode::FAILURE
            })?
        }
        None => SandboxConfig::default(),
    };
    info!(
        fixed_dt = config.network.fixed_dt_seconds,
        delay_ticks = config.network.delivery_delay_ticks,
        reach = config.interactor.reach_distance,
        "sandbox_config_ready"
    );

    Ok(AppWiring { config })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV_VAR)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}
