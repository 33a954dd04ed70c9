use engine::{resolve_app_paths, LoopConfig, Scene, SoundBank, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{ConfigError, CourtyardConfig};
use super::gameplay;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Holiday Courtyard Startup ===");

    let paths = resolve_app_paths()?;
    let config = CourtyardConfig::load(&paths.root)?;
    let seed = config.seed.unwrap_or_else(rand::random);
    let settings = config.to_settings(seed);
    let sounds = SoundBank::load(&paths.assets_dir, &config.sound);
    info!(
        root = %paths.root.display(),
        seed,
        snow_flakes = settings.snow_flakes,
        "app_configured"
    );

    Ok(AppWiring {
        config: config.loop_config(),
        scene: gameplay::build_scene(settings, sounds),
    })
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
