use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod audio;

pub use app::{
    mix, project_point, run_app, run_app_with_metrics, shade, AppError, Camera3D, Color,
    EdgeStates, HudSlot, HudState, InputAction, InputEdge, InputSnapshot, LoopConfig,
    LoopMetricsSnapshot, MetricsHandle, Primitive, Projected, Projection, Renderer, Scene,
    SceneCommand, SceneHost, SceneWorld, Viewport, NEAR_PLANE, SLOW_FRAME_ENV_VAR,
};
pub use audio::{MusicMode, SoundBank, SoundConfig, SoundEntry, SoundId};
pub use glam::{Vec2, Vec3};

pub const ROOT_ENV_VAR: &str = "COURTYARD_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot read {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("cannot locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("executable path {0} has no parent directory")]
    ExeHasNoParent(PathBuf),
    #[error("{env_var}={path} is not a courtyard root (needs Cargo.toml plus crates/ or assets/)")]
    InvalidEnvRoot {
        path: PathBuf,
        env_var: &'static str,
    },
    #[error(
        "no courtyard root above {start_dir} (looked for Cargo.toml plus crates/ or assets/); \
set {env_var} to the checkout directory"
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Finds the courtyard root from `COURTYARD_ROOT`, or by walking up from the executable.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = match env::var(ROOT_ENV_VAR) {
        Ok(value) => root_from_env(PathBuf::from(value))?,
        Err(env::VarError::NotPresent) => root_from_exe()?,
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: ROOT_ENV_VAR,
                source,
            })
        }
    };
    Ok(app_paths_for_root(root))
}

pub fn app_paths_for_root(root: PathBuf) -> AppPaths {
    AppPaths {
        assets_dir: root.join("assets"),
        root,
    }
}

fn root_from_env(path: PathBuf) -> Result<PathBuf, StartupError> {
    let path = canonical_or_raw(&path);
    if looks_like_root(&path) {
        Ok(path)
    } else {
        Err(StartupError::InvalidEnvRoot {
            path,
            env_var: ROOT_ENV_VAR,
        })
    }
}

fn root_from_exe() -> Result<PathBuf, StartupError> {
    let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
    let Some(exe_dir) = exe.parent() else {
        return Err(StartupError::ExeHasNoParent(exe));
    };
    nearest_root(exe_dir).ok_or_else(|| StartupError::RootNotFound {
        start_dir: canonical_or_raw(exe_dir),
        env_var: ROOT_ENV_VAR,
    })
}

fn nearest_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| looks_like_root(dir))
        .map(canonical_or_raw)
}

fn looks_like_root(dir: &Path) -> bool {
    dir.join("Cargo.toml").is_file() && (dir.join("crates").is_dir() || dir.join("assets").is_dir())
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_needs_a_manifest_and_a_content_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("assets")).expect("assets dir");
        assert!(!looks_like_root(dir.path()));

        fs::write(dir.path().join("Cargo.toml"), "[workspace]\n").expect("manifest");
        assert!(looks_like_root(dir.path()));
    }

    #[test]
    fn nearest_root_walks_up_from_build_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("Cargo.toml"), "[workspace]\n").expect("manifest");
        let nested = dir.path().join("crates").join("game").join("target");
        fs::create_dir_all(&nested).expect("nested dirs");

        assert_eq!(nearest_root(&nested), Some(canonical_or_raw(dir.path())));
    }

    #[test]
    fn nearest_root_ignores_unmarked_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).expect("nested dirs");

        let found = nearest_root(&nested);
        assert!(found.map_or(true, |root| !root.starts_with(dir.path())));
    }

    #[test]
    fn env_root_must_look_like_a_checkout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = root_from_env(dir.path().to_path_buf()).expect_err("bare dir rejected");
        assert!(matches!(err, StartupError::InvalidEnvRoot { .. }));

        fs::write(dir.path().join("Cargo.toml"), "[workspace]\n").expect("manifest");
        fs::create_dir(dir.path().join("assets")).expect("assets dir");
        let root = root_from_env(dir.path().to_path_buf()).expect("valid root");
        assert_eq!(app_paths_for_root(root).assets_dir, canonical_or_raw(dir.path()).join("assets"));
    }
}
