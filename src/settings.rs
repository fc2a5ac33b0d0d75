use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::authz::engine::DEFAULT_MAX_DEPTH;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub permissions: Permissions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permissions {
    /// KDL schema file, or a directory whose `*.kdl` files are merged
    pub schema_path: PathBuf,
    /// Maximum number of groups one resolution may climb through
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            schema_path: PathBuf::from("config/permissions.kdl"),
            max_depth: default_max_depth(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`Settings::load`], but reads the `PERMTREE__` overrides from
    /// `env` instead of the process environment when one is given.
    pub fn load_with_env(path: &str, env: Option<config::Map<String, String>>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default(
                "permissions.schema_path",
                Permissions::default()
                    .schema_path
                    .to_string_lossy()
                    .to_string(),
            )
            .into_diagnostic()?
            .set_default("permissions.max_depth", default_max_depth() as i64)
            .into_diagnostic()?;

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: PERMTREE__PERMISSIONS__MAX_DEPTH=8, etc.
        builder = builder.add_source(
            config::Environment::with_prefix("PERMTREE")
                .separator("__")
                .source(env),
        );

        let cfg = builder.build().into_diagnostic()?;
        let mut s: Settings = cfg.try_deserialize().into_diagnostic()?;

        // Normalize schema path to be relative to current dir
        if s.permissions.schema_path.is_relative() {
            s.permissions.schema_path = std::env::current_dir()
                .into_diagnostic()?
                .join(&s.permissions.schema_path);
        }

        if s.permissions.max_depth == 0 {
            return Err(miette::miette!(
                code = "permtree::settings::max_depth",
                help = "a depth of 0 would reject every group lookup",
                "permissions.max_depth must be at least 1"
            ));
        }

        Ok(s)
    }
}
