// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Router and canvas configuration.
//!
//! Every field has a default, so a config file only needs the keys it changes:
//!
//! ```json
//! { "cell_size": 16, "costs": { "turn_penalty": 8 }, "no_path_fallback": "keep_previous" }
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::layout::NodeStyle;
use crate::route::grid::DEFAULT_CELL_SIZE;
use crate::route::planner::{CostModel, DEFAULT_RECONSTRUCT_LIMIT};
use crate::route::shape::{NoPathFallback, RouteMode};

pub const DEFAULT_MAX_REBUILD_PASSES: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodConfig {
    pub cell_size: f64,
    pub route_mode: RouteMode,
    pub no_path_fallback: NoPathFallback,
    pub costs: CostModel,
    /// Minimum cap on reconstructed path length; raised to the grid's cell count.
    pub reconstruct_limit: usize,
    /// Grid rebuilds allowed per update when the canvas bounds keep changing.
    pub max_rebuild_passes: usize,
    pub node_style: NodeStyle,
}

impl Default for NodConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            route_mode: RouteMode::default(),
            no_path_fallback: NoPathFallback::default(),
            costs: CostModel::default(),
            reconstruct_limit: DEFAULT_RECONSTRUCT_LIMIT,
            max_rebuild_passes: DEFAULT_MAX_REBUILD_PASSES,
            node_style: NodeStyle::default(),
        }
    }
}

impl NodConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::Invalid {
                field: "cell_size",
                reason: format!("must be a positive number, got {}", self.cell_size),
            });
        }
        if self.max_rebuild_passes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_rebuild_passes",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.costs.step_cost == 0 {
            return Err(ConfigError::Invalid {
                field: "costs.step_cost",
                reason: "must be at least 1".to_owned(),
            });
        }
        let style = &self.node_style;
        for (field, value) in [
            ("node_style.header_height", style.header_height),
            ("node_style.port_radius", style.port_radius),
            ("node_style.min_width", style.min_width),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a non-negative number, got {value}"),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Json { path: PathBuf, source: serde_json::Error },
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read config {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "cannot parse config {path:?}: {source}"),
            Self::Invalid { field, reason } => write!(f, "invalid config value {field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Invalid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::rstest;

    use super::{ConfigError, NodConfig};
    use crate::route::shape::{NoPathFallback, RouteMode};

    #[test]
    fn partial_file_keeps_defaults() {
        let config: NodConfig = serde_json::from_str(
            r#"{ "cell_size": 16, "costs": { "turn_penalty": 8 }, "no_path_fallback": "keep_previous" }"#,
        )
        .unwrap();
        assert_eq!(config.cell_size, 16.0);
        assert_eq!(config.costs.turn_penalty, 8);
        assert_eq!(config.costs.connection_cost, 2);
        assert_eq!(config.no_path_fallback, NoPathFallback::KeepPrevious);
        assert_eq!(config.route_mode, RouteMode::Planned);
        assert_eq!(config.max_rebuild_passes, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_json::from_str::<NodConfig>(r#"{ "cellsize": 16 }"#).is_err());
    }

    #[rstest]
    #[case(r#"{ "cell_size": 0 }"#, "cell_size")]
    #[case(r#"{ "cell_size": -4 }"#, "cell_size")]
    #[case(r#"{ "max_rebuild_passes": 0 }"#, "max_rebuild_passes")]
    #[case(r#"{ "costs": { "step_cost": 0 } }"#, "costs.step_cost")]
    #[case(r#"{ "node_style": { "port_radius": -1 } }"#, "node_style.port_radius")]
    fn validate_rejects(#[case] raw: &str, #[case] expected_field: &str) {
        let config: NodConfig = serde_json::from_str(raw).unwrap();
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected invalid {expected_field}, got {other:?}"),
        }
    }

    #[test]
    fn load_reports_path_on_errors() {
        let dir = std::env::temp_dir().join(format!("nod-config-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("missing.json");
        assert!(matches!(NodConfig::load(&missing), Err(ConfigError::Io { .. })));

        let broken = dir.join("broken.json");
        fs::write(&broken, "{ nope").unwrap();
        let err = NodConfig::load(&broken).unwrap_err();
        assert!(err.to_string().contains("broken.json"), "{err}");

        let good = dir.join("good.json");
        fs::write(&good, r#"{ "route_mode": "direct" }"#).unwrap();
        assert_eq!(NodConfig::load(&good).unwrap().route_mode, RouteMode::Direct);

        let _ = fs::remove_dir_all(&dir);
    }
}
