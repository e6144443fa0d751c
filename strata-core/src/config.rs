//! # Configuration
//!
//! Everything a run needs is fixed at construction: grid dimensions, history
//! depth, the alive threshold and edge handling. Nothing here can change while
//! a session is alive.

use serde::{Deserialize, Serialize};

use crate::cell::DEFAULT_THRESHOLD;
use crate::error::{StrataError, StrataResult};
use crate::grid::GridShape;
use crate::rule::{EdgeMode, RuleParams};

/// Master configuration for Strata
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StrataConfig {
    /// Grid and history settings
    pub grid: GridConfig,

    /// Brush settings
    pub brush: BrushConfig,

    /// Compute backend preference
    pub compute: ComputeConfig,
}

/// Grid and history settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridConfig {
    /// Cells per row
    pub width: u32,

    /// Rows per generation
    pub height: u32,

    /// Layers per ping-pong buffer; total history is `2 * depth - 1`
    pub history_depth: u32,

    /// Smallest byte value treated as alive
    pub alive_threshold: u8,

    /// How neighbours past the edge are read
    pub edge_mode: EdgeMode,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 60,
            history_depth: 50,
            alive_threshold: DEFAULT_THRESHOLD,
            edge_mode: EdgeMode::Clamp,
        }
    }
}

/// Brush settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrushConfig {
    /// Initial radius in cells
    pub radius: f32,

    /// Upper bound the front end lets the user dial in
    pub max_radius: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            radius: 1.5,
            max_radius: 20.0,
        }
    }
}

/// Compute backend configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComputeConfig {
    /// Preferred backend
    pub backend: BackendKind,

    /// Invocations per GPU workgroup
    pub workgroup_size: u32,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            workgroup_size: 64,
        }
    }
}

/// Available compute backends
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// GPU when an adapter exists, CPU otherwise
    Auto,
    /// Host memory with Rayon parallelism
    Cpu,
    /// Device memory with wgpu compute passes
    Gpu,
}

impl StrataConfig {
    /// Config for a given grid, other settings default
    pub fn with_grid(width: u32, height: u32, history_depth: u32) -> Self {
        let mut config = Self::default();
        config.grid.width = width;
        config.grid.height = height;
        config.grid.history_depth = history_depth;
        config
    }

    /// Load configuration from a JSON file
    pub fn load(path: &str) -> StrataResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &str) -> StrataResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create config from environment variables
    ///
    /// Reads:
    /// - STRATA_WIDTH, STRATA_HEIGHT: grid size (default: 100x60)
    /// - STRATA_DEPTH: layers per buffer (default: 50)
    /// - STRATA_THRESHOLD: alive threshold (default: 128)
    /// - STRATA_EDGES: "clamp" or "wrap" (default: clamp)
    /// - STRATA_BACKEND: "auto", "cpu" or "gpu" (default: auto)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse("STRATA_WIDTH") {
            config.grid.width = v;
        }
        if let Some(v) = env_parse("STRATA_HEIGHT") {
            config.grid.height = v;
        }
        if let Some(v) = env_parse("STRATA_DEPTH") {
            config.grid.history_depth = v;
        }
        if let Some(v) = env_parse("STRATA_THRESHOLD") {
            config.grid.alive_threshold = v;
        }

        let edges = std::env::var("STRATA_EDGES").map(|s| s.to_lowercase()).ok();
        match edges.as_deref() {
            Some("wrap") => config.grid.edge_mode = EdgeMode::Wrap,
            Some("clamp") => config.grid.edge_mode = EdgeMode::Clamp,
            _ => {}
        }

        let backend = std::env::var("STRATA_BACKEND").map(|s| s.to_lowercase()).ok();
        match backend.as_deref() {
            Some("cpu") => config.compute.backend = BackendKind::Cpu,
            Some("gpu") => config.compute.backend = BackendKind::Gpu,
            Some("auto") => config.compute.backend = BackendKind::Auto,
            _ => {}
        }

        config
    }

    /// Reject configurations no backend can run
    pub fn validate(&self) -> StrataResult<()> {
        self.shape()?;
        if self.grid.alive_threshold == 0 {
            return Err(StrataError::config("alive threshold must be at least 1"));
        }
        if self.compute.workgroup_size == 0 {
            return Err(StrataError::config("workgroup size must be at least 1"));
        }
        if !(self.brush.radius >= 0.0) || !(self.brush.max_radius >= self.brush.radius) {
            return Err(StrataError::config(format!(
                "brush radius {} must lie in [0, {}]",
                self.brush.radius, self.brush.max_radius
            )));
        }
        Ok(())
    }

    /// Grid shape described by this config
    pub fn shape(&self) -> StrataResult<GridShape> {
        GridShape::new(self.grid.width, self.grid.height, self.grid.history_depth)
    }

    /// Rule parameters described by this config
    pub fn rule(&self) -> RuleParams {
        RuleParams {
            threshold: self.grid.alive_threshold,
            edge_mode: self.grid.edge_mode,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = StrataConfig::default();
        config.validate().unwrap();
        assert_eq!(config.shape().unwrap().capacity(), 99);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = StrataConfig::with_grid(5, 5, 0);
        assert!(config.validate().is_err());

        config = StrataConfig::with_grid(5, 5, 3);
        config.grid.alive_threshold = 0;
        assert!(config.validate().is_err());

        config = StrataConfig::with_grid(5, 5, 3);
        config.brush.radius = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = StrataConfig::with_grid(8, 4, 2);
        config.grid.edge_mode = EdgeMode::Wrap;
        config.compute.backend = BackendKind::Cpu;

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"wrap\""));
        let back: StrataConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.grid.width, 8);
        assert_eq!(back.grid.edge_mode, EdgeMode::Wrap);
        assert_eq!(back.compute.backend, BackendKind::Cpu);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("strata-config-{}.json", std::process::id()));
        let path = path.to_string_lossy().to_string();
        let config = StrataConfig::with_grid(12, 7, 4);
        config.save(&path).unwrap();
        let loaded = StrataConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.grid.height, 7);
        assert_eq!(loaded.grid.history_depth, 4);
    }
}
