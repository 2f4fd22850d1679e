use serde::{Deserialize, Serialize};

use crate::render::RenderOptions;

/// Generation settings, loadable from a JSON config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// RNG seed, re-applied at the start of every template's pass so that
    /// batch order never affects a single file's output.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Decimal digits kept for floating-point and complex elements.
    #[serde(default = "default_precision")]
    pub precision: usize,

    /// Render arrays with the fixed-rank `xtensor<T, N>` spelling instead
    /// of the dynamic-rank `xarray<T>` spelling.
    #[serde(default)]
    pub fixed_rank: bool,

    /// Glob pattern for template discovery, relative to the input
    /// directory.
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            precision: default_precision(),
            fixed_rank: false,
            pattern: default_pattern(),
        }
    }
}

impl GeneratorConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            precision: self.precision,
            fixed_rank: self.fixed_rank,
        }
    }
}

fn default_seed() -> u64 {
    42
}

fn default_precision() -> usize {
    16
}

fn default_pattern() -> String {
    "*.cppy".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.precision, 16);
        assert!(!config.fixed_rank);
        assert_eq!(config.pattern, "*.cppy");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: GeneratorConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.precision, 16);
    }
}
