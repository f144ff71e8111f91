//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on the number of stages in one chain. `None` = unbounded.
    pub max_stages: Option<usize>,

    /// Fuse contiguous lazy stages into single passes. When off, every stage
    /// is applied eagerly in order (sequential mode).
    pub fusion: bool,

    /// Emit a trace event for every evaluator call. Noisy; debugging only.
    pub trace_items: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_stages: None,
            fusion: true,
            trace_items: false,
        }
    }
}

impl EngineConfig {
    /// Sequential (unfused) configuration, mostly useful as a reference
    /// when checking fused output.
    pub fn sequential() -> Self {
        Self {
            fusion: false,
            ..Self::default()
        }
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SEQFUSE_MAX_STAGES`: maximum chain length (`0` = unbounded)
    /// - `SEQFUSE_FUSION`: `0`/`false`/`off` disables fusion
    /// - `SEQFUSE_TRACE_ITEMS`: `1`/`true`/`on` enables per-item tracing
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with a custom variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(s) = lookup("SEQFUSE_MAX_STAGES") {
            if let Ok(v) = s.trim().parse::<usize>() {
                cfg.max_stages = if v == 0 { None } else { Some(v) };
            }
        }

        if let Some(s) = lookup("SEQFUSE_FUSION") {
            if let Some(v) = parse_flag(&s) {
                cfg.fusion = v;
            }
        }

        if let Some(s) = lookup("SEQFUSE_TRACE_ITEMS") {
            if let Some(v) = parse_flag(&s) {
                cfg.trace_items = v;
            }
        }

        cfg
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
