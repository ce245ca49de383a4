//! Engine configuration.
//!
//! Loaded from TOML, then overridden from `PLAN_STREAM_*` environment
//! variables, then validated. The resulting [`EngineConfig`] is carried
//! read-only in the materialization context.
//!
//! ```toml
//! emit_mode = "changelog"        # or "final"
//! extremum_strategy = "ordered"  # or "rescan"
//! group_capacity_hint = 1024
//! log_filter = "plan_stream=debug"
//! ```

use crate::error::PlanStreamError;
use serde::Deserialize;
use std::path::Path;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "PLAN_STREAM_";

/// Upper bound on the preallocated group table size.
const MAX_GROUP_CAPACITY_HINT: usize = 1 << 24;

/// When the grouping operator emits records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmitMode {
    /// One output record per input record (insert/retract changelog).
    #[default]
    Changelog,
    /// Nothing while the source is open; one record per live group once
    /// the source is exhausted. Only legal over bounded inputs.
    Final,
}

/// How Min/Max recover after the current extremum is retracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtremumStrategy {
    /// Ordered multiset of live values; O(log n) per update.
    #[default]
    Ordered,
    /// Unordered list of live values; full rescan when the extremum leaves.
    Rescan,
}

impl EmitMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "changelog" => Some(EmitMode::Changelog),
            "final" => Some(EmitMode::Final),
            _ => None,
        }
    }

    /// Final mode emits only at end of stream, which never comes for an
    /// unbounded input.
    pub fn requires_bounded_input(self) -> bool {
        self == EmitMode::Final
    }
}

impl ExtremumStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ordered" => Some(ExtremumStrategy::Ordered),
            "rescan" => Some(ExtremumStrategy::Rescan),
            _ => None,
        }
    }
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub emit_mode: EmitMode,
    pub extremum_strategy: ExtremumStrategy,
    /// Initial capacity of each grouping operator's group table.
    pub group_capacity_hint: usize,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            emit_mode: EmitMode::Changelog,
            extremum_strategy: ExtremumStrategy::Ordered,
            group_capacity_hint: 64,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, PlanStreamError> {
        let config: EngineConfig =
            toml::from_str(s).map_err(|e| PlanStreamError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, PlanStreamError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PlanStreamError::InvalidConfig(format!("couldn't read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text).map_err(|e| e.context(path.display()))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(self) -> Result<Self, PlanStreamError> {
        self.apply_overrides(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Apply overrides from an arbitrary lookup (keys without the prefix).
    pub fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, PlanStreamError> {
        if let Some(v) = lookup("EMIT_MODE") {
            self.emit_mode = EmitMode::parse(&v).ok_or_else(|| {
                PlanStreamError::InvalidConfig(format!("{ENV_PREFIX}EMIT_MODE: unknown mode {v:?}"))
            })?;
        }
        if let Some(v) = lookup("EXTREMUM_STRATEGY") {
            self.extremum_strategy = ExtremumStrategy::parse(&v).ok_or_else(|| {
                PlanStreamError::InvalidConfig(format!(
                    "{ENV_PREFIX}EXTREMUM_STRATEGY: unknown strategy {v:?}"
                ))
            })?;
        }
        if let Some(v) = lookup("GROUP_CAPACITY_HINT") {
            self.group_capacity_hint = v.parse().map_err(|_| {
                PlanStreamError::InvalidConfig(format!(
                    "{ENV_PREFIX}GROUP_CAPACITY_HINT: not an unsigned integer: {v:?}"
                ))
            })?;
        }
        if let Some(v) = lookup("LOG_FILTER") {
            self.log_filter = v;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), PlanStreamError> {
        if self.group_capacity_hint > MAX_GROUP_CAPACITY_HINT {
            return Err(PlanStreamError::InvalidConfig(format!(
                "group_capacity_hint {} exceeds maximum {MAX_GROUP_CAPACITY_HINT}",
                self.group_capacity_hint
            )));
        }
        if self.log_filter.trim().is_empty() {
            return Err(PlanStreamError::InvalidConfig(
                "log_filter must not be empty".into(),
            ));
        }
        Ok(())
    }
}
