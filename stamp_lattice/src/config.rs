//! Lattice configuration.
//!
//! Settings can come from a TOML document (e.g. a `[stamps]` table extracted
//! by the embedding compiler) or from environment variables.

use crate::diagnostics::DiagnosticsCollector;
use crate::error::{Result, StampError};
use serde::Deserialize;
use std::env;

/// Default bound on per-amount iteration in shift transfer functions.
pub const DEFAULT_MAX_SHIFT_ITERATIONS: u32 = 64;

/// Tunables shared by the factory and the transfer functions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LatticeConfig {
    /// Width of machine words (32 or 64).
    pub word_bits: u32,
    /// Shift amounts ranging over more values than this are not enumerated.
    pub max_shift_iterations: u32,
    /// Collect precision diagnostics on the current thread.
    pub diagnostics: bool,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            word_bits: 64,
            max_shift_iterations: DEFAULT_MAX_SHIFT_ITERATIONS,
            diagnostics: false,
        }
    }
}

impl LatticeConfig {
    /// Reads `STAMP_LATTICE_WORD_BITS`, `STAMP_LATTICE_MAX_SHIFT_ITERATIONS`
    /// and `STAMP_LATTICE_DIAGNOSTICS`. Unset or unparsable values keep
    /// their defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(bits) = get("STAMP_LATTICE_WORD_BITS").and_then(|v| v.trim().parse().ok()) {
            config.word_bits = bits;
        }
        if let Some(n) =
            get("STAMP_LATTICE_MAX_SHIFT_ITERATIONS").and_then(|v| v.trim().parse().ok())
        {
            config.max_shift_iterations = n;
        }
        if let Some(flag) = get("STAMP_LATTICE_DIAGNOSTICS") {
            config.diagnostics = matches!(flag.trim(), "1" | "true" | "yes" | "on");
        }
        config
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: LatticeConfig =
            toml::from_str(source).map_err(|e| StampError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.word_bits != 32 && self.word_bits != 64 {
            return Err(StampError::Config(format!(
                "word_bits must be 32 or 64, got {}",
                self.word_bits
            )));
        }
        if self.max_shift_iterations == 0 {
            return Err(StampError::Config(
                "max_shift_iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies process-side effects of the configuration on this thread.
    pub fn apply(&self) {
        if self.diagnostics {
            DiagnosticsCollector::enable();
        } else {
            DiagnosticsCollector::disable();
        }
    }
}
