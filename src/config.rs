use std::path::Path;

use crate::foundation::error::{SpliceError, SpliceResult};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Tunables for timeline resolution and graph composition.
///
/// Every field has a default, so a JSON options file only needs the keys it changes.
pub struct CompileOptions {
    /// Duration of a block that only holds images/colours, in seconds.
    pub static_duration: f64,
    /// Duration of a block with no content at all, in seconds.
    pub empty_block_duration: f64,
    /// Track distance between consecutive blocks' base offsets.
    pub track_stride: i64,
    /// Track assigned to the global overlay.
    pub overlay_track: i64,
    /// `amix` dropout transition window, in seconds.
    pub dropout_transition: f64,
    /// Sample rate every audio stream is resampled to before mixing.
    pub sample_rate: u32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            static_duration: 5.0,
            empty_block_duration: 1.0,
            track_stride: 100,
            overlay_track: 1_000_000,
            dropout_transition: 2.0,
            sample_rate: 48_000,
        }
    }
}

impl CompileOptions {
    /// Load options from a JSON file.
    pub fn from_path(path: &Path) -> SpliceResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read options '{}'", path.display()))?;
        let opts: Self = serde_json::from_str(&text)
            .map_err(|e| SpliceError::validation(format!("parse options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Check option invariants.
    pub fn validate(&self) -> SpliceResult<()> {
        for (name, v) in [
            ("static_duration", self.static_duration),
            ("empty_block_duration", self.empty_block_duration),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(SpliceError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if !self.dropout_transition.is_finite() || self.dropout_transition < 0.0 {
            return Err(SpliceError::validation(
                "dropout_transition must be finite and >= 0",
            ));
        }
        if self.track_stride <= 0 {
            return Err(SpliceError::validation("track_stride must be > 0"));
        }
        if self.overlay_track <= self.track_stride {
            return Err(SpliceError::validation(
                "overlay_track must be greater than track_stride",
            ));
        }
        if self.sample_rate == 0 {
            return Err(SpliceError::validation("sample_rate must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
