use std::{collections::BTreeSet, fmt, path::Path};

use crate::foundation::{
    core::Color,
    error::{SpliceError, SpliceResult},
};

/// Major document version understood by this crate.
pub const SUPPORTED_SPEC_MAJOR: &str = "1";

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// A complete timeline document.
///
/// Documents are pure data: parse with [`Document::from_json_str`], check with
/// [`Document::validate`], then resolve with [`crate::compile_timeline`].
pub struct Document {
    /// Document format version (`"1"`, `"1.0"`, ...).
    #[serde(default = "default_spec")]
    pub spec: String,
    /// Output canvas.
    pub canvas: CanvasSpec,
    /// Full-duration layer rendered beneath every block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Source>,
    /// Timeline blocks in document order.
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Full-duration layer rendered above every block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<Source>,
    /// Transitions between pairs of blocks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<TransitionSpec>,
}

fn default_spec() -> String {
    SUPPORTED_SPEC_MAJOR.to_string()
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// Output canvas dimensions and frame rate.
pub struct CanvasSpec {
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
    /// Frames per second.
    pub fps: f64,
    /// Colour of the synthesized base when there is no background source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// A time-bounded group of visual sources and at most one audio source.
pub struct Block {
    /// Identifier referenced by transitions; generated from the index when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Absolute start in seconds. Blocks with `at` do not advance the sequential cursor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<f64>,
    /// Explicit duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Visual sources, bottom-to-top.
    #[serde(default)]
    pub visuals: Vec<Source>,
    /// Optional audio source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<Source>,
    /// Effects applied to every element of the block, after the element's own.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectSpec>,
}

impl Block {
    /// The block id, or `block-<index>` when the document left it out.
    pub fn id_or_index(&self, index: usize) -> String {
        self.id.clone().unwrap_or_else(|| format!("block-{index}"))
    }

    /// `true` when the block has neither visuals nor audio.
    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty() && self.audio.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Media kind of a [`Source`].
pub enum MediaKind {
    /// Video file; may carry audio.
    Video,
    /// Still image file.
    Image,
    /// Audio-only file.
    Audio,
    /// Generated solid colour; `src` is the colour literal.
    #[serde(alias = "color")]
    Colour,
}

impl MediaKind {
    /// Whether the kind is backed by a file input.
    pub fn is_file_backed(self) -> bool {
        !matches!(self, Self::Colour)
    }

    /// Whether the kind has no intrinsic duration.
    pub fn is_unbounded(self) -> bool {
        matches!(self, Self::Image | Self::Colour)
    }

    /// Whether the kind produces a picture.
    pub fn is_visual(self) -> bool {
        !matches!(self, Self::Audio)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Video => "video",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Colour => "colour",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// How a source is sized into its target box.
pub enum ResizeMode {
    /// Keep aspect ratio, letterbox inside the box.
    #[default]
    Fit,
    /// Keep aspect ratio, crop to cover the box.
    Fill,
    /// Ignore aspect ratio.
    Stretch,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// A media source placed inside a block (or as background/overlay).
pub struct Source {
    /// Media kind.
    pub kind: MediaKind,
    /// File path, or colour literal for [`MediaKind::Colour`].
    pub src: String,
    /// Left edge on the canvas, in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Top edge on the canvas, in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Target box width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    /// Target box height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,
    /// Opacity in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Resize mode into the target box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<ResizeMode>,
    /// Volume in `[0, 100]` for audio-bearing kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// Offset from the block start, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<f64>,
    /// Element duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Effects applied to this element, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectSpec>,
}

impl Source {
    /// Minimal source of a kind; every optional field unset.
    pub fn new(kind: MediaKind, src: impl Into<String>) -> Self {
        Self {
            kind,
            src: src.into(),
            x: None,
            y: None,
            w: None,
            h: None,
            opacity: None,
            resize: None,
            volume: None,
            at: None,
            duration: None,
            effects: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// An effect attached to a source or block.
pub struct EffectSpec {
    /// Optional identifier used in diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Kind and kind-specific parameters.
    #[serde(flatten)]
    pub kind: EffectKind,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// Supported effect kinds with their typed parameters.
pub enum EffectKind {
    /// Fade in from, or out to, transparency/silence.
    Fade(FadeParams),
}

impl EffectKind {
    /// Registry key of this effect kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fade(_) => "fade",
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Parameters for [`EffectKind::Fade`].
///
/// Both fields are optional at parse time; a fade missing either one is skipped
/// with a diagnostic instead of failing the document.
pub struct FadeParams {
    /// `in` or `out`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<FadeDirection>,
    /// Fade length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Fade direction.
pub enum FadeDirection {
    /// Starts at clip time 0.
    In,
    /// Ends at the clip's end.
    Out,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Supported transition kinds.
pub enum TransitionKind {
    /// Dissolve between the two blocks, video and audio.
    Crossfade,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crossfade => f.write_str("crossfade"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// A transition between two blocks.
pub struct TransitionSpec {
    /// Transition identifier.
    pub id: String,
    /// Transition kind.
    #[serde(rename = "type")]
    pub kind: TransitionKind,
    /// Overlap length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// `[from_block_id, to_block_id]`.
    pub between: [String; 2],
}

impl Document {
    /// Parse a document from JSON text.
    pub fn from_json_str(s: &str) -> SpliceResult<Self> {
        serde_json::from_str(s).map_err(|e| SpliceError::validation(format!("parse document: {e}")))
    }

    /// Read and parse a document from a JSON file.
    pub fn from_path(path: &Path) -> SpliceResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read document '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Check the structural invariants the timeline compiler relies on.
    pub fn validate(&self) -> SpliceResult<()> {
        let major = self.spec.split('.').next().unwrap_or_default();
        if major != SUPPORTED_SPEC_MAJOR {
            return Err(SpliceError::validation(format!(
                "unsupported document spec '{}' (expected {SUPPORTED_SPEC_MAJOR}.x)",
                self.spec
            )));
        }

        if self.canvas.w == 0 || self.canvas.h == 0 {
            return Err(SpliceError::validation("canvas w/h must be > 0"));
        }
        if !self.canvas.fps.is_finite() || self.canvas.fps <= 0.0 {
            return Err(SpliceError::validation("canvas fps must be finite and > 0"));
        }

        if let Some(bg) = &self.background {
            validate_source(bg, "background")?;
        }
        if let Some(ov) = &self.overlay {
            validate_source(ov, "overlay")?;
        }

        let mut ids = BTreeSet::new();
        for (index, block) in self.blocks.iter().enumerate() {
            let id = block.id_or_index(index);
            if id.trim().is_empty() {
                return Err(SpliceError::validation(format!(
                    "block {index} has an empty id"
                )));
            }
            if !ids.insert(id.clone()) {
                return Err(SpliceError::validation(format!(
                    "duplicate block id '{id}'"
                )));
            }
            validate_seconds(block.at, &format!("block '{id}' at"))?;
            validate_seconds(block.duration, &format!("block '{id}' duration"))?;

            for (i, v) in block.visuals.iter().enumerate() {
                let field = format!("block '{id}' visual {i}");
                if !v.kind.is_visual() {
                    return Err(SpliceError::validation(format!(
                        "{field} has non-visual kind '{}'",
                        v.kind
                    )));
                }
                validate_source(v, &field)?;
            }
            if let Some(a) = &block.audio {
                let field = format!("block '{id}' audio");
                if a.kind != MediaKind::Audio && a.kind != MediaKind::Video {
                    return Err(SpliceError::validation(format!(
                        "{field} must be of kind 'audio' or 'video', got '{}'",
                        a.kind
                    )));
                }
                validate_source(a, &field)?;
            }
            for fx in &block.effects {
                validate_effect(fx, &format!("block '{id}'"))?;
            }
        }

        let mut transition_ids = BTreeSet::new();
        for tr in &self.transitions {
            if tr.id.trim().is_empty() {
                return Err(SpliceError::validation("transition id must be non-empty"));
            }
            if !transition_ids.insert(tr.id.as_str()) {
                return Err(SpliceError::validation(format!(
                    "duplicate transition id '{}'",
                    tr.id
                )));
            }
            if tr.between[0] == tr.between[1] {
                return Err(SpliceError::validation(format!(
                    "transition '{}' must join two distinct blocks",
                    tr.id
                )));
            }
            if let Some(d) = tr.duration
                && !d.is_finite()
            {
                return Err(SpliceError::validation(format!(
                    "transition '{}' duration must be finite",
                    tr.id
                )));
            }
        }

        Ok(())
    }
}

fn validate_seconds(v: Option<f64>, field: &str) -> SpliceResult<()> {
    if let Some(v) = v
        && (!v.is_finite() || v < 0.0)
    {
        return Err(SpliceError::validation(format!(
            "{field} must be finite and >= 0"
        )));
    }
    Ok(())
}

fn validate_source(src: &Source, field: &str) -> SpliceResult<()> {
    if src.src.trim().is_empty() {
        return Err(SpliceError::validation(format!("{field} src must be non-empty")));
    }
    if src.kind == MediaKind::Colour {
        Color::parse(&src.src)
            .map_err(|e| SpliceError::validation(format!("{field} src: {e}")))?;
    }
    if let Some(o) = src.opacity
        && (!o.is_finite() || !(0.0..=1.0).contains(&o))
    {
        return Err(SpliceError::validation(format!(
            "{field} opacity must be in [0, 1]"
        )));
    }
    if let Some(v) = src.volume
        && (!v.is_finite() || !(0.0..=100.0).contains(&v))
    {
        return Err(SpliceError::validation(format!(
            "{field} volume must be in [0, 100]"
        )));
    }
    for (name, v) in [("x", src.x), ("y", src.y)] {
        if let Some(v) = v
            && !v.is_finite()
        {
            return Err(SpliceError::validation(format!("{field} {name} must be finite")));
        }
    }
    if src.w == Some(0) || src.h == Some(0) {
        return Err(SpliceError::validation(format!("{field} w/h must be > 0")));
    }
    validate_seconds(src.at, &format!("{field} at"))?;
    // Negative element durations are tolerated here; the compiler drops them.
    if let Some(d) = src.duration
        && !d.is_finite()
    {
        return Err(SpliceError::validation(format!("{field} duration must be finite")));
    }
    for fx in &src.effects {
        validate_effect(fx, field)?;
    }
    Ok(())
}

fn validate_effect(fx: &EffectSpec, field: &str) -> SpliceResult<()> {
    match &fx.kind {
        EffectKind::Fade(p) => {
            if let Some(d) = p.duration
                && !d.is_finite()
            {
                return Err(SpliceError::validation(format!(
                    "{field} fade duration must be finite"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/document/model.rs"]
mod tests;
