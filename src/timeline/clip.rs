use crate::{
    document::model::{EffectSpec, MediaKind, ResizeMode, TransitionKind},
    foundation::{
        core::{Color, Size},
        diag::Diagnostics,
    },
    timeline::probe::MediaInfo,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
/// Where a clip came from in the document.
pub enum ClipRole {
    /// The global background; always track 0.
    Background,
    /// A visual element of a block.
    Visual,
    /// The audio element of a block.
    Audio,
    /// The global overlay; always the highest track.
    Overlay,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Resolved picture properties of a visual clip.
pub struct VisualProps {
    /// Left edge on the canvas, in pixels.
    pub x: f64,
    /// Top edge on the canvas, in pixels.
    pub y: f64,
    /// Explicit box width from the source.
    pub w: Option<u32>,
    /// Explicit box height from the source.
    pub h: Option<u32>,
    /// Box forced by the timeline (e.g. background covers the canvas); wins over `w`/`h`.
    pub size_override: Option<Size>,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// How the picture is sized into its box.
    pub resize: ResizeMode,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Resolved sound properties of an audio-bearing clip.
pub struct AudioProps {
    /// Volume in `[0, 100]`.
    pub volume: f64,
}

impl AudioProps {
    /// Volume as a linear gain for the `volume` filter.
    pub fn gain(&self) -> f64 {
        self.volume / 100.0
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// One resolved, time-bounded instance of a source.
///
/// Invariant: `end == start + duration` and `duration > 0`.
pub struct Clip {
    /// Unique clip id (`<block>/visual-<i>`, `<block>/audio`, `background`, `overlay`).
    pub id: String,
    /// Owning block id, if any.
    pub block: Option<String>,
    /// Role in the document.
    pub role: ClipRole,
    /// Media kind.
    pub kind: MediaKind,
    /// Resolved path, or colour literal.
    pub src: String,
    /// Layering key; higher composites on top.
    pub track: i64,
    /// Absolute start in seconds.
    pub start: f64,
    /// Absolute end in seconds.
    pub end: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// Picture properties; `None` for clips that only contribute sound.
    pub visual: Option<VisualProps>,
    /// Sound properties; `None` for kinds that cannot carry audio.
    pub audio: Option<AudioProps>,
    /// Probe result; `None` when the source could not be probed.
    pub media: Option<MediaInfo>,
    /// Effects in application order.
    pub effects: Vec<EffectSpec>,
}

impl Clip {
    /// Whether this clip is composited onto the canvas.
    pub fn is_visual(&self) -> bool {
        self.visual.is_some()
    }

    /// Whether the clip's source is known to carry sound.
    pub fn has_audio(&self) -> bool {
        self.audio.is_some() && self.media.as_ref().is_some_and(|m| m.has_audio)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Canvas after defaults are applied.
pub struct ResolvedCanvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frames per second.
    pub fps: f64,
    /// Colour of the synthesized base.
    pub background_color: Option<Color>,
}

impl ResolvedCanvas {
    /// Canvas dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// A transition bound to concrete clips.
///
/// Video and audio are resolved independently: either side of either channel may
/// be absent, in which case the transition passes the present stream through.
pub struct ResolvedTransition {
    /// Transition id.
    pub id: String,
    /// Transition kind.
    pub kind: TransitionKind,
    /// Overlap in seconds (> 0).
    pub duration: f64,
    /// Block the transition leaves.
    pub from_block: String,
    /// Block the transition enters.
    pub to_block: String,
    /// Bottom-most visual clip of the `from` block.
    pub from_video: Option<String>,
    /// Bottom-most visual clip of the `to` block.
    pub to_video: Option<String>,
    /// Sound-carrying clip of the `from` block.
    pub from_audio: Option<String>,
    /// Sound-carrying clip of the `to` block.
    pub to_audio: Option<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// A block that could not be resolved.
pub struct BlockFailure {
    /// Block id.
    pub block: String,
    /// `src` of the source whose probe was required.
    pub source: String,
    /// Why resolution failed.
    pub reason: String,
}

#[derive(Clone, Debug, serde::Serialize)]
/// The fully resolved timeline.
///
/// Clips are sorted by `(start, track)`; ties keep emission order.
pub struct CanonicalTimeline {
    /// Resolved canvas.
    pub canvas: ResolvedCanvas,
    pub(crate) clips: Vec<Clip>,
    /// Transitions in the order they are applied.
    pub transitions: Vec<ResolvedTransition>,
    /// Maximum `end` over all clips; 0 when empty.
    pub duration: f64,
    /// Blocks dropped because their duration could not be resolved.
    pub failed_blocks: Vec<BlockFailure>,
    /// Recoverable conditions met while resolving.
    pub diagnostics: Diagnostics,
}

impl CanonicalTimeline {
    /// Clips in `(start, track)` order.
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Look up a clip by id.
    pub fn clip(&self, id: &str) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    /// `true` when no clip survived resolution.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}
