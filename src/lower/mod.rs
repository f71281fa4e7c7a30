//! Translation of timeline concepts (sources, effects, transitions) into graph operations.

pub mod effects;
pub mod registry;
pub mod source;
pub mod transitions;

use crate::{config::CompileOptions, graph::accumulator::StreamLabel, timeline::clip::ResolvedCanvas};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Current video/audio stream labels of one clip.
///
/// The two channels are independent: a handler passes through any channel it
/// does not touch.
pub struct ClipStreams {
    /// Picture stream, if the clip has one.
    pub video: Option<StreamLabel>,
    /// Sound stream, if the clip has one.
    pub audio: Option<StreamLabel>,
}

impl ClipStreams {
    /// `true` when neither channel is present.
    pub fn is_empty(&self) -> bool {
        self.video.is_none() && self.audio.is_none()
    }
}

#[derive(Clone, Copy, Debug)]
/// Read-only render settings handed to source handlers.
pub struct LowerContext<'a> {
    /// Resolved output canvas.
    pub canvas: &'a ResolvedCanvas,
    /// Compile options (sample rate etc.).
    pub opts: &'a CompileOptions,
}
