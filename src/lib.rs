//! Splice compiles declarative video timelines into ffmpeg filter graphs.
//!
//! # Pipeline overview
//!
//! 1. **Probe**: every distinct file source is inspected up front ([`probe_sources`]).
//! 2. **Resolve**: `Document + ProbeTable -> CanonicalTimeline` (timing, sizing, layering).
//! 3. **Lower**: `CanonicalTimeline -> CompiledGraph` (inputs, filter program, output maps).
//! 4. **Render** (optional): run the system `ffmpeg` binary on the compiled graph.
//!
//! Resolution and lowering are pure and deterministic: the same document and probe
//! results always produce byte-identical programs. Recoverable problems (a clip
//! that cannot be lowered, an invalid effect) are skipped and reported as
//! [`Diagnostics`] rather than failing the render.
#![forbid(unsafe_code)]

mod compose;
mod config;
mod document;
mod engine;
mod foundation;
mod graph;
mod lower;
mod pipeline;
mod timeline;

pub use compose::orchestrator::compose_graph;
pub use config::CompileOptions;
pub use document::model::{
    Block, CanvasSpec, Document, EffectKind, EffectSpec, FadeDirection, FadeParams, MediaKind,
    ResizeMode, Source, TransitionKind, TransitionSpec,
};
pub use engine::ffmpeg::{
    CancelToken, EncodeConfig, FFMPEG_ENV, FfmpegCommand, FfmpegRunner, default_mp4_config,
    ensure_parent_dir, is_ffmpeg_on_path, render_graph,
};
pub use foundation::core::{Color, Size, TIME_EPSILON, fmt_num};
pub use foundation::diag::{Diagnostic, Diagnostics, Subject};
pub use foundation::error::{SpliceError, SpliceResult};
pub use graph::accumulator::{
    CompiledGraph, GraphBuilder, LabelCategory, OP_SEPARATOR, OutputKind, OutputMapping,
    StreamLabel,
};
pub use lower::effects::{EffectLowering, FadeEffect, fade_start};
pub use lower::registry::LoweringRegistry;
pub use lower::source::{
    AudioSource, ColourSource, ImageSource, SourceLowering, VideoSource, resize_chain,
    resolve_box,
};
pub use lower::transitions::{Crossfade, TransitionCall, TransitionLowering, crossfade_offset};
pub use lower::{ClipStreams, LowerContext};
pub use pipeline::{Compiled, compile_document};
pub use timeline::clip::{
    AudioProps, BlockFailure, CanonicalTimeline, Clip, ClipRole, ResolvedCanvas,
    ResolvedTransition, VisualProps,
};
pub use timeline::compiler::{TimelineCompiler, compile_timeline, resolve_path};
pub use timeline::probe::{
    FFPROBE_ENV, FfprobeProber, MediaInfo, ProbeKey, ProbeTable, Prober, StaticProber, file_sources,
    probe_sources,
};
