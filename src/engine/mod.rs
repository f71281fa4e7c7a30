//! The external rendering engine: ffmpeg invocation for a compiled graph.

pub mod ffmpeg;
