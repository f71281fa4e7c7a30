use std::{collections::HashMap, fmt};

use crate::foundation::diag::{Diagnostics, Subject};

/// Separator placed between operations in the compiled program.
pub const OP_SEPARATOR: &str = ";\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Namespace of a stream label.
pub enum LabelCategory {
    /// Picture streams.
    Video,
    /// Sound streams.
    Audio,
    /// Subtitle streams.
    Subtitle,
    /// Anything else (intermediate plates, splits).
    Generic,
}

impl LabelCategory {
    fn prefix(self) -> &'static str {
        match self {
            Self::Video => "v",
            Self::Audio => "a",
            Self::Subtitle => "s",
            Self::Generic => "g",
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Video => 0,
            Self::Audio => 1,
            Self::Subtitle => 2,
            Self::Generic => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
/// Name of one edge in the filter graph.
///
/// `Display` renders the bracketed pad form (`[v3]`, `[0:a]`).
pub struct StreamLabel(String);

impl StreamLabel {
    /// Video stream of a registered input (`[N:v]`).
    pub fn input_video(index: usize) -> Self {
        Self(format!("{index}:v"))
    }

    /// Audio stream of a registered input (`[N:a]`).
    pub fn input_audio(index: usize) -> Self {
        Self(format!("{index}:a"))
    }

    /// Bare label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
/// Which output stream a mapping feeds.
pub enum OutputKind {
    /// Rendered picture.
    Video,
    /// Rendered sound.
    Audio,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
/// A graph stream mapped to the rendered output.
pub struct OutputMapping {
    /// Output stream kind.
    pub kind: OutputKind,
    /// Terminal label in the graph.
    pub label: StreamLabel,
}

impl OutputMapping {
    /// Argument for ffmpeg's `-map`.
    pub fn map_arg(&self) -> String {
        self.label.to_string()
    }
}

#[derive(Clone, Debug, serde::Serialize)]
/// The finalized artifact handed to the rendering engine.
pub struct CompiledGraph {
    /// File inputs in index order.
    pub inputs: Vec<String>,
    /// Filter-graph program text.
    pub program: String,
    /// Output mappings; video first when both are present.
    pub output_mappings: Vec<OutputMapping>,
    /// Recoverable conditions met while compiling.
    pub diagnostics: Diagnostics,
}

impl CompiledGraph {
    /// Individual operations of the program.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.program.split(OP_SEPARATOR).filter(|op| !op.is_empty())
    }

    /// Mapping for one output kind.
    pub fn mapping(&self, kind: OutputKind) -> Option<&OutputMapping> {
        self.output_mappings.iter().find(|m| m.kind == kind)
    }
}

#[derive(Debug, Default)]
/// Accumulates inputs, operations and labels for one render.
///
/// Created per render, threaded by `&mut` through every lowering call, and
/// consumed by [`GraphBuilder::build`].
pub struct GraphBuilder {
    inputs: Vec<String>,
    input_index: HashMap<String, usize>,
    ops: Vec<String>,
    counters: [u64; 4],
    final_video: Option<StreamLabel>,
    final_audio: Option<StreamLabel>,
    diagnostics: Diagnostics,
}

impl GraphBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file input, returning its dense zero-based index.
    ///
    /// Registering the same path again returns the existing index.
    pub fn register_input(&mut self, path: &str) -> usize {
        if let Some(&idx) = self.input_index.get(path) {
            return idx;
        }
        let idx = self.inputs.len();
        self.inputs.push(path.to_string());
        self.input_index.insert(path.to_string(), idx);
        idx
    }

    /// Index of an already registered input.
    pub fn input_index(&self, path: &str) -> Option<usize> {
        self.input_index.get(path).copied()
    }

    /// A label never returned before by this builder.
    pub fn fresh_label(&mut self, category: LabelCategory) -> StreamLabel {
        let n = &mut self.counters[category.slot()];
        let label = StreamLabel(format!("{}{}", category.prefix(), n));
        *n += 1;
        label
    }

    /// Append one operation fragment. The fragment's syntax is not checked.
    pub fn emit(&mut self, op: impl Into<String>) {
        let op = op.into();
        tracing::trace!(op = %op, "emit");
        self.ops.push(op);
    }

    /// Emit `inputs` → `filters` → a fresh label of `category`, returning that label.
    pub fn chain(
        &mut self,
        inputs: &[&StreamLabel],
        filters: &str,
        category: LabelCategory,
    ) -> StreamLabel {
        let out = self.fresh_label(category);
        let pads: String = inputs.iter().map(|l| l.to_string()).collect();
        self.emit(format!("{pads}{filters}{out}"));
        out
    }

    /// Record the terminal video stream; last call wins.
    pub fn finalize_video(&mut self, label: StreamLabel) {
        self.final_video = Some(label);
    }

    /// Record the terminal audio stream; last call wins.
    pub fn finalize_audio(&mut self, label: StreamLabel) {
        self.final_audio = Some(label);
    }

    /// Record a recoverable condition to travel with the compiled graph.
    pub fn diagnose(&mut self, subject: Subject, id: impl Into<String>, reason: impl Into<String>) {
        self.diagnostics.push(subject, id, reason);
    }

    /// Carry diagnostics from an earlier stage into the compiled graph.
    pub fn extend_diagnostics(&mut self, earlier: Diagnostics) {
        self.diagnostics.extend(earlier);
    }

    /// Number of operations emitted so far.
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Consume the builder into the finalized artifact.
    pub fn build(mut self) -> CompiledGraph {
        let mut output_mappings = Vec::new();
        if let Some(label) = self.final_video.take() {
            output_mappings.push(OutputMapping {
                kind: OutputKind::Video,
                label,
            });
        }
        if let Some(label) = self.final_audio.take() {
            output_mappings.push(OutputMapping {
                kind: OutputKind::Audio,
                label,
            });
        }
        if output_mappings.is_empty() {
            self.diagnostics
                .push(Subject::Graph, "output", "no video or audio stream was finalized");
        }

        CompiledGraph {
            inputs: self.inputs,
            program: self.ops.join(OP_SEPARATOR),
            output_mappings,
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/accumulator.rs"]
mod tests;
