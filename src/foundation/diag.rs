use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
/// What a diagnostic is about.
pub enum Subject {
    /// A timeline block.
    Block,
    /// A resolved clip (or the source element it came from).
    Clip,
    /// An effect attached to a clip.
    Effect,
    /// A transition between two blocks.
    Transition,
    /// The graph as a whole.
    Graph,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Block => "block",
            Self::Clip => "clip",
            Self::Effect => "effect",
            Self::Transition => "transition",
            Self::Graph => "graph",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// A recoverable condition: something was skipped or adjusted, processing went on.
pub struct Diagnostic {
    /// Kind of the thing the diagnostic is about.
    pub subject: Subject,
    /// Identifier of the block/clip/effect/transition.
    pub id: String,
    /// Why it was skipped or adjusted.
    pub reason: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}': {}", self.subject, self.id, self.reason)
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
/// Ordered collection of [`Diagnostic`]s produced by one compile.
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Record a diagnostic and log it at `warn`.
    pub fn push(&mut self, subject: Subject, id: impl Into<String>, reason: impl Into<String>) {
        let d = Diagnostic {
            subject,
            id: id.into(),
            reason: reason.into(),
        };
        tracing::warn!(subject = %d.subject, id = %d.id, "{}", d.reason);
        self.0.push(d);
    }

    /// Append all entries from `other`, keeping order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// All entries in emission order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.0
    }

    /// Entries about one subject id.
    pub fn about<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.0.iter().filter(move |d| d.id == id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/diag.rs"]
mod tests;
