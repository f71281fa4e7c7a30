use std::collections::BTreeMap;

use crate::{
    document::model::{Document, MediaKind, Source, TransitionKind},
    foundation::error::{SpliceError, SpliceResult},
    lower::{
        effects::{EffectLowering, FadeEffect},
        source::{SourceLowering, standard_handler},
        transitions::{Crossfade, TransitionLowering},
    },
    timeline::probe::{MediaInfo, ProbeTable, Prober, probe_sources},
};

/// Kind → handler tables for sources, effects and transitions.
///
/// Built once, then shared read-only across renders.
pub struct LoweringRegistry {
    sources: BTreeMap<MediaKind, Box<dyn SourceLowering>>,
    effects: BTreeMap<String, Box<dyn EffectLowering>>,
    transitions: BTreeMap<TransitionKind, Box<dyn TransitionLowering>>,
}

impl std::fmt::Debug for LoweringRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoweringRegistry")
            .field("sources", &self.sources.keys().collect::<Vec<_>>())
            .field("effects", &self.effects.keys().collect::<Vec<_>>())
            .field("transitions", &self.transitions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for LoweringRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl LoweringRegistry {
    /// Registry with no handlers.
    pub fn empty() -> Self {
        Self {
            sources: BTreeMap::new(),
            effects: BTreeMap::new(),
            transitions: BTreeMap::new(),
        }
    }

    /// Registry with every built-in handler.
    pub fn standard() -> Self {
        let mut r = Self::empty();
        for kind in [
            MediaKind::Video,
            MediaKind::Image,
            MediaKind::Audio,
            MediaKind::Colour,
        ] {
            r.register_source(kind, standard_handler(kind));
        }
        r.register_effect("fade", Box::new(FadeEffect));
        r.register_transition(TransitionKind::Crossfade, Box::new(Crossfade));
        r
    }

    /// Install (or replace) the handler for a media kind.
    pub fn register_source(&mut self, kind: MediaKind, handler: Box<dyn SourceLowering>) {
        self.sources.insert(kind, handler);
    }

    /// Install (or replace) the handler for an effect kind.
    pub fn register_effect(&mut self, kind: impl Into<String>, handler: Box<dyn EffectLowering>) {
        self.effects.insert(kind.into(), handler);
    }

    /// Install (or replace) the handler for a transition kind.
    pub fn register_transition(
        &mut self,
        kind: TransitionKind,
        handler: Box<dyn TransitionLowering>,
    ) {
        self.transitions.insert(kind, handler);
    }

    /// Handler for a media kind.
    pub fn source(&self, kind: MediaKind) -> SpliceResult<&dyn SourceLowering> {
        self.sources
            .get(&kind)
            .map(|h| &**h)
            .ok_or_else(|| SpliceError::lowering(format!("no source handler for kind '{kind}'")))
    }

    /// Handler for an effect kind.
    pub fn effect(&self, kind: &str) -> SpliceResult<&dyn EffectLowering> {
        self.effects
            .get(kind)
            .map(|h| &**h)
            .ok_or_else(|| SpliceError::lowering(format!("no effect handler for kind '{kind}'")))
    }

    /// Handler for a transition kind.
    pub fn transition(&self, kind: TransitionKind) -> SpliceResult<&dyn TransitionLowering> {
        self.transitions.get(&kind).map(|h| &**h).ok_or_else(|| {
            SpliceError::lowering(format!("no transition handler for kind '{kind}'"))
        })
    }

    /// Probe every file-backed source of `doc`, routing each through its kind's handler.
    pub fn probe_sources(&self, doc: &Document, prober: &dyn Prober) -> ProbeTable {
        probe_sources(
            doc,
            &HandlerProber {
                registry: self,
                inner: prober,
            },
        )
    }
}

struct HandlerProber<'a> {
    registry: &'a LoweringRegistry,
    inner: &'a dyn Prober,
}

impl Prober for HandlerProber<'_> {
    fn probe(&self, source: &Source) -> SpliceResult<MediaInfo> {
        self.registry.source(source.kind)?.probe(source, self.inner)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/lower/registry.rs"]
mod tests;
