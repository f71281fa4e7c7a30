use std::path::Path;

use crate::{
    compose::orchestrator::compose_graph,
    config::CompileOptions,
    document::model::Document,
    foundation::error::SpliceResult,
    graph::accumulator::CompiledGraph,
    lower::registry::LoweringRegistry,
    timeline::{clip::CanonicalTimeline, compiler::TimelineCompiler, probe::Prober},
};

#[derive(Clone, Debug)]
/// Both artifacts of one compile.
pub struct Compiled {
    pub timeline: CanonicalTimeline,
    pub graph: CompiledGraph,
}

/// Probe, resolve and lower `doc` in one go.
///
/// Relative `src` paths are resolved against `asset_root` when given.
pub fn compile_document(
    doc: &Document,
    prober: &dyn Prober,
    registry: &LoweringRegistry,
    opts: &CompileOptions,
    asset_root: Option<&Path>,
) -> SpliceResult<Compiled> {
    doc.validate()?;
    let probes = registry.probe_sources(doc, prober);
    let mut compiler = TimelineCompiler::new(opts);
    if let Some(root) = asset_root {
        compiler = compiler.with_asset_root(root);
    }
    let timeline = compiler.compile(doc, &probes)?;
    let graph = compose_graph(&timeline, registry, opts)?;
    Ok(Compiled { timeline, graph })
}
