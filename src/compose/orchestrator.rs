use std::collections::{HashMap, HashSet};

use crate::{
    config::CompileOptions,
    document::model::MediaKind,
    foundation::{
        core::{Color, fmt_num, secs_to_millis},
        diag::Subject,
        error::{SpliceError, SpliceResult},
    },
    graph::accumulator::{CompiledGraph, GraphBuilder, LabelCategory, StreamLabel},
    lower::{ClipStreams, LowerContext, registry::LoweringRegistry, transitions::TransitionCall},
    timeline::clip::{CanonicalTimeline, Clip, ClipRole},
};

/// One clip's streams on their way to the output, with where to place its picture.
#[derive(Debug)]
struct Lane<'t> {
    clip: &'t Clip,
    streams: ClipStreams,
    x: f64,
    y: f64,
    start: f64,
    end: f64,
    // Terminate the overlay with the shorter input (unbounded stills and colours).
    shortest: bool,
    // Already padded onto a canvas-sized plate at 0,0.
    aligned: bool,
}

impl Lane<'_> {
    fn span(&self) -> f64 {
        self.end - self.start
    }
}

/// Lower a canonical timeline into a compiled filter graph.
///
/// Steps run in a fixed order: sources, effects, transitions, base canvas,
/// compositing (bottom track first), audio mix, finalize. A clip whose source cannot be lowered is
/// skipped with a diagnostic; the render only fails when nothing is left.
#[tracing::instrument(skip(timeline, registry, opts), fields(clips = timeline.clips().len()))]
pub fn compose_graph(
    timeline: &CanonicalTimeline,
    registry: &LoweringRegistry,
    opts: &CompileOptions,
) -> SpliceResult<CompiledGraph> {
    let ctx = LowerContext {
        canvas: &timeline.canvas,
        opts,
    };
    let mut graph = GraphBuilder::new();
    graph.extend_diagnostics(timeline.diagnostics.clone());

    let mut lanes = lower_sources(timeline, registry, &ctx, &mut graph)?;
    apply_effects(registry, &mut lanes, &mut graph)?;
    apply_transitions(timeline, registry, &ctx, &mut lanes, &mut graph)?;

    let has_video = lanes.iter().any(|l| l.streams.video.is_some());
    let has_audio = lanes.iter().any(|l| l.streams.audio.is_some());
    if !has_video && !has_audio {
        return Err(SpliceError::NoContent);
    }

    if has_video {
        let mut current = base_canvas(timeline, &ctx, &mut lanes, &mut graph);
        // Stacking follows track alone; `enable` gates each layer in time.
        let mut layers: Vec<&Lane<'_>> = lanes
            .iter()
            .filter(|l| l.streams.video.is_some())
            .collect();
        layers.sort_by_key(|l| l.clip.track);
        for lane in layers {
            if let Some(v) = &lane.streams.video {
                current = composite(&mut graph, &current, v, lane);
            }
        }
        let out = graph.chain(&[&current], "format=yuv420p", LabelCategory::Video);
        graph.finalize_video(out);
    }

    if has_audio && let Some(mixed) = mix_audio(&lanes, opts, &mut graph) {
        graph.finalize_audio(mixed);
    }

    let compiled = graph.build();
    tracing::debug!(
        inputs = compiled.inputs.len(),
        diagnostics = compiled.diagnostics.len(),
        "graph composed"
    );
    Ok(compiled)
}

fn lower_sources<'t>(
    timeline: &'t CanonicalTimeline,
    registry: &LoweringRegistry,
    ctx: &LowerContext<'_>,
    graph: &mut GraphBuilder,
) -> SpliceResult<Vec<Lane<'t>>> {
    let mut lanes = Vec::with_capacity(timeline.clips().len());
    for clip in timeline.clips() {
        if matches!(clip.kind, MediaKind::Video | MediaKind::Audio) && clip.media.is_none() {
            graph.diagnose(Subject::Clip, &clip.id, "no resolvable input; skipped");
            continue;
        }
        let handler = registry.source(clip.kind)?;
        handler.register_inputs(clip, graph);
        let streams = handler.lower(clip, ctx, graph)?;
        if streams.is_empty() {
            graph.diagnose(
                Subject::Clip,
                &clip.id,
                "source yields neither a video nor an audio stream; skipped",
            );
            continue;
        }
        let (x, y) = clip.visual.as_ref().map_or((0.0, 0.0), |v| (v.x, v.y));
        lanes.push(Lane {
            clip,
            streams,
            x,
            y,
            start: clip.start,
            end: clip.end,
            shortest: clip.kind != MediaKind::Video,
            aligned: false,
        });
    }
    Ok(lanes)
}

fn apply_effects(
    registry: &LoweringRegistry,
    lanes: &mut [Lane<'_>],
    graph: &mut GraphBuilder,
) -> SpliceResult<()> {
    for lane in lanes.iter_mut() {
        let clip = lane.clip;
        for (i, effect) in clip.effects.iter().enumerate() {
            let handler = registry.effect(effect.kind.name())?;
            let id = effect
                .id
                .clone()
                .unwrap_or_else(|| format!("{}/{}-{i}", clip.id, effect.kind.name()));
            let streams = std::mem::take(&mut lane.streams);
            lane.streams = handler.apply(clip, &id, &effect.kind, streams, graph);
        }
    }
    Ok(())
}

/// Join transition pairs in place.
///
/// The joined stream lives on the `from` lane; the `to` lane gives up that channel
/// and later transitions naming the `to` clip resolve to the joined lane.
fn apply_transitions<'t>(
    timeline: &'t CanonicalTimeline,
    registry: &LoweringRegistry,
    ctx: &LowerContext<'_>,
    lanes: &mut [Lane<'t>],
    graph: &mut GraphBuilder,
) -> SpliceResult<()> {
    if timeline.transitions.is_empty() {
        return Ok(());
    }

    let mut video_owner = HashMap::<&'t str, usize>::new();
    let mut audio_owner = HashMap::<&'t str, usize>::new();
    for (i, lane) in lanes.iter().enumerate() {
        let clip: &'t Clip = lane.clip;
        if lane.streams.video.is_some() {
            video_owner.insert(clip.id.as_str(), i);
        }
        if lane.streams.audio.is_some() {
            audio_owner.insert(clip.id.as_str(), i);
        }
    }
    let mut joined = HashSet::<&'t str>::new();

    for tr in &timeline.transitions {
        let handler = registry.transition(tr.kind)?;

        if [&tr.to_video, &tr.to_audio]
            .into_iter()
            .flatten()
            .any(|id| joined.contains(id.as_str()))
        {
            graph.diagnose(
                Subject::Transition,
                &tr.id,
                format!("block '{}' is already joined by another transition; skipped", tr.to_block),
            );
            continue;
        }

        let fv = owner(&video_owner, tr.from_video.as_deref());
        let tv = owner(&video_owner, tr.to_video.as_deref());
        let fa = owner(&audio_owner, tr.from_audio.as_deref());
        let ta = owner(&audio_owner, tr.to_audio.as_deref());
        if (fv.is_some() && fv == tv) || (fa.is_some() && fa == ta) {
            graph.diagnose(Subject::Transition, &tr.id, "joins a stream with itself; skipped");
            continue;
        }

        let video_pair = fv.zip(tv);
        let audio_pair = fa.zip(ta);
        if video_pair.is_none() && audio_pair.is_none() {
            graph.diagnose(
                Subject::Transition,
                &tr.id,
                "no channel is present on both sides; streams passed through",
            );
        }

        let from_duration = match (fv, fa) {
            (Some(i), _) => lanes[i].span(),
            (None, Some(i)) => lanes[i].clip.duration,
            (None, None) => 0.0,
        };
        if let Some((f, t)) = video_pair {
            align(&mut lanes[f], ctx, graph);
            align(&mut lanes[t], ctx, graph);
        }

        let from = ClipStreams {
            video: fv.and_then(|i| lanes[i].streams.video.clone()),
            audio: fa.and_then(|i| lanes[i].streams.audio.clone()),
        };
        let to = ClipStreams {
            video: tv.and_then(|i| lanes[i].streams.video.clone()),
            audio: ta.and_then(|i| lanes[i].streams.audio.clone()),
        };
        let call = TransitionCall {
            id: &tr.id,
            duration: tr.duration,
            from_duration,
        };
        let joined_streams = handler.apply(&call, &from, &to, graph);

        if let Some((f, t)) = video_pair {
            let end = lanes[f].start + (from_duration - tr.duration).max(0.0) + lanes[t].span();
            lanes[f].streams.video = joined_streams.video;
            lanes[f].end = end;
            lanes[f].shortest = false;
            lanes[t].streams.video = None;
            redirect(&mut video_owner, t, f);
            if let Some(id) = &tr.to_video {
                joined.insert(id.as_str());
            }
        }
        if let Some((f, t)) = audio_pair {
            lanes[f].streams.audio = joined_streams.audio;
            lanes[t].streams.audio = None;
            redirect(&mut audio_owner, t, f);
            if let Some(id) = &tr.to_audio {
                joined.insert(id.as_str());
            }
        }
    }
    Ok(())
}

fn owner(owners: &HashMap<&str, usize>, clip: Option<&str>) -> Option<usize> {
    clip.and_then(|id| owners.get(id).copied())
}

fn redirect(owners: &mut HashMap<&str, usize>, from: usize, to: usize) {
    for v in owners.values_mut() {
        if *v == from {
            *v = to;
        }
    }
}

/// Pad a lane's picture onto a transparent canvas-sized plate so both sides of a
/// transition share size, rate and format.
fn align(lane: &mut Lane<'_>, ctx: &LowerContext<'_>, graph: &mut GraphBuilder) {
    if lane.aligned {
        return;
    }
    let Some(v) = lane.streams.video.take() else {
        return;
    };
    let plate = graph.chain(
        &[],
        &format!(
            "color=c=black@0:s={}:r={}:d={},format=rgba",
            ctx.canvas.size().to_filter_arg(),
            fmt_num(ctx.canvas.fps),
            fmt_num(lane.span())
        ),
        LabelCategory::Generic,
    );
    let out = graph.chain(
        &[&plate, &v],
        &format!(
            "overlay=x={}:y={}:eof_action=pass:shortest=1,format=rgba",
            fmt_num(lane.x),
            fmt_num(lane.y)
        ),
        LabelCategory::Video,
    );
    lane.streams.video = Some(out);
    lane.x = 0.0;
    lane.y = 0.0;
    lane.aligned = true;
}

/// The lowered background clip bounded to the timeline, or a synthesized solid base.
fn base_canvas(
    timeline: &CanonicalTimeline,
    ctx: &LowerContext<'_>,
    lanes: &mut [Lane<'_>],
    graph: &mut GraphBuilder,
) -> StreamLabel {
    let total = fmt_num(timeline.duration);
    let fps = fmt_num(ctx.canvas.fps);
    let background = lanes
        .iter_mut()
        .find(|l| l.clip.role == ClipRole::Background)
        .and_then(|l| l.streams.video.take());
    match background {
        Some(v) => graph.chain(
            &[&v],
            &format!("trim=duration={total},setpts=PTS-STARTPTS,fps={fps}"),
            LabelCategory::Video,
        ),
        None => {
            let colour = ctx.canvas.background_color.clone().unwrap_or_else(Color::black);
            graph.chain(
                &[],
                &format!(
                    "color=c={}:s={}:r={fps}:d={total}",
                    colour.to_filter_arg(),
                    ctx.canvas.size().to_filter_arg()
                ),
                LabelCategory::Video,
            )
        }
    }
}

fn composite(
    graph: &mut GraphBuilder,
    base: &StreamLabel,
    layer: &StreamLabel,
    lane: &Lane<'_>,
) -> StreamLabel {
    let start = fmt_num(lane.start);
    let end = fmt_num(lane.end);
    let shifted = graph.chain(
        &[layer],
        &format!("setpts=PTS-STARTPTS+{start}/TB"),
        LabelCategory::Video,
    );
    graph.chain(
        &[base, &shifted],
        &format!(
            "overlay=x={}:y={}:eof_action=pass:shortest={}:enable='between(t,{start},{end})'",
            fmt_num(lane.x),
            fmt_num(lane.y),
            u8::from(lane.shortest)
        ),
        LabelCategory::Video,
    )
}

fn mix_audio(
    lanes: &[Lane<'_>],
    opts: &CompileOptions,
    graph: &mut GraphBuilder,
) -> Option<StreamLabel> {
    let mut delayed: Vec<StreamLabel> = lanes
        .iter()
        .filter_map(|lane| {
            let a = lane.streams.audio.as_ref()?;
            let ms = secs_to_millis(lane.clip.start);
            Some(graph.chain(&[a], &format!("adelay={ms}:all=1"), LabelCategory::Audio))
        })
        .collect();

    match delayed.len() {
        0 => None,
        1 => delayed.pop(),
        n => {
            let inputs: Vec<&StreamLabel> = delayed.iter().collect();
            Some(graph.chain(
                &inputs,
                &format!(
                    "amix=inputs={n}:duration=longest:dropout_transition={}",
                    fmt_num(opts.dropout_transition)
                ),
                LabelCategory::Audio,
            ))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/orchestrator.rs"]
mod tests;
