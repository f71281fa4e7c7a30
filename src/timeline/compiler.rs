use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    config::CompileOptions,
    document::model::{Block, Document, MediaKind, ResizeMode, Source},
    foundation::{
        core::TIME_EPSILON,
        diag::{Diagnostics, Subject},
        error::{SpliceError, SpliceResult},
    },
    timeline::{
        clip::{
            AudioProps, BlockFailure, CanonicalTimeline, Clip, ClipRole, ResolvedCanvas,
            ResolvedTransition, VisualProps,
        },
        probe::{MediaInfo, ProbeTable},
    },
};

/// Resolve a document into a canonical timeline with default settings.
pub fn compile_timeline(
    doc: &Document,
    probes: &ProbeTable,
    opts: &CompileOptions,
) -> SpliceResult<CanonicalTimeline> {
    TimelineCompiler::new(opts).compile(doc, probes)
}

#[derive(Clone, Debug)]
/// Resolves implicit timing, sizing and layering of a [`Document`].
///
/// The compiler is pure: all probing happens beforehand and arrives as a
/// [`ProbeTable`].
pub struct TimelineCompiler<'a> {
    opts: &'a CompileOptions,
    asset_root: Option<PathBuf>,
}

#[derive(Clone, Debug)]
struct BlockSpan {
    start: f64,
    end: f64,
    primary_visual: Option<String>,
    sound: Option<String>,
}

impl<'a> TimelineCompiler<'a> {
    /// Compiler with the given options and no asset root.
    pub fn new(opts: &'a CompileOptions) -> Self {
        Self {
            opts,
            asset_root: None,
        }
    }

    /// Resolve relative `src` paths against `root`.
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    /// Resolve `doc` into a [`CanonicalTimeline`].
    ///
    /// Validation failures abort; a block whose duration cannot be determined is
    /// dropped and recorded in [`CanonicalTimeline::failed_blocks`].
    #[tracing::instrument(skip(self, doc, probes), fields(blocks = doc.blocks.len()))]
    pub fn compile(&self, doc: &Document, probes: &ProbeTable) -> SpliceResult<CanonicalTimeline> {
        doc.validate()?;
        self.opts.validate()?;

        let canvas = ResolvedCanvas {
            width: doc.canvas.w,
            height: doc.canvas.h,
            fps: doc.canvas.fps,
            background_color: doc.canvas.background_color.clone(),
        };

        let mut diags = Diagnostics::default();
        let mut failed_blocks = Vec::new();
        let mut clips = Vec::<Clip>::new();
        let mut spans = HashMap::<String, BlockSpan>::new();

        let mut cursor = 0.0f64;
        let mut base_track = 1i64;
        for (index, block) in doc.blocks.iter().enumerate() {
            let id = block.id_or_index(index);
            let block_base = base_track;
            base_track += self.opts.track_stride.max(block.visuals.len() as i64);

            let duration = match self.resolve_block_duration(&id, block, probes) {
                Ok(d) => d,
                Err(e) => {
                    if let SpliceError::Resolution {
                        block,
                        source_ref,
                        reason,
                    } = &e
                    {
                        failed_blocks.push(BlockFailure {
                            block: block.clone(),
                            source: source_ref.clone(),
                            reason: reason.clone(),
                        });
                    }
                    diags.push(Subject::Block, &id, e.to_string());
                    continue;
                }
            };
            let start = block.at.unwrap_or(cursor);
            if block.at.is_none() {
                cursor = start + duration;
            }
            tracing::debug!(block = %id, start, duration, "block resolved");

            let mut span = BlockSpan {
                start,
                end: start + duration,
                primary_visual: None,
                sound: None,
            };

            for (i, source) in block.visuals.iter().enumerate() {
                let clip_id = format!("{id}/visual-{i}");
                let Some((el_start, el_dur)) =
                    place_element(source, start, duration, &clip_id, &mut diags)
                else {
                    continue;
                };
                let media = self.lookup_media(source, &clip_id, probes, &mut diags);
                let clip = self.make_clip(
                    clip_id,
                    Some(&id),
                    ClipRole::Visual,
                    source,
                    block_base + i as i64,
                    el_start,
                    el_dur,
                    media,
                    &block.effects,
                    &canvas,
                );
                if span.primary_visual.is_none() {
                    span.primary_visual = Some(clip.id.clone());
                }
                clips.push(clip);
            }

            if let Some(source) = &block.audio {
                let clip_id = format!("{id}/audio");
                if let Some((el_start, el_dur)) =
                    place_element(source, start, duration, &clip_id, &mut diags)
                {
                    let media = self.lookup_media(source, &clip_id, probes, &mut diags);
                    let clip = self.make_clip(
                        clip_id,
                        Some(&id),
                        ClipRole::Audio,
                        source,
                        block_base,
                        el_start,
                        el_dur,
                        media,
                        &block.effects,
                        &canvas,
                    );
                    span.sound = Some(clip.id.clone());
                    clips.push(clip);
                }
            }

            if span.sound.is_none()
                && let Some(primary) = &span.primary_visual
                && clips
                    .iter()
                    .any(|c| &c.id == primary && c.kind == MediaKind::Video)
            {
                span.sound = Some(primary.clone());
            }
            spans.insert(id, span);
        }

        let content_end = clips.iter().map(|c| c.end).fold(0.0f64, f64::max);

        if let Some(bg) = &doc.background
            && let Some(clip) = self.global_clip(
                "background",
                ClipRole::Background,
                bg,
                0,
                content_end,
                probes,
                &canvas,
                &mut diags,
            )
        {
            clips.push(clip);
        }
        if let Some(ov) = &doc.overlay {
            let overlay_track = self.opts.overlay_track.max(base_track + 1);
            if let Some(clip) = self.global_clip(
                "overlay",
                ClipRole::Overlay,
                ov,
                overlay_track,
                content_end,
                probes,
                &canvas,
                &mut diags,
            ) {
                clips.push(clip);
            }
        }

        // Stable: equal (start, track) keep emission order.
        clips.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.track.cmp(&b.track)));

        let duration = clips.iter().map(|c| c.end).fold(0.0f64, f64::max);
        let transitions = resolve_transitions(doc, &spans, &mut diags);

        Ok(CanonicalTimeline {
            canvas,
            clips,
            transitions,
            duration,
            failed_blocks,
            diagnostics: diags,
        })
    }

    fn resolve_block_duration(
        &self,
        id: &str,
        block: &Block,
        probes: &ProbeTable,
    ) -> SpliceResult<f64> {
        if let Some(d) = block.duration {
            return Ok(d);
        }

        if let Some(audio) = &block.audio {
            let info = probes
                .lookup(audio)
                .map_err(|e| SpliceError::resolution(id, &audio.src, e))?;
            if let Some(d) = info.finite_duration() {
                return Ok(d);
            }
        }

        let mut longest: Option<f64> = None;
        for v in block.visuals.iter().filter(|v| v.kind == MediaKind::Video) {
            let info = probes
                .lookup(v)
                .map_err(|e| SpliceError::resolution(id, &v.src, e))?;
            if let Some(d) = info.finite_duration() {
                longest = Some(longest.map_or(d, |l| l.max(d)));
            }
        }
        if let Some(d) = longest {
            return Ok(d);
        }

        if block.is_empty() {
            Ok(self.opts.empty_block_duration)
        } else {
            Ok(self.opts.static_duration)
        }
    }

    fn lookup_media(
        &self,
        source: &Source,
        clip_id: &str,
        probes: &ProbeTable,
        diags: &mut Diagnostics,
    ) -> Option<MediaInfo> {
        match probes.lookup(source) {
            Ok(info) => Some(info),
            Err(e) => {
                diags.push(
                    Subject::Clip,
                    clip_id,
                    format!("probe failed, using default duration policy: {e}"),
                );
                None
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn global_clip(
        &self,
        id: &str,
        role: ClipRole,
        source: &Source,
        track: i64,
        content_end: f64,
        probes: &ProbeTable,
        canvas: &ResolvedCanvas,
        diags: &mut Diagnostics,
    ) -> Option<Clip> {
        let media = self.lookup_media(source, id, probes, diags);
        let duration = if content_end > TIME_EPSILON {
            content_end
        } else {
            match media.as_ref().and_then(MediaInfo::finite_duration) {
                Some(d) => d,
                None => {
                    diags.push(Subject::Clip, id, "no block content to span; dropped");
                    return None;
                }
            }
        };
        Some(self.make_clip(
            id.to_string(),
            None,
            role,
            source,
            track,
            0.0,
            duration,
            media,
            &[],
            canvas,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn make_clip(
        &self,
        id: String,
        block: Option<&str>,
        role: ClipRole,
        source: &Source,
        track: i64,
        start: f64,
        duration: f64,
        media: Option<MediaInfo>,
        block_effects: &[crate::document::model::EffectSpec],
        canvas: &ResolvedCanvas,
    ) -> Clip {
        let visual = (role != ClipRole::Audio && source.kind.is_visual()).then(|| VisualProps {
            x: source.x.unwrap_or(0.0),
            y: source.y.unwrap_or(0.0),
            w: source.w,
            h: source.h,
            size_override: (role == ClipRole::Background).then(|| canvas.size()),
            opacity: source.opacity.unwrap_or(1.0),
            resize: source.resize.unwrap_or(match role {
                ClipRole::Background => ResizeMode::Fill,
                _ => ResizeMode::Fit,
            }),
        });
        let audio = matches!(source.kind, MediaKind::Video | MediaKind::Audio).then(|| AudioProps {
            volume: source.volume.unwrap_or(100.0),
        });

        let mut effects = source.effects.clone();
        effects.extend(block_effects.iter().cloned());

        Clip {
            id,
            block: block.map(str::to_string),
            role,
            kind: source.kind,
            src: self.resolve_src(source),
            track,
            start,
            end: start + duration,
            duration,
            visual,
            audio,
            media,
            effects,
        }
    }

    fn resolve_src(&self, source: &Source) -> String {
        if !source.kind.is_file_backed() {
            return source.src.clone();
        }
        resolve_path(self.asset_root.as_deref(), &source.src)
    }
}

/// Resolve a document `src` against an optional asset root.
///
/// Absolute paths and URLs are returned unchanged.
pub fn resolve_path(root: Option<&Path>, src: &str) -> String {
    let p = Path::new(src);
    match root {
        Some(root) if !p.is_absolute() && !src.contains("://") => {
            root.join(p).to_string_lossy().into_owned()
        }
        _ => src.to_string(),
    }
}

/// Place an element inside its block; `None` (with a diagnostic) when nothing is left.
fn place_element(
    source: &Source,
    block_start: f64,
    block_duration: f64,
    clip_id: &str,
    diags: &mut Diagnostics,
) -> Option<(f64, f64)> {
    let at = source.at.unwrap_or(0.0);
    let remaining = block_duration - at;
    let own = source.duration.unwrap_or(remaining);
    let duration = own.min(remaining);
    if duration <= TIME_EPSILON {
        diags.push(
            Subject::Clip,
            clip_id,
            format!("resolved duration {duration:.3}s is not positive; dropped"),
        );
        return None;
    }
    Some((block_start + at, duration))
}

fn resolve_transitions(
    doc: &Document,
    spans: &HashMap<String, BlockSpan>,
    diags: &mut Diagnostics,
) -> Vec<ResolvedTransition> {
    let mut out = Vec::<(f64, ResolvedTransition)>::new();
    for tr in &doc.transitions {
        let [from_id, to_id] = &tr.between;
        let (Some(from), Some(to)) = (spans.get(from_id), spans.get(to_id)) else {
            diags.push(
                Subject::Transition,
                &tr.id,
                format!("references unknown or unresolved block ('{from_id}' -> '{to_id}')"),
            );
            continue;
        };
        let duration = match tr.duration {
            Some(d) if d > 0.0 => d,
            Some(d) => {
                diags.push(
                    Subject::Transition,
                    &tr.id,
                    format!("duration {d} is not positive; skipped"),
                );
                continue;
            }
            None => {
                diags.push(Subject::Transition, &tr.id, "missing duration; skipped");
                continue;
            }
        };
        if (to.start - from.end).abs() > TIME_EPSILON {
            diags.push(
                Subject::Transition,
                &tr.id,
                format!(
                    "blocks are not adjacent ('{from_id}' ends at {:.3}s, '{to_id}' starts at {:.3}s)",
                    from.end, to.start
                ),
            );
            continue;
        }
        if from.primary_visual.is_none()
            && to.primary_visual.is_none()
            && from.sound.is_none()
            && to.sound.is_none()
        {
            diags.push(Subject::Transition, &tr.id, "neither block has content; skipped");
            continue;
        }
        out.push((
            from.start,
            ResolvedTransition {
                id: tr.id.clone(),
                kind: tr.kind,
                duration,
                from_block: from_id.clone(),
                to_block: to_id.clone(),
                from_video: from.primary_visual.clone(),
                to_video: to.primary_visual.clone(),
                from_audio: from.sound.clone(),
                to_audio: to.sound.clone(),
            },
        ));
    }
    out.sort_by(|a, b| a.0.total_cmp(&b.0));
    out.into_iter().map(|(_, t)| t).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/compiler.rs"]
mod tests;
