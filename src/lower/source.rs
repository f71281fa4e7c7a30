use crate::{
    document::model::{MediaKind, ResizeMode, Source},
    foundation::{
        core::{Color, Size, TIME_EPSILON, fmt_num},
        error::{SpliceError, SpliceResult},
    },
    graph::accumulator::{GraphBuilder, LabelCategory, StreamLabel},
    lower::{ClipStreams, LowerContext},
    timeline::{
        clip::{Clip, VisualProps},
        probe::{MediaInfo, Prober},
    },
};

/// Per-kind source handling: probing, input registration and lowering.
pub trait SourceLowering: Send + Sync {
    /// Intrinsic properties of `source`, consulted before the timeline is resolved.
    fn probe(&self, source: &Source, prober: &dyn Prober) -> SpliceResult<MediaInfo> {
        prober.probe(source)
    }

    /// Register every backing file `clip` needs. Generated kinds register nothing.
    fn register_inputs(&self, clip: &Clip, graph: &mut GraphBuilder) {
        graph.register_input(&clip.src);
    }

    /// Emit the operations that trim, size and position the clip's streams.
    fn lower(
        &self,
        clip: &Clip,
        ctx: &LowerContext<'_>,
        graph: &mut GraphBuilder,
    ) -> SpliceResult<ClipStreams>;
}

#[derive(Clone, Copy, Debug, Default)]
/// Video files: picture and, when the probe saw one, sound.
pub struct VideoSource;

#[derive(Clone, Copy, Debug, Default)]
/// Still images, looped into an unbounded picture stream.
pub struct ImageSource;

#[derive(Clone, Copy, Debug, Default)]
/// Audio-only files.
pub struct AudioSource;

#[derive(Clone, Copy, Debug, Default)]
/// Generated solid colour; no backing file.
pub struct ColourSource;

impl SourceLowering for VideoSource {
    fn lower(
        &self,
        clip: &Clip,
        ctx: &LowerContext<'_>,
        graph: &mut GraphBuilder,
    ) -> SpliceResult<ClipStreams> {
        let idx = input_of(clip, graph)?;
        let media = clip.media.as_ref();
        let mut out = ClipStreams::default();

        if let Some(visual) = &clip.visual
            && media.is_some_and(|m| m.has_video)
        {
            let mut f = vec![
                format!("trim=duration={}", fmt_num(clip.duration)),
                "setpts=PTS-STARTPTS".to_string(),
            ];
            if let Some(shortfall) = shortfall(clip) {
                f.push(format!(
                    "tpad=stop_mode=clone:stop_duration={}",
                    fmt_num(shortfall)
                ));
            }
            f.push(format!("fps={}", fmt_num(ctx.canvas.fps)));
            f.extend(picture_chain(visual, resolve_box(clip, ctx)));
            out.video = Some(graph.chain(
                &[&StreamLabel::input_video(idx)],
                &f.join(","),
                LabelCategory::Video,
            ));
        }

        if clip.has_audio() {
            out.audio = Some(graph.chain(
                &[&StreamLabel::input_audio(idx)],
                &audio_chain(clip, ctx),
                LabelCategory::Audio,
            ));
        }
        Ok(out)
    }
}

impl SourceLowering for ImageSource {
    fn probe(&self, source: &Source, prober: &dyn Prober) -> SpliceResult<MediaInfo> {
        let info = prober.probe(source)?;
        Ok(MediaInfo::still(info.width, info.height))
    }

    fn lower(
        &self,
        clip: &Clip,
        ctx: &LowerContext<'_>,
        graph: &mut GraphBuilder,
    ) -> SpliceResult<ClipStreams> {
        let idx = input_of(clip, graph)?;
        let Some(visual) = &clip.visual else {
            return Ok(ClipStreams::default());
        };
        let mut f = vec![
            "loop=loop=-1:size=1:start=0".to_string(),
            format!("fps={}", fmt_num(ctx.canvas.fps)),
        ];
        f.extend(picture_chain(visual, resolve_box(clip, ctx)));
        Ok(ClipStreams {
            video: Some(graph.chain(
                &[&StreamLabel::input_video(idx)],
                &f.join(","),
                LabelCategory::Video,
            )),
            audio: None,
        })
    }
}

impl SourceLowering for AudioSource {
    fn probe(&self, source: &Source, prober: &dyn Prober) -> SpliceResult<MediaInfo> {
        let mut info = prober.probe(source)?;
        info.has_video = false;
        Ok(info)
    }

    fn lower(
        &self,
        clip: &Clip,
        ctx: &LowerContext<'_>,
        graph: &mut GraphBuilder,
    ) -> SpliceResult<ClipStreams> {
        let idx = input_of(clip, graph)?;
        if !clip.has_audio() {
            return Ok(ClipStreams::default());
        }
        Ok(ClipStreams {
            video: None,
            audio: Some(graph.chain(
                &[&StreamLabel::input_audio(idx)],
                &audio_chain(clip, ctx),
                LabelCategory::Audio,
            )),
        })
    }
}

impl SourceLowering for ColourSource {
    fn probe(&self, _source: &Source, _prober: &dyn Prober) -> SpliceResult<MediaInfo> {
        Ok(MediaInfo::still(None, None))
    }

    fn register_inputs(&self, _clip: &Clip, _graph: &mut GraphBuilder) {}

    fn lower(
        &self,
        clip: &Clip,
        ctx: &LowerContext<'_>,
        graph: &mut GraphBuilder,
    ) -> SpliceResult<ClipStreams> {
        let Some(visual) = &clip.visual else {
            return Ok(ClipStreams::default());
        };
        let colour = Color::parse(&clip.src)?;
        let size = resolve_box(clip, ctx);
        let mut f = vec![format!(
            "color=c={}:s={}:r={}",
            colour.to_filter_arg(),
            size.to_filter_arg(),
            fmt_num(ctx.canvas.fps)
        )];
        f.extend(opacity_chain(visual.opacity));
        Ok(ClipStreams {
            video: Some(graph.chain(&[], &f.join(","), LabelCategory::Video)),
            audio: None,
        })
    }
}

/// Index of the clip's registered input.
fn input_of(clip: &Clip, graph: &GraphBuilder) -> SpliceResult<usize> {
    graph.input_index(&clip.src).ok_or_else(|| {
        SpliceError::lowering(format!(
            "input '{}' of clip '{}' was not registered",
            clip.src, clip.id
        ))
    })
}

/// How much shorter the probed media is than the clip, if at all.
fn shortfall(clip: &Clip) -> Option<f64> {
    let d = clip.media.as_ref()?.finite_duration()?;
    (d + TIME_EPSILON < clip.duration).then(|| clip.duration - d)
}

/// Target box of a visual clip.
///
/// Each dimension resolves independently: timeline override, then the source's
/// explicit value, then the probed intrinsic size, then the canvas.
pub fn resolve_box(clip: &Clip, ctx: &LowerContext<'_>) -> Size {
    let canvas = ctx.canvas.size();
    let visual = clip.visual.as_ref();
    if let Some(size) = visual.and_then(|v| v.size_override) {
        return size;
    }
    let media = clip.media.as_ref();
    let w = visual
        .and_then(|v| v.w)
        .or_else(|| media.and_then(|m| m.width))
        .unwrap_or(canvas.w);
    let h = visual
        .and_then(|v| v.h)
        .or_else(|| media.and_then(|m| m.height))
        .unwrap_or(canvas.h);
    Size::new(w, h)
}

/// Filters that bring a picture to exactly `size` under `mode`.
pub fn resize_chain(mode: ResizeMode, size: Size) -> Vec<String> {
    let (w, h) = (size.w, size.h);
    match mode {
        ResizeMode::Fit => vec![
            format!("scale={w}:{h}:force_original_aspect_ratio=decrease"),
            "format=rgba".to_string(),
            format!("pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black@0"),
        ],
        ResizeMode::Fill => vec![
            format!("scale={w}:{h}:force_original_aspect_ratio=increase"),
            format!("crop={w}:{h}"),
        ],
        ResizeMode::Stretch => vec![format!("scale={w}:{h}")],
    }
}

/// Alpha scaling; empty for fully opaque pictures.
pub fn opacity_chain(opacity: f64) -> Vec<String> {
    if opacity >= 1.0 - TIME_EPSILON {
        return Vec::new();
    }
    vec![
        "format=rgba".to_string(),
        format!("colorchannelmixer=aa={}", fmt_num(opacity)),
    ]
}

// Opacity goes last so alpha applies to the final pixels.
fn picture_chain(visual: &VisualProps, size: Size) -> Vec<String> {
    let mut f = resize_chain(visual.resize, size);
    f.push("setsar=1".to_string());
    f.extend(opacity_chain(visual.opacity));
    f
}

fn audio_chain(clip: &Clip, ctx: &LowerContext<'_>) -> String {
    let mut f = vec![
        format!("atrim=duration={}", fmt_num(clip.duration)),
        "asetpts=PTS-STARTPTS".to_string(),
    ];
    if shortfall(clip).is_some() {
        f.push(format!("apad=whole_dur={}", fmt_num(clip.duration)));
    }
    f.push(format!("aresample={}", ctx.opts.sample_rate));
    f.push("aformat=sample_fmts=fltp:channel_layouts=stereo".to_string());
    let gain = clip.audio.as_ref().map_or(1.0, |a| a.gain());
    f.push(format!("volume={}", fmt_num(gain)));
    f.join(",")
}

/// Handler for a media kind in the standard set.
pub fn standard_handler(kind: MediaKind) -> Box<dyn SourceLowering> {
    match kind {
        MediaKind::Video => Box::new(VideoSource),
        MediaKind::Image => Box::new(ImageSource),
        MediaKind::Audio => Box::new(AudioSource),
        MediaKind::Colour => Box::new(ColourSource),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/lower/source.rs"]
mod tests;
