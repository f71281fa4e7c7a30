use crate::{
    document::model::{EffectKind, FadeDirection},
    foundation::{core::fmt_num, diag::Subject},
    graph::accumulator::{GraphBuilder, LabelCategory},
    lower::ClipStreams,
    timeline::clip::Clip,
};

/// Per-kind effect handling.
pub trait EffectLowering: Send + Sync {
    /// Apply `effect` to the clip's current streams and return the new ones.
    ///
    /// Channels the effect does not touch are returned unchanged. Invalid
    /// parameters make the effect a no-op with a diagnostic.
    fn apply(
        &self,
        clip: &Clip,
        effect_id: &str,
        effect: &EffectKind,
        streams: ClipStreams,
        graph: &mut GraphBuilder,
    ) -> ClipStreams;
}

#[derive(Clone, Copy, Debug, Default)]
/// Fade in from, or out to, transparency and silence.
pub struct FadeEffect;

/// Clip-relative start of a fade. Fade-outs never start before 0.
pub fn fade_start(direction: FadeDirection, clip_duration: f64, fade_duration: f64) -> f64 {
    match direction {
        FadeDirection::In => 0.0,
        FadeDirection::Out => (clip_duration - fade_duration).max(0.0),
    }
}

impl EffectLowering for FadeEffect {
    fn apply(
        &self,
        clip: &Clip,
        effect_id: &str,
        effect: &EffectKind,
        streams: ClipStreams,
        graph: &mut GraphBuilder,
    ) -> ClipStreams {
        let EffectKind::Fade(params) = effect;
        let Some(direction) = params.direction else {
            graph.diagnose(Subject::Effect, effect_id, "fade is missing 'type'; skipped");
            return streams;
        };
        let d = match params.duration {
            Some(d) if d > 0.0 => d,
            Some(d) => {
                graph.diagnose(
                    Subject::Effect,
                    effect_id,
                    format!("fade duration {d} is not positive; skipped"),
                );
                return streams;
            }
            None => {
                graph.diagnose(Subject::Effect, effect_id, "fade is missing 'duration'; skipped");
                return streams;
            }
        };

        let t = match direction {
            FadeDirection::In => "in",
            FadeDirection::Out => "out",
        };
        let st = fmt_num(fade_start(direction, clip.duration, d));
        let d = fmt_num(d);

        let video = streams.video.map(|v| {
            graph.chain(
                &[&v],
                &format!("format=rgba,fade=t={t}:st={st}:d={d}:alpha=1"),
                LabelCategory::Video,
            )
        });
        let audio = streams.audio.map(|a| {
            graph.chain(
                &[&a],
                &format!("afade=t={t}:st={st}:d={d}"),
                LabelCategory::Audio,
            )
        });
        ClipStreams { video, audio }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/lower/effects.rs"]
mod tests;
