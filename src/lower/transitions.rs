use crate::{
    foundation::{core::fmt_num, diag::Subject},
    graph::accumulator::{GraphBuilder, LabelCategory},
    lower::ClipStreams,
};

#[derive(Clone, Copy, Debug)]
/// Timing of one transition window.
pub struct TransitionCall<'a> {
    /// Transition id, for diagnostics.
    pub id: &'a str,
    /// Overlap in seconds.
    pub duration: f64,
    /// Length of the stream being left, in seconds.
    pub from_duration: f64,
}

/// Per-kind transition handling.
pub trait TransitionLowering: Send + Sync {
    /// Join `from` and `to` into one stream per channel.
    ///
    /// Streams must arrive already aligned: `from` ending at the boundary, `to`
    /// starting at it. A channel present on only one side is passed through.
    fn apply(
        &self,
        call: &TransitionCall<'_>,
        from: &ClipStreams,
        to: &ClipStreams,
        graph: &mut GraphBuilder,
    ) -> ClipStreams;
}

#[derive(Clone, Copy, Debug, Default)]
/// Dissolve (`xfade`) plus audio crossfade (`acrossfade`).
pub struct Crossfade;

/// Where the visual overlap begins in the `from` stream, and whether it was clamped to 0.
pub fn crossfade_offset(from_duration: f64, duration: f64) -> (f64, bool) {
    let offset = from_duration - duration;
    if offset < 0.0 { (0.0, true) } else { (offset, false) }
}

impl TransitionLowering for Crossfade {
    fn apply(
        &self,
        call: &TransitionCall<'_>,
        from: &ClipStreams,
        to: &ClipStreams,
        graph: &mut GraphBuilder,
    ) -> ClipStreams {
        let d = fmt_num(call.duration);

        let video = match (&from.video, &to.video) {
            (Some(a), Some(b)) => {
                let (offset, clamped) = crossfade_offset(call.from_duration, call.duration);
                if clamped {
                    graph.diagnose(
                        Subject::Transition,
                        call.id,
                        format!(
                            "duration {}s exceeds the {}s it leaves; offset clamped to 0",
                            fmt_num(call.duration),
                            fmt_num(call.from_duration)
                        ),
                    );
                }
                Some(graph.chain(
                    &[a, b],
                    &format!(
                        "xfade=transition=fade:duration={d}:offset={}",
                        fmt_num(offset)
                    ),
                    LabelCategory::Video,
                ))
            }
            (a, b) => a.clone().or_else(|| b.clone()),
        };

        let audio = match (&from.audio, &to.audio) {
            (Some(a), Some(b)) => Some(graph.chain(
                &[a, b],
                &format!("acrossfade=d={d}:c1=tri:c2=tri"),
                LabelCategory::Audio,
            )),
            (a, b) => a.clone().or_else(|| b.clone()),
        };

        ClipStreams { video, audio }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/lower/transitions.rs"]
mod tests;
