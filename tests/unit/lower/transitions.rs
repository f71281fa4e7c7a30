use super::*;
use crate::graph::accumulator::StreamLabel;

fn streams(video: Option<usize>, audio: Option<usize>) -> ClipStreams {
    ClipStreams {
        video: video.map(StreamLabel::input_video),
        audio: audio.map(StreamLabel::input_audio),
    }
}

fn call(duration: f64, from_duration: f64) -> TransitionCall<'static> {
    TransitionCall {
        id: "x",
        duration,
        from_duration,
    }
}

#[test]
fn offset_is_from_duration_minus_overlap() {
    assert_eq!(crossfade_offset(5.0, 1.0), (4.0, false));
    assert_eq!(crossfade_offset(0.5, 1.0), (0.0, true));
}

#[test]
fn crossfade_joins_both_channels() {
    let mut g = GraphBuilder::new();
    let out = Crossfade.apply(
        &call(1.0, 5.0),
        &streams(Some(0), Some(0)),
        &streams(Some(1), Some(1)),
        &mut g,
    );
    assert_eq!(out.video.unwrap().as_str(), "v0");
    assert_eq!(out.audio.unwrap().as_str(), "a0");

    let built = g.build();
    let ops: Vec<&str> = built.operations().collect();
    assert_eq!(
        ops,
        vec![
            "[0:v][1:v]xfade=transition=fade:duration=1:offset=4[v0]",
            "[0:a][1:a]acrossfade=d=1:c1=tri:c2=tri[a0]",
        ]
    );
    assert_eq!(
        built
            .diagnostics
            .entries()
            .iter()
            .filter(|d| d.subject == Subject::Transition)
            .count(),
        0
    );
}

#[test]
fn overlong_transition_clamps_offset_with_a_diagnostic() {
    let mut g = GraphBuilder::new();
    Crossfade.apply(
        &call(1.0, 0.5),
        &streams(Some(0), None),
        &streams(Some(1), None),
        &mut g,
    );
    let built = g.build();
    assert!(built.program.contains("offset=0[v0]"));
    assert_eq!(built.diagnostics.about("x").count(), 1);
}

#[test]
fn one_sided_channels_pass_through() {
    let mut g = GraphBuilder::new();
    let out = Crossfade.apply(
        &call(1.0, 5.0),
        &streams(Some(0), None),
        &streams(None, Some(1)),
        &mut g,
    );
    assert_eq!(out.video, Some(StreamLabel::input_video(0)));
    assert_eq!(out.audio, Some(StreamLabel::input_audio(1)));
    assert_eq!(g.op_count(), 0);
}
