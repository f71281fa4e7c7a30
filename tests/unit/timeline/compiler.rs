use super::*;
use crate::timeline::probe::{StaticProber, probe_sources};

fn compile_json(json: serde_json::Value, prober: &StaticProber) -> CanonicalTimeline {
    let doc: Document = serde_json::from_value(json).unwrap();
    let probes = probe_sources(&doc, prober);
    compile_timeline(&doc, &probes, &CompileOptions::default()).unwrap()
}

fn spans(tl: &CanonicalTimeline) -> Vec<(String, f64, f64)> {
    tl.clips()
        .iter()
        .map(|c| (c.id.clone(), c.start, c.end))
        .collect()
}

#[test]
fn implicit_duration_comes_from_longest_video() {
    let prober = StaticProber::new().with("a.mp4", MediaInfo::video(10.0, false, 1920, 1080));
    let tl = compile_json(
        serde_json::json!({
            "canvas": { "w": 1920, "h": 1080, "fps": 30 },
            "blocks": [{ "visuals": [{ "kind": "video", "src": "a.mp4" }] }]
        }),
        &prober,
    );
    assert_eq!(tl.clips().len(), 1);
    let c = &tl.clips()[0];
    assert_eq!((c.start, c.end, c.duration), (0.0, 10.0, 10.0));
    assert_eq!(tl.duration, 10.0);
}

#[test]
fn sequential_blocks_advance_the_cursor() {
    let tl = compile_json(
        serde_json::json!({
            "canvas": { "w": 640, "h": 360, "fps": 25, "background_color": "#202020" },
            "blocks": [
                { "id": "a", "duration": 3, "visuals": [{ "kind": "colour", "src": "red" }] },
                { "id": "b", "duration": 3, "visuals": [{ "kind": "colour", "src": "blue" }] }
            ]
        }),
        &StaticProber::new(),
    );
    assert_eq!(
        spans(&tl),
        vec![
            ("a/visual-0".to_string(), 0.0, 3.0),
            ("b/visual-0".to_string(), 3.0, 6.0),
        ]
    );
    assert_eq!(tl.duration, 6.0);
}

#[test]
fn explicit_block_duration_beats_audio_probe() {
    let prober = StaticProber::new().with("song.wav", MediaInfo::audio(20.0));
    let tl = compile_json(
        serde_json::json!({
            "canvas": { "w": 640, "h": 360, "fps": 25 },
            "blocks": [{
                "id": "a",
                "duration": 5,
                "visuals": [{ "kind": "colour", "src": "black" }],
                "audio": { "kind": "audio", "src": "song.wav" }
            }]
        }),
        &prober,
    );
    for c in tl.clips() {
        assert_eq!(c.duration, 5.0, "{}", c.id);
    }
}

#[test]
fn audio_probe_beats_video_probe() {
    let prober = StaticProber::new()
        .with("song.wav", MediaInfo::audio(7.0))
        .with("a.mp4", MediaInfo::video(12.0, true, 640, 360));
    let tl = compile_json(
        serde_json::json!({
            "canvas": { "w": 640, "h": 360, "fps": 25 },
            "blocks": [{
                "id": "a",
                "visuals": [{ "kind": "video", "src": "a.mp4" }],
                "audio": { "kind": "audio", "src": "song.wav" }
            }]
        }),
        &prober,
    );
    assert_eq!(tl.duration, 7.0);
    assert_eq!(tl.clip("a/visual-0").unwrap().duration, 7.0);
}

#[test]
fn static_and_empty_blocks_use_defaults() {
    let prober = StaticProber::new().with("still.png", MediaInfo::still(Some(10), Some(10)));
    let tl = compile_json(
        serde_json::json!({
            "canvas": { "w": 640, "h": 360, "fps": 25 },
            "blocks": [
                { "id": "still", "visuals": [{ "kind": "image", "src": "still.png" }] },
                { "id": "gap" },
                { "id": "after", "duration": 1, "visuals": [{ "kind": "colour", "src": "red" }] }
            ]
        }),
        &prober,
    );
    let opts = CompileOptions::default();
    let still = tl.clip("still/visual-0").unwrap();
    assert_eq!(still.duration, opts.static_duration);
    let after = tl.clip("after/visual-0").unwrap();
    assert_eq!(after.start, opts.static_duration + opts.empty_block_duration);
}

#[test]
fn explicit_at_does_not_advance_cursor() {
    let tl = compile_json(
        serde_json::json!({
            "canvas": { "w": 640, "h": 360, "fps": 25 },
            "blocks": [
                { "id": "a", "duration": 2, "visuals": [{ "kind": "colour", "src": "red" }] },
                { "id": "pinned", "at": 10, "duration": 1, "visuals": [{ "kind": "colour", "src": "blue" }] },
                { "id": "b", "duration": 2, "visuals": [{ "kind": "colour", "src": "green" }] }
            ]
        }),
        &StaticProber::new(),
    );
    assert_eq!(tl.clip("pinned/visual-0").unwrap().start, 10.0);
    assert_eq!(tl.clip("b/visual-0").unwrap().start, 2.0);
    assert_eq!(tl.duration, 11.0);
}

#[test]
fn elements_are_clamped_to_their_block() {
    let tl = compile_json(
        serde_json::json!({
            "canvas": { "w": 640, "h": 360, "fps": 25 },
            "blocks": [{
                "id": "a",
                "duration": 4,
                "visuals": [
                    { "kind": "colour", "src": "red", "at": 1 },
                    { "kind": "colour", "src": "blue", "at": 1, "duration": 10 },
                    { "kind": "colour", "src": "green", "at": 0.5, "duration": 1 },
                    { "kind": "colour", "src": "white", "at": 4 }
                ]
            }]
        }),
        &StaticProber::new(),
    );
    assert_eq!(tl.clip("a/visual-0").unwrap().duration, 3.0);
    assert_eq!(tl.clip("a/visual-1").unwrap().end, 4.0);
    let green = tl.clip("a/visual-2").unwrap();
    assert_eq!((green.start, green.end), (0.5, 1.5));
    assert!(tl.clip("a/visual-3").is_none());
    assert_eq!(tl.diagnostics.about("a/visual-3").count(), 1);
}

#[test]
fn clips_sorted_by_start_then_track() {
    let tl = compile_json(
        serde_json::json!({
            "canvas": { "w": 640, "h": 360, "fps": 25 },
            "background": { "kind": "colour", "src": "black" },
            "blocks": [
                { "id": "a", "duration": 3, "visuals": [
                    { "kind": "colour", "src": "red" },
                    { "kind": "colour", "src": "blue", "at": 1 }
                ] },
                { "id": "b", "at": 0, "duration": 2, "visuals": [{ "kind": "colour", "src": "green" }] }
            ],
            "overlay": { "kind": "colour", "src": "#ffffff10" }
        }),
        &StaticProber::new(),
    );
    let clips = tl.clips();
    for pair in clips.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.start < b.start || (a.start == b.start && a.track <= b.track),
            "{} before {}",
            a.id,
            b.id
        );
    }
    assert_eq!(clips[0].id, "background");
    assert_eq!(clips[0].track, 0);
    let overlay = tl.clip("overlay").unwrap();
    assert!(clips.iter().all(|c| c.id == "overlay" || c.track < overlay.track));
    assert_eq!(overlay.duration, 3.0);
}

#[test]
fn sibling_tracks_strictly_increase() {
    let tl = compile_json(
        serde_json::json!({
            "canvas": { "w": 640, "h": 360, "fps": 25 },
            "blocks": [{ "id": "a", "duration": 1, "visuals": [
                { "kind": "colour", "src": "red" },
                { "kind": "colour", "src": "green" },
                { "kind": "colour", "src": "blue" }
            ] }]
        }),
        &StaticProber::new(),
    );
    let tracks: Vec<i64> = tl.clips().iter().map(|c| c.track).collect();
    assert_eq!(tracks, vec![1, 2, 3]);
}

#[test]
fn failed_required_probe_drops_only_that_block() {
    let tl = compile_json(
        serde_json::json!({
            "canvas": { "w": 640, "h": 360, "fps": 25 },
            "blocks": [
                { "id": "broken", "visuals": [{ "kind": "video", "src": "missing.mp4" }] },
                { "id": "ok", "duration": 2, "visuals": [{ "kind": "colour", "src": "red" }] }
            ]
        }),
        &StaticProber::new(),
    );
    assert_eq!(tl.failed_blocks.len(), 1);
    assert_eq!(tl.failed_blocks[0].block, "broken");
    assert_eq!(tl.failed_blocks[0].source, "missing.mp4");
    let ok = tl.clip("ok/visual-0").unwrap();
    assert_eq!((ok.start, ok.end), (0.0, 2.0));
    assert_eq!(tl.diagnostics.about("broken").count(), 1);
}

#[test]
fn failed_non_determining_probe_keeps_default_timing() {
    let tl = compile_json(
        serde_json::json!({
            "canvas": { "w": 640, "h": 360, "fps": 25 },
            "blocks": [{ "id": "a", "duration": 3, "visuals": [{ "kind": "video", "src": "missing.mp4" }] }]
        }),
        &StaticProber::new(),
    );
    let c = tl.clip("a/visual-0").unwrap();
    assert_eq!(c.duration, 3.0);
    assert!(c.media.is_none());
    assert_eq!(tl.diagnostics.about("a/visual-0").count(), 1);
}

#[test]
fn block_and_source_effects_are_concatenated() {
    let tl = compile_json(
        serde_json::json!({
            "canvas": { "w": 640, "h": 360, "fps": 25 },
            "blocks": [{
                "id": "a",
                "duration": 3,
                "effects": [{ "kind": "fade", "type": "out", "duration": 1 }],
                "visuals": [{
                    "kind": "colour",
                    "src": "red",
                    "effects": [{ "kind": "fade", "type": "in", "duration": 1 }]
                }]
            }]
        }),
        &StaticProber::new(),
    );
    let c = tl.clip("a/visual-0").unwrap();
    assert_eq!(c.effects.len(), 2);
    assert!(matches!(
        &c.effects[0].kind,
        crate::document::model::EffectKind::Fade(p)
            if p.direction == Some(crate::document::model::FadeDirection::In)
    ));
}

#[test]
fn background_covers_canvas_and_overlay_keeps_source_size() {
    let prober = StaticProber::new().with("bg.mp4", MediaInfo::video(30.0, false, 1280, 720));
    let tl = compile_json(
        serde_json::json!({
            "canvas": { "w": 1920, "h": 1080, "fps": 30 },
            "background": { "kind": "video", "src": "bg.mp4" },
            "blocks": [{ "id": "a", "duration": 4, "visuals": [{ "kind": "colour", "src": "red", "w": 100, "h": 100 }] }],
            "overlay": { "kind": "colour", "src": "blue", "w": 50, "h": 20 }
        }),
        &prober,
    );
    let bg = tl.clip("background").unwrap();
    let v = bg.visual.as_ref().unwrap();
    assert_eq!(v.size_override, Some(crate::foundation::core::Size::new(1920, 1080)));
    assert_eq!(v.resize, ResizeMode::Fill);
    assert_eq!(bg.duration, 4.0);
    let ov = tl.clip("overlay").unwrap().visual.as_ref().unwrap();
    assert_eq!((ov.w, ov.h, ov.size_override), (Some(50), Some(20), None));
}

#[test]
fn relative_sources_resolve_against_asset_root() {
    let doc: Document = serde_json::from_value(serde_json::json!({
        "canvas": { "w": 640, "h": 360, "fps": 25 },
        "blocks": [{ "id": "a", "duration": 1, "visuals": [
            { "kind": "image", "src": "img/a.png" },
            { "kind": "image", "src": "/abs/b.png" }
        ] }]
    }))
    .unwrap();
    let opts = CompileOptions::default();
    let tl = TimelineCompiler::new(&opts)
        .with_asset_root("/projects/demo")
        .compile(&doc, &ProbeTable::new())
        .unwrap();
    assert_eq!(tl.clip("a/visual-0").unwrap().src, "/projects/demo/img/a.png");
    assert_eq!(tl.clip("a/visual-1").unwrap().src, "/abs/b.png");
}

#[test]
fn transitions_bind_primary_clips_and_skip_invalid_ones() {
    let prober = StaticProber::new()
        .with("a.mp4", MediaInfo::video(5.0, true, 640, 360))
        .with("b.mp4", MediaInfo::video(5.0, false, 640, 360));
    let tl = compile_json(
        serde_json::json!({
            "canvas": { "w": 640, "h": 360, "fps": 25 },
            "blocks": [
                { "id": "a", "visuals": [{ "kind": "video", "src": "a.mp4" }] },
                { "id": "b", "visuals": [{ "kind": "video", "src": "b.mp4" }] },
                { "id": "far", "at": 40, "duration": 1, "visuals": [{ "kind": "colour", "src": "red" }] }
            ],
            "transitions": [
                { "id": "x", "type": "crossfade", "duration": 1, "between": ["a", "b"] },
                { "id": "gap", "type": "crossfade", "duration": 1, "between": ["b", "far"] },
                { "id": "ghost", "type": "crossfade", "duration": 1, "between": ["a", "nope"] },
                { "id": "zero", "type": "crossfade", "duration": 0, "between": ["a", "b"] }
            ]
        }),
        &prober,
    );
    assert_eq!(tl.transitions.len(), 1);
    let t = &tl.transitions[0];
    assert_eq!(t.from_video.as_deref(), Some("a/visual-0"));
    assert_eq!(t.to_video.as_deref(), Some("b/visual-0"));
    assert_eq!(t.from_audio.as_deref(), Some("a/visual-0"));
    assert_eq!(t.to_audio.as_deref(), Some("b/visual-0"));
    for id in ["gap", "ghost", "zero"] {
        assert_eq!(tl.diagnostics.about(id).count(), 1, "{id}");
    }
}

#[test]
fn invalid_document_is_rejected_before_resolution() {
    let doc: Document = serde_json::from_value(serde_json::json!({
        "canvas": { "w": 0, "h": 360, "fps": 25 },
        "blocks": []
    }))
    .unwrap();
    let r = compile_timeline(&doc, &ProbeTable::new(), &CompileOptions::default());
    assert!(matches!(r, Err(SpliceError::Validation(_))));
}

#[test]
fn empty_document_has_zero_duration() {
    let tl = compile_json(
        serde_json::json!({ "canvas": { "w": 640, "h": 360, "fps": 25 } }),
        &StaticProber::new(),
    );
    assert!(tl.is_empty());
    assert_eq!(tl.duration, 0.0);
}
