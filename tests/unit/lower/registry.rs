use serde_json::json;

use super::*;
use crate::timeline::probe::StaticProber;

#[test]
fn standard_registry_covers_every_kind() {
    let r = LoweringRegistry::standard();
    for kind in [
        MediaKind::Video,
        MediaKind::Image,
        MediaKind::Audio,
        MediaKind::Colour,
    ] {
        assert!(r.source(kind).is_ok(), "{kind}");
    }
    assert!(r.effect("fade").is_ok());
    assert!(r.transition(TransitionKind::Crossfade).is_ok());
}

#[test]
fn unregistered_kinds_are_lowering_errors() {
    let r = LoweringRegistry::empty();
    assert!(matches!(
        r.source(MediaKind::Video),
        Err(SpliceError::Lowering(_))
    ));
    assert!(matches!(r.effect("blur"), Err(SpliceError::Lowering(_))));
    assert!(matches!(
        r.transition(TransitionKind::Crossfade),
        Err(SpliceError::Lowering(_))
    ));
}

#[test]
fn probing_routes_through_kind_handlers() {
    let doc: Document = serde_json::from_value(json!({
        "canvas": { "w": 64, "h": 64, "fps": 10 },
        "blocks": [{
            "id": "b",
            "visuals": [{ "kind": "image", "src": "x.png" }],
            "audio": { "kind": "audio", "src": "x.wav" }
        }]
    }))
    .unwrap();
    let prober = StaticProber::new()
        .with("x.png", MediaInfo::video(3.0, true, 8, 8))
        .with("x.wav", MediaInfo::video(7.0, true, 8, 8));

    let table = LoweringRegistry::standard().probe_sources(&doc, &prober);
    let img = table.lookup(&doc.blocks[0].visuals[0]).unwrap();
    assert_eq!(img.duration, None);
    assert!(!img.has_audio);
    let wav = table.lookup(doc.blocks[0].audio.as_ref().unwrap()).unwrap();
    assert!(!wav.has_video);
    assert_eq!(wav.finite_duration(), Some(7.0));
}

#[test]
fn probing_without_a_handler_records_a_failure() {
    let doc: Document = serde_json::from_value(json!({
        "canvas": { "w": 64, "h": 64, "fps": 10 },
        "blocks": [{ "id": "b", "visuals": [{ "kind": "video", "src": "a.mp4" }] }]
    }))
    .unwrap();
    let prober = StaticProber::new().with("a.mp4", MediaInfo::video(3.0, true, 8, 8));
    let table = LoweringRegistry::empty().probe_sources(&doc, &prober);
    assert!(table.lookup(&doc.blocks[0].visuals[0]).is_err());
}
