use super::*;

fn doc(json: serde_json::Value) -> Document {
    serde_json::from_value(json).unwrap()
}

fn minimal() -> serde_json::Value {
    serde_json::json!({
        "spec": "1.0",
        "canvas": { "w": 1280, "h": 720, "fps": 30 },
        "blocks": [
            { "id": "a", "duration": 3, "visuals": [{ "kind": "image", "src": "a.png" }] }
        ]
    })
}

#[test]
fn minimal_document_validates() {
    let d = doc(minimal());
    d.validate().unwrap();
    assert_eq!(d.blocks.len(), 1);
    assert_eq!(d.blocks[0].visuals[0].kind, MediaKind::Image);
}

#[test]
fn colour_kind_accepts_both_spellings() {
    let s: Source = serde_json::from_value(serde_json::json!({ "kind": "color", "src": "red" })).unwrap();
    assert_eq!(s.kind, MediaKind::Colour);
    let s: Source =
        serde_json::from_value(serde_json::json!({ "kind": "colour", "src": "#000000" })).unwrap();
    assert_eq!(s.kind, MediaKind::Colour);
}

#[test]
fn effects_parse_into_typed_params() {
    let s: Source = serde_json::from_value(serde_json::json!({
        "kind": "video",
        "src": "a.mp4",
        "effects": [
            { "kind": "fade", "type": "in", "duration": 0.5 },
            { "id": "late-out", "kind": "fade", "type": "out" }
        ]
    }))
    .unwrap();
    assert_eq!(
        s.effects[0].kind,
        EffectKind::Fade(FadeParams {
            direction: Some(FadeDirection::In),
            duration: Some(0.5),
        })
    );
    assert_eq!(s.effects[1].id.as_deref(), Some("late-out"));
    assert_eq!(
        s.effects[1].kind,
        EffectKind::Fade(FadeParams {
            direction: Some(FadeDirection::Out),
            duration: None,
        })
    );
}

#[test]
fn unknown_effect_kind_is_a_parse_error() {
    let r = serde_json::from_value::<EffectSpec>(serde_json::json!({ "kind": "blur", "radius": 3 }));
    assert!(r.is_err());
}

#[test]
fn transition_parses_type_and_between() {
    let t: TransitionSpec = serde_json::from_value(serde_json::json!({
        "id": "t1", "type": "crossfade", "duration": 1, "between": ["a", "b"]
    }))
    .unwrap();
    assert_eq!(t.kind, TransitionKind::Crossfade);
    assert_eq!(t.between, ["a".to_string(), "b".to_string()]);
}

#[test]
fn unknown_fields_are_rejected() {
    let r = Document::from_json_str(
        r#"{ "canvas": { "w": 10, "h": 10, "fps": 30 }, "blocks": [], "tracks": [] }"#,
    );
    assert!(matches!(r, Err(SpliceError::Validation(_))));
}

#[test]
fn validate_rejects_bad_canvas_and_version() {
    let mut d = doc(minimal());
    d.canvas.w = 0;
    assert!(d.validate().is_err());

    let mut d = doc(minimal());
    d.canvas.fps = 0.0;
    assert!(d.validate().is_err());

    let mut d = doc(minimal());
    d.spec = "2.0".to_string();
    assert!(d.validate().is_err());
}

#[test]
fn validate_rejects_out_of_range_properties() {
    let mut d = doc(minimal());
    d.blocks[0].visuals[0].opacity = Some(1.5);
    assert!(d.validate().is_err());

    let mut d = doc(minimal());
    d.blocks[0].audio = Some(Source {
        volume: Some(120.0),
        ..Source::new(MediaKind::Audio, "a.wav")
    });
    assert!(d.validate().is_err());

    let mut d = doc(minimal());
    d.blocks[0].visuals.push(Source::new(MediaKind::Colour, "not a colour"));
    assert!(d.validate().is_err());

    let mut d = doc(minimal());
    d.blocks[0].visuals.push(Source::new(MediaKind::Audio, "a.wav"));
    assert!(d.validate().is_err());
}

#[test]
fn validate_rejects_duplicate_and_self_referencing_ids() {
    let mut d = doc(minimal());
    d.blocks.push(d.blocks[0].clone());
    assert!(d.validate().is_err());

    let mut d = doc(minimal());
    d.transitions.push(TransitionSpec {
        id: "t".to_string(),
        kind: TransitionKind::Crossfade,
        duration: Some(1.0),
        between: ["a".to_string(), "a".to_string()],
    });
    assert!(d.validate().is_err());
}

#[test]
fn generated_block_ids_follow_index() {
    let b: Block = serde_json::from_value(serde_json::json!({})).unwrap();
    assert_eq!(b.id_or_index(3), "block-3");
    assert!(b.is_empty());
}
