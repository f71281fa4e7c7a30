use super::*;

#[test]
fn defaults_validate() {
    CompileOptions::default().validate().unwrap();
}

#[test]
fn partial_json_keeps_other_defaults() {
    let opts: CompileOptions = serde_json::from_str(r#"{ "static_duration": 8 }"#).unwrap();
    assert_eq!(opts.static_duration, 8.0);
    assert_eq!(opts.empty_block_duration, 1.0);
    assert_eq!(opts.overlay_track, 1_000_000);
}

#[test]
fn validation_catches_bad_values() {
    let bad = [
        CompileOptions {
            static_duration: 0.0,
            ..CompileOptions::default()
        },
        CompileOptions {
            empty_block_duration: f64::NAN,
            ..CompileOptions::default()
        },
        CompileOptions {
            track_stride: 0,
            ..CompileOptions::default()
        },
        CompileOptions {
            overlay_track: 10,
            ..CompileOptions::default()
        },
        CompileOptions {
            dropout_transition: -1.0,
            ..CompileOptions::default()
        },
        CompileOptions {
            sample_rate: 0,
            ..CompileOptions::default()
        },
    ];
    for opts in bad {
        assert!(opts.validate().is_err(), "{opts:?}");
    }
}
