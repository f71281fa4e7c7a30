use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        SpliceError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        SpliceError::lowering("x")
            .to_string()
            .contains("lowering error:")
    );
    assert!(
        SpliceError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert_eq!(SpliceError::NoContent.to_string(), "no content to render");
}

#[test]
fn resolution_names_block_and_source() {
    let msg = SpliceError::resolution("intro", "clips/a.mp4", "probe failed").to_string();
    assert!(msg.contains("'intro'"));
    assert!(msg.contains("'clips/a.mp4'"));
    assert!(msg.contains("probe failed"));
}

#[test]
fn engine_error_carries_stderr() {
    let msg = SpliceError::engine("exit status: 1", "No such filter: 'bogus'").to_string();
    assert!(msg.contains("exit status: 1"));
    assert!(msg.contains("No such filter"));
}

#[test]
fn only_resolution_is_block_scoped() {
    assert!(!SpliceError::resolution("b", "s", "r").is_fatal());
    assert!(SpliceError::validation("x").is_fatal());
    assert!(SpliceError::lowering("x").is_fatal());
    assert!(SpliceError::NoContent.is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = SpliceError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
