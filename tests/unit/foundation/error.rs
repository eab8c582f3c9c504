use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PostError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(PostError::asset("x").to_string().contains("asset error:"));
    assert!(PostError::font("x").to_string().contains("font error:"));
    assert!(
        PostError::generation("x")
            .to_string()
            .contains("generation error:")
    );
    assert!(PostError::export("x").to_string().contains("export error:"));
    assert!(PostError::render("x").to_string().contains("render error:"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PostError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
