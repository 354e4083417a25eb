use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        StudioError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(StudioError::asset("x").to_string().contains("asset error:"));
    assert!(StudioError::render("x").to_string().contains("render error:"));
    assert!(StudioError::api("x").to_string().contains("api error:"));
    assert!(
        StudioError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(StudioError::Tainted.to_string().contains("tainted"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = StudioError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn soft_failures_are_classified() {
    assert!(StudioError::Tainted.is_soft());
    assert!(StudioError::asset("404").is_soft());
    assert!(!StudioError::api("500").is_soft());
    assert!(!StudioError::validation("x").is_soft());
}

#[test]
fn serde_json_errors_map_to_serde_variant() {
    let err: StudioError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert!(matches!(err, StudioError::Serde(_)));
}
