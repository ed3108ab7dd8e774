use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(VgcError::format("x").to_string().contains("format error:"));
    assert!(
        VgcError::structural("x")
            .to_string()
            .contains("structural error:")
    );
    assert!(VgcError::parse("x").to_string().contains("parse error:"));
    assert!(
        VgcError::cache_usage("x")
            .to_string()
            .contains("cache usage error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = VgcError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn kind_predicates_match_variants() {
    assert!(VgcError::format("x").is_format());
    assert!(!VgcError::format("x").is_structural());
    assert!(VgcError::structural("x").is_structural());
    assert!(VgcError::cache_usage("x").is_cache_usage());
}
