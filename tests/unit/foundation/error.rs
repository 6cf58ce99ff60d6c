use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        WavecastError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(WavecastError::cache("x").to_string().contains("cache error:"));
    assert!(
        WavecastError::asset_load("x")
            .to_string()
            .contains("asset load error:")
    );
    assert!(
        WavecastError::font_resolution("x")
            .to_string()
            .contains("font resolution error:")
    );
    assert!(WavecastError::encode("x").to_string().contains("encode error:"));
    assert!(
        WavecastError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = WavecastError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn only_absorbable_errors_are_non_fatal() {
    assert!(!WavecastError::cache("x").is_fatal());
    assert!(!WavecastError::asset_load("x").is_fatal());
    assert!(!WavecastError::font_resolution("x").is_fatal());
    assert!(WavecastError::encode("x").is_fatal());
    assert!(WavecastError::validation("x").is_fatal());
}

#[test]
fn outcome_collects_degradations() {
    let mut sink = Vec::new();
    let out = Outcome::degraded(
        3,
        vec![Degradation::LogoOmitted {
            reason: "missing".to_string(),
        }],
    );
    assert!(out.is_degraded());
    let v = out.map(|v| v * 2).absorb_into(&mut sink);
    assert_eq!(v, 6);
    assert_eq!(sink.len(), 1);
    assert!(sink[0].to_string().contains("logo omitted"));
    assert!(!Outcome::clean(()).is_degraded());
}
