use super::*;

#[test]
fn candidate_resolver_reports_every_tried_path() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("missing-a.ttf");
    let b = dir.path().join("missing-b.ttf");
    let r = CandidateFontResolver::new(vec![a.clone(), b.clone()], Vec::new());
    match r.resolve(FontRole::Title) {
        FontLookup::NotFound { tried } => {
            assert_eq!(tried, vec![a.display().to_string(), b.display().to_string()]);
        }
        FontLookup::Found(_) => panic!("expected NotFound"),
    }
    assert!(matches!(
        r.resolve(FontRole::Podcast),
        FontLookup::NotFound { tried } if tried.is_empty()
    ));
}

#[test]
fn candidate_resolver_returns_first_readable_file() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty.ttf");
    let good = dir.path().join("good.ttf");
    std::fs::write(&empty, b"").unwrap();
    std::fs::write(&good, b"not really a font").unwrap();
    let r = CandidateFontResolver::new(Vec::new(), vec![empty, good.clone()]);
    match r.resolve(FontRole::Podcast) {
        FontLookup::Found(face) => {
            assert_eq!(face.name, good.display().to_string());
            assert_eq!(face.bytes.as_slice(), b"not really a font");
        }
        FontLookup::NotFound { .. } => panic!("expected Found"),
    }
}

#[test]
fn preferred_path_goes_first() {
    let r = CandidateFontResolver::system().with_preferred("/x/custom.ttf");
    assert_eq!(r.candidates(FontRole::Title)[0], PathBuf::from("/x/custom.ttf"));
    assert_eq!(r.candidates(FontRole::Podcast)[0], PathBuf::from("/x/custom.ttf"));
}

#[test]
fn builtin_only_never_finds() {
    assert!(matches!(
        BuiltinOnlyResolver.resolve(FontRole::Title),
        FontLookup::NotFound { .. }
    ));
}
