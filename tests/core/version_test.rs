use depfix_core::version::{InstalledVersion, Version};
use depfix_core::SpecifierSet;

fn v(text: &str) -> Version {
    Version::parse(text).unwrap()
}

#[test]
fn test_version_parsing() {
    assert!(Version::parse("2.26.0").is_ok());
    assert!(Version::parse("1!1.0rc2.post1.dev3+local.7").is_ok());
    assert!(Version::parse("definitely not a version").is_err());
}

#[test]
fn test_ordering_follows_pep440() {
    assert!(v("2.26.0") < v("2.27"));
    assert!(v("2.28.0") < v("2.32.5"));
    assert!(v("1.0rc1") < v("1.0"));
    assert!(v("1.0") < v("1.0.post1"));
    assert!(v("1.0.dev9") < v("1.0a1"));
    assert!(v("0!9.9") < v("1!0.1"));
    assert_eq!(v("1.0"), v("1.0.0"));
}

#[test]
fn test_empty_and_any_sets_satisfy_every_parseable_version() {
    for text in ["", "Any"] {
        let set = SpecifierSet::parse(text);
        assert!(set.is_empty());
        assert!(set.contains(&v("0.0.1")));
        assert!(set.contains(&v("1!5.0rc1")));
    }
}

#[test]
fn test_unknown_version_satisfies_only_the_empty_set() {
    let unknown = InstalledVersion::parse("mystery build");
    assert!(unknown.is_unknown());
    assert!(SpecifierSet::parse("").satisfied_by(&unknown));
    assert!(!SpecifierSet::parse(">=0").satisfied_by(&unknown));
    assert!(!SpecifierSet::parse("==1.0").satisfied_by(&unknown));
}

#[test]
fn test_specifier_set_conjunction() {
    let set = SpecifierSet::parse(" >=1.21.1 , <1.27 ");
    assert!(set.contains(&v("1.26.18")));
    assert!(!set.contains(&v("2.2.0")));
    assert!(!set.contains(&v("1.21.0")));
}

#[test]
fn test_intersection_by_concatenation() {
    let a = SpecifierSet::parse(">=2.27");
    let b = SpecifierSet::parse(">=2.28.0");
    let combined = a.intersect(&b);
    assert_eq!(combined.len(), 2);
    assert!(combined.contains(&v("2.32.5")));
    assert!(!combined.contains(&v("2.27.1")));
}

#[test]
fn test_compatible_release_bounds() {
    let set = SpecifierSet::parse("~=2.26");
    assert!(set.contains(&v("2.26")));
    assert!(set.contains(&v("2.99")));
    assert!(!set.contains(&v("3.0")));

    let set = SpecifierSet::parse("~=2.26.0");
    assert!(set.contains(&v("2.26.4")));
    assert!(!set.contains(&v("2.27.0")));
}

#[test]
fn test_prerelease_satisfaction_rules() {
    // excluded by default
    assert!(!SpecifierSet::parse(">=1.0").contains(&v("2.0rc1")));
    // admitted when the operand names one
    assert!(SpecifierSet::parse(">=2.0rc1").contains(&v("2.0rc2")));
    // strict equality on the exact release still matches
    assert!(SpecifierSet::parse("==2.0rc1").contains(&v("2.0rc1")));
}
