//! Ambient property: the `while`-loop iteration cap in [`masala::RunConfig`]
//! is enforced exactly, not approximately.

use masala::RunConfig;

fn count_to_a_million(loop_limit: usize) -> Result<Vec<String>, masala::LangError> {
    let source = r#"
action!
maan lo i = 0
jab tak hai jaan (sach) {
    i = i + 1
}
ek baat bataun: i
paisa vasool
"#;
    masala::run(source, RunConfig::new(loop_limit))
}

#[test]
fn default_loop_limit_is_one_hundred_thousand() {
    assert_eq!(RunConfig::default().loop_limit, 100_000);
}

#[test]
fn a_loop_within_the_cap_completes_without_error() {
    let source = r#"
action!
maan lo i = 0
jab tak hai jaan (i < 5) {
    i = i + 1
}
ek baat bataun: i
paisa vasool
"#;
    let out = masala::run(source, RunConfig::new(5)).unwrap();
    assert_eq!(out, vec!["5"]);
}

#[test]
fn an_unbounded_loop_trips_the_configured_cap_exactly() {
    let err = count_to_a_million(100_000).unwrap_err();
    match err {
        masala::LangError::Runtime { message, .. } => {
            assert!(message.contains("100000"), "message was: {}", message);
        }
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

#[test]
fn a_custom_smaller_cap_is_honored() {
    let err = count_to_a_million(3).unwrap_err();
    match err {
        masala::LangError::Runtime { message, .. } => {
            assert!(message.contains('3'), "message was: {}", message);
        }
        other => panic!("expected a runtime error, got {:?}", other),
    }
}
