//! Full-match regex predicates for test assertions.

use regex::Regex;

/// Whether the entire subject matches the pattern.
///
/// The pattern is anchored at both ends, so `"a.c"` does not match `"gabca"`
/// while `".*a.c.*"` does.
///
/// # Panics
///
/// Panics if the pattern is not a valid regex. This is a test assertion
/// primitive; an invalid pattern is a bug in the test itself.
pub fn is_full_match(pattern: impl AsRef<str>, subject: impl AsRef<str>) -> bool {
    let anchored = format!("^(?:{})$", pattern.as_ref());
    let re = Regex::new(&anchored).expect("invalid regex pattern");
    re.is_match(subject.as_ref())
}

/// Assert that the entire subject matches a regex pattern.
#[macro_export]
macro_rules! assert_full_match {
    ($pattern:expr, $subject:expr $(,)?) => {
        match (&$pattern, &$subject) {
            (pattern, subject) => assert!(
                $crate::pattern::is_full_match(pattern, subject),
                "Expected {:?} to fully match pattern {:?}",
                subject,
                pattern,
            ),
        }
    };
}

/// Assert that the subject does not fully match a regex pattern.
#[macro_export]
macro_rules! assert_no_full_match {
    ($pattern:expr, $subject:expr $(,)?) => {
        match (&$pattern, &$subject) {
            (pattern, subject) => assert!(
                !$crate::pattern::is_full_match(pattern, subject),
                "Expected {:?} NOT to fully match pattern {:?}",
                subject,
                pattern,
            ),
        }
    };
}
