//! Message helpers shared by assertion failures.
//!
//! Every failure message follows the same shape: a subject line naming what
//! was checked, then an expected (`-`) line and an actual (`+`) line.
//!
//! ```text
//! Header content-type did not match value:
//!   - application/json
//!   + text/html
//! ```

/// Renders the expected/actual pair, omitting whichever side is absent.
#[must_use]
pub fn compare(actual: Option<&str>, expected: Option<&str>) -> String {
    let mut lines = Vec::with_capacity(2);
    if let Some(expected) = expected {
        lines.push(format!("  - {expected}"));
    }
    if let Some(actual) = actual {
        lines.push(format!("  + {actual}"));
    }
    lines.join("\n")
}

/// `"{kind} {name} was expected"`, followed by the expected value when known.
#[must_use]
pub fn was_expected(kind: &str, name: &str, expected: Option<&str>) -> String {
    match expected {
        Some(expected) => format!(
            "{kind} {name} was expected:\n{}",
            compare(None, Some(expected))
        ),
        None => format!("{kind} {name} was expected."),
    }
}

/// `"{kind} {name} was not expected"`, followed by the value that was found.
#[must_use]
pub fn was_not_expected(kind: &str, name: Option<&str>, actual: &str) -> String {
    format!(
        "{} was not expected:\n{}",
        subject(kind, name),
        compare(Some(actual), None)
    )
}

/// `"{kind} {name} did not match value"`, followed by both sides.
#[must_use]
pub fn did_not_match_value(
    kind: &str,
    name: Option<&str>,
    expected: &str,
    actual: Option<&str>,
) -> String {
    format!(
        "{} did not match value:\n{}",
        subject(kind, name),
        compare(actual, Some(expected))
    )
}

/// Label for an attribute of a cookie, used as the `kind` of other helpers.
#[must_use]
pub fn cookie_attribute(cookie: &str, attribute: &str) -> String {
    format!("Attribute {attribute} of cookie {cookie}")
}

fn subject(kind: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{kind} {name}"),
        None => kind.to_string(),
    }
}
