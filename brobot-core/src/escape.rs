//! Quoting for strings interpolated into scripts, XPath and CSS selectors.

/// Quote `argument` as a single-quoted JavaScript string literal.
///
/// ```
/// use brobot_core::escape::quote;
///
/// assert_eq!(quote("it's"), r"'it\'s'");
/// ```
pub fn quote(argument: &str) -> String {
    let mut out = String::with_capacity(argument.len() + 2);
    out.push('\'');
    for ch in argument.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

/// XPath 1.0 has no escape sequences; strings holding both quote kinds are
/// assembled with `concat()`.
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    if !text.contains('"') {
        return format!("\"{text}\"");
    }

    let parts: Vec<String> = text
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Double-quoted CSS string, e.g. for `[id="…"]` attribute selectors.
pub fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\a "),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
