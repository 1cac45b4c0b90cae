use serde_json::{Map, Value};

use crate::validation::RequestInput;

/// Trim and HTML-escape every top-level string in the body and query maps.
///
/// Path parameters are left alone; they are matched against the router and
/// validated as identifiers.
pub fn sanitize_input(input: &mut RequestInput) {
    sanitize_map(&mut input.body);
    sanitize_map(&mut input.query);
}

/// Non-string values pass through untouched.
pub fn sanitize_map(map: &mut Map<String, Value>) {
    for value in map.values_mut() {
        if let Value::String(s) = value {
            *s = escape_html(s.trim());
        }
    }
}

/// Encode the characters that can open a tag or break out of an attribute.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
