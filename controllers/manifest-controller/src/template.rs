//! Manifest templating
//!
//! Substitutes `${NAME}` placeholders before the manifest is parsed.

use std::collections::BTreeMap;

/// Render `${NAME}` placeholders from `vars`.
///
/// Names are ASCII letters, digits and underscores. Unknown names render as
/// the empty string. Anything else, including an unterminated `${`, is copied
/// through unchanged.
pub fn render(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if is_name(&after[..end]) => {
                if let Some(value) = vars.get(&after[..end]) {
                    out.push_str(value);
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push_str("${");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
