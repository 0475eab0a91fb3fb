//! `{placeholder}` scanning shared by the code generator and the receipt
//! renderer.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("placeholder pattern must compile"));

/// Replaces every `{...}` in one pass. Keys are trimmed before lookup and
/// keys the resolver does not know become empty strings. Values are
/// inserted verbatim and never rescanned.
pub fn fill<'a, F>(template: &'a str, mut resolve: F) -> Cow<'a, str>
where
    F: FnMut(&str) -> Option<String>,
{
    PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        resolve(caps[1].trim()).unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_become_empty() {
        let out = fill("*555*{a}*{b}#", |key| (key == "a").then(|| "1".to_string()));
        assert_eq!(out, "*555*1*#");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let out = fill("{a}{b}", |key| match key {
            "a" => Some("{b}".to_string()),
            "b" => Some("x".to_string()),
            _ => None,
        });
        assert_eq!(out, "{b}x");
    }

    #[test]
    fn any_braced_name_is_a_placeholder() {
        let out = fill("[{ not a key }][{Nro. Factura}][{ a }]", |key| {
            (key == "a").then(|| "1".to_string())
        });
        assert_eq!(out, "[][][1]");
    }

    #[test]
    fn unbalanced_braces_are_left_alone() {
        assert_eq!(fill("{}{{a}", |_| Some("x".to_string())), "{}{x");
    }
}
