//! `[% name %]` template rendering.
//!
//! Rendering is pure text substitution over a [`VarLookup`]. It never runs
//! anything; `from-command` variables were already resolved by then.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::vars::VarLookup;

/// Open delimiter, optional whitespace, identifier, optional whitespace, close delimiter.
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[%\s*([A-Za-z_][A-Za-z0-9_]*)\s*%\]").expect("placeholder pattern is valid"));

/// Render a template against `vars`.
///
/// Unknown names, undefined variables, and list variables all render as
/// empty text.
pub fn render(template: &str, vars: &impl VarLookup) -> String {
    if template.is_empty() {
        return String::new();
    }

    PLACEHOLDER
        .replace_all(template, |caps: &Captures| vars.scalar(&caps[1]).unwrap_or_default().to_string())
        .into_owned()
}

/// Names referenced by a template, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER.captures_iter(template).filter_map(|caps| caps.get(1)).map(|m| m.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v2::vars::{ResolvedVar, VarRegistry};

    fn registry() -> VarRegistry {
        let mut registry = VarRegistry::new();
        registry.insert("x", ResolvedVar::scalar("hi there"));
        registry.insert("global_string", ResolvedVar::scalar("foobar"));
        registry.insert("int_var", ResolvedVar::scalar("3"));
        registry.insert("items", ResolvedVar::list(["a", "b"]));
        registry
    }

    #[test]
    fn test_render_scalar() {
        assert_eq!(render("[% x %]", &registry()), "hi there");
        assert_eq!(render("echo \"[%x%]\"", &registry()), "echo \"hi there\"");
    }

    #[test]
    fn test_render_several() {
        let out = render("echo \"[% global_string %] [%x%]-[%int_var%]\"", &registry());
        assert_eq!(out, "echo \"foobar hi there-3\"");
    }

    #[test]
    fn test_unknown_and_list_render_empty() {
        assert_eq!(render("<[% missing %]>", &registry()), "<>");
        assert_eq!(render("<[% items %]>", &registry()), "<>");
    }

    #[test]
    fn test_empty_template() {
        assert_eq!(render("", &registry()), "");
    }

    #[test]
    fn test_text_without_placeholders_is_untouched() {
        let text = "echo $(pwd) [%% not a name %] % ]";
        assert_eq!(render(text, &registry()), text);
    }

    #[test]
    fn test_render_overlay() {
        let registry = registry();
        let overlay = registry.overlay(1, "two");

        assert_eq!(render("echo [% index %] [% var %] [% x %]", &overlay), "echo 1 two hi there");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("[% a %] and [%b%] and [% a %]"), vec!["a", "b", "a"]);
        assert!(placeholders("plain").is_empty());
    }
}
