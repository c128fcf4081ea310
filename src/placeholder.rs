//! Centralized placeholder scanning and substitution.
//!
//! Two syntaxes exist. Argument and env values carry explicit
//! `${input:<id>}` tokens, with an escaped form `\${input:<id>}` that is not
//! a placeholder and always renders as the unescaped literal. Remote header
//! templates additionally carry bare `{var}` / `${var}` tokens, which are
//! rewritten into the explicit form before compilation so that the rest of
//! the pipeline only ever deals with `${input:<id>}`.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn input_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\\)?\$\{input:([A-Za-z0-9_.\-]+)\}").unwrap())
}

fn header_var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // ${var} must be tried before {var} so the dollar form wins
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z0-9_.\-:]+)\}|\{([A-Za-z0-9_.\-]+)\}").unwrap())
}

/// Render the explicit placeholder token for an input id.
pub fn input_token(id: &str) -> String {
    format!("${{input:{id}}}")
}

/// Ids referenced by `${input:id}` tokens, in order of first appearance.
/// Escaped tokens (`\${input:id}`) are not placeholders and are skipped.
pub fn scan_input_tokens(text: &str) -> Vec<String> {
    let mut ids = Vec::new();
    for caps in input_token_re().captures_iter(text) {
        if caps.get(1).is_some() {
            continue;
        }
        let id = &caps[2];
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

/// Rewrite bare `{var}` / `${var}` header-template tokens into explicit
/// `${input:var}` tokens. Tokens already in explicit form pass through.
pub fn rewrite_header_vars(template: &str) -> String {
    header_var_re()
        .replace_all(template, |caps: &Captures| {
            let var = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or("");
            match var.strip_prefix("input:") {
                Some(id) => input_token(id),
                None => input_token(var),
            }
        })
        .into_owned()
}

/// Substitute `${input:id}` tokens using `resolve`. Unresolved ids are left
/// intact; escaped tokens always emit the unescaped literal, since the escape
/// is internal-only and external consumers never see it.
pub fn substitute_input_tokens<F>(text: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    input_token_re()
        .replace_all(text, |caps: &Captures| {
            let id = &caps[2];
            if caps.get(1).is_some() {
                return input_token(id);
            }
            resolve(id).unwrap_or_else(|| input_token(id))
        })
        .into_owned()
}

/// Derive a fallback input id from a field name: strip leading dashes,
/// replace every non-alphanumeric character with `_`.
pub fn sanitize_id(raw: &str) -> String {
    raw.trim_start_matches('-')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_collects_in_order_and_dedupes() {
        let ids = scan_input_tokens("${input:b} x ${input:a} y ${input:b}");
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_scan_skips_escaped_tokens() {
        let ids = scan_input_tokens(r"\${input:literal} ${input:real}");
        assert_eq!(ids, vec!["real"]);
    }

    #[test]
    fn test_rewrite_header_vars_both_syntaxes() {
        assert_eq!(
            rewrite_header_vars("Bearer {token}"),
            "Bearer ${input:token}"
        );
        assert_eq!(
            rewrite_header_vars("Basic ${cred}"),
            "Basic ${input:cred}"
        );
    }

    #[test]
    fn test_rewrite_preserves_explicit_tokens() {
        assert_eq!(
            rewrite_header_vars("Bearer ${input:token}"),
            "Bearer ${input:token}"
        );
    }

    #[test]
    fn test_substitute_resolves_and_unescapes() {
        let out = substitute_input_tokens(r"k=${input:key} lit=\${input:key}", |id| {
            (id == "key").then(|| "s3cret".to_string())
        });
        assert_eq!(out, "k=s3cret lit=${input:key}");
    }

    #[test]
    fn test_substitute_leaves_unknown_ids() {
        let out = substitute_input_tokens("${input:missing}", |_| None);
        assert_eq!(out, "${input:missing}");
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("--api-key"), "api_key");
        assert_eq!(sanitize_id("GITHUB_TOKEN"), "GITHUB_TOKEN");
        assert_eq!(sanitize_id("weird name!"), "weird_name_");
    }
}
