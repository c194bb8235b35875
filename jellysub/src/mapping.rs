use regex::Regex;
use tracing::debug;

use crate::config::PathMapping;
use crate::error::{Error, Result};

/// Rewrite a source-filesystem path into a target-filesystem path using the
/// ordered rule list. The first matching rule wins; no matching rule is an
/// error so callers never transcribe an unmapped path.
pub fn map_path(input: &str, rules: &[PathMapping]) -> Result<String> {
    for rule in rules {
        if rule.regex {
            let pattern =
                Regex::new(&rule.source).map_err(|e| Error::InvalidMappingPattern {
                    pattern: rule.source.clone(),
                    source: e,
                })?;
            if pattern.is_match(input) {
                let mapped = pattern.replace_all(input, rule.target.as_str()).into_owned();
                let mapped = normalize_separators(mapped, &rule.target);
                debug!(%input, %mapped, pattern = %rule.source, "regex mapping applied");
                return Ok(mapped);
            }
        } else if let Some(rest) = input.strip_prefix(rule.source.as_str()) {
            let mapped = join_target(&rule.target, rest);
            debug!(%input, %mapped, prefix = %rule.source, "prefix mapping applied");
            return Ok(mapped);
        }
    }

    Err(Error::NoMappingRule {
        path: input.to_string(),
    })
}

/// Whether a mapping target implies Windows-style paths (backslash separator).
fn windows_style(target: &str) -> bool {
    target.contains('\\') || target.as_bytes().get(1) == Some(&b':')
}

/// Join the remainder of a prefix match onto the target, using the separator
/// convention the target implies.
fn join_target(target: &str, rest: &str) -> String {
    let rest = rest.trim_start_matches(['/', '\\']);
    if rest.is_empty() {
        return target.to_string();
    }

    if windows_style(target) {
        let rest = rest.replace('/', "\\");
        if target.ends_with('\\') {
            format!("{target}{rest}")
        } else {
            format!("{target}\\{rest}")
        }
    } else if target.ends_with('/') || target.is_empty() {
        format!("{target}{rest}")
    } else {
        format!("{target}/{rest}")
    }
}

/// Separator normalization for regex rules, after substitution.
fn normalize_separators(mapped: String, target: &str) -> String {
    if windows_style(target) {
        mapped.replace('/', "\\")
    } else {
        mapped
    }
}
