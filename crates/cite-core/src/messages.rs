//! Localized message templates.
//!
//! Every user-visible string (anchor prefixes, link and list templates,
//! error texts and label tables) comes from a [`Messages`] table so a
//! site can re-skin the output without touching code. Templates use
//! positional parameters `$1`, `$2`, ...

use std::borrow::Cow;
use std::collections::HashMap;

/// Lookup and substitution of message templates.
pub trait Messages: Send + Sync {
    /// Raw template for `key`, if the table defines one.
    fn template(&self, key: &str) -> Option<Cow<'_, str>>;

    /// Whether the table defines `key`.
    fn exists(&self, key: &str) -> bool {
        self.template(key).is_some()
    }

    /// Localize a number already rendered in ASCII digits.
    ///
    /// The default keeps the digits unchanged.
    fn format_number(&self, number: &str) -> String {
        number.to_owned()
    }

    /// Template for `key` with `$n` replaced by `args[n - 1]`.
    ///
    /// An undefined key renders as `⧼key⧽` so the gap is visible.
    fn message(&self, key: &str, args: &[&str]) -> String {
        match self.template(key) {
            Some(template) => substitute(&template, args),
            None => format!("⧼{key}⧽"),
        }
    }

    /// Join items into a human-readable list: `a, b and c`.
    fn list_to_text(&self, items: &[String]) -> String {
        match items {
            [] => String::new(),
            [only] => only.clone(),
            [head @ .., last] => {
                let sep = self.message("cite_references_link_many_sep", &[]);
                let and = self.message("cite_references_link_many_and", &[]);
                format!("{}{and}{last}", head.join(&sep))
            }
        }
    }
}

/// Replace `$1`..`$n` in a single left-to-right pass.
///
/// Substituted text is never rescanned, so arguments containing `$2`
/// stay literal. Parameters without an argument are left as written.
#[must_use]
pub fn substitute(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        let arg = after[..digits]
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| args.get(i));

        match arg {
            Some(arg) => {
                out.push_str(arg);
                rest = &after[digits..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// English message table.
///
/// Defaults cover every key the engine uses. Overrides replace or add
/// individual templates, including `cite_link_label_group-<group>`
/// label tables.
#[derive(Clone, Debug)]
pub struct EnglishMessages {
    templates: HashMap<String, String>,
}

impl Default for EnglishMessages {
    fn default() -> Self {
        Self::new()
    }
}

impl EnglishMessages {
    #[must_use]
    pub fn new() -> Self {
        let mut templates: HashMap<String, String> = DEFAULTS
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        templates.insert(
            "cite_references_link_many_format_backlink_labels".to_owned(),
            default_backlink_labels(),
        );
        templates.insert(
            "cite_link_label_group-lower-alpha".to_owned(),
            alpha_labels(false),
        );
        templates.insert(
            "cite_link_label_group-upper-alpha".to_owned(),
            alpha_labels(true),
        );
        Self { templates }
    }

    /// Replace or add a single template.
    #[must_use]
    pub fn with_override(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(key.into(), template.into());
        self
    }

    /// Replace or add several templates.
    #[must_use]
    pub fn with_overrides<K, V>(mut self, overrides: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.templates
            .extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

impl Messages for EnglishMessages {
    fn template(&self, key: &str) -> Option<Cow<'_, str>> {
        self.templates.get(key).map(|t| Cow::Borrowed(t.as_str()))
    }
}

/// `a b ... z aa ab ... zz`
fn default_backlink_labels() -> String {
    let letters = || b'a'..=b'z';
    let mut labels: Vec<String> = letters().map(|c| char::from(c).to_string()).collect();
    for first in letters() {
        for second in letters() {
            labels.push(format!("{}{}", char::from(first), char::from(second)));
        }
    }
    labels.join(" ")
}

fn alpha_labels(upper: bool) -> String {
    let mut labels = String::new();
    for c in b'a'..=b'z' {
        let c = if upper { c.to_ascii_uppercase() } else { c };
        if !labels.is_empty() {
            labels.push(' ');
        }
        labels.push(char::from(c));
    }
    labels
}

const DEFAULTS: &[(&str, &str)] = &[
    ("cite_error", "Cite error: $1"),
    ("cite_warning", "Cite warning: $1"),
    // Anchors
    ("cite_reference_link_key_with_num", "$1_$2"),
    ("cite_reference_link_prefix", "cite_ref-"),
    ("cite_reference_link_suffix", ""),
    ("cite_references_link_prefix", "cite_note-"),
    ("cite_references_link_suffix", ""),
    // Markers and list items
    (
        "cite_reference_link",
        r##"<sup id="$1" class="reference"><a href="#$2">[$3]</a></sup>"##,
    ),
    ("cite_references_no_link", r#"<p id="$1">$2</p>"#),
    (
        "cite_references_link_one",
        r##"<li id="$1"><span class="cite-backlink"><a href="#$2">↑</a></span> $3</li>"##,
    ),
    (
        "cite_references_link_many",
        r#"<li id="$1"><span class="cite-backlink">↑ $2</span> $3</li>"#,
    ),
    (
        "cite_references_link_many_format",
        r##"<sup><a href="#$1">$2</a></sup>"##,
    ),
    ("cite_references_link_many_sep", " "),
    ("cite_references_link_many_and", " "),
    ("cite_references_prefix", r#"<ol class="references">"#),
    ("cite_references_suffix", "</ol>"),
    // Errors
    (
        "cite_error_ref_no_input",
        "Invalid citation marker; citations with no name must have content",
    ),
    (
        "cite_error_ref_too_many_keys",
        "Invalid citation marker; a citation cannot have both a name and a follow target",
    ),
    (
        "cite_error_ref_numeric_key",
        "Invalid citation marker; name cannot be a simple integer. Use a descriptive title",
    ),
    (
        "cite_error_included_ref",
        "Invalid citation marker; it contains another citation marker, most likely an unterminated one",
    ),
    (
        "cite_error_references_group_mismatch",
        "Citation in the reference list has conflicting group attribute <code>$1</code>",
    ),
    (
        "cite_error_empty_references_define",
        "Citation <code>$1</code> defined in the reference list has no content",
    ),
    (
        "cite_error_references_no_key",
        "Citation defined in the reference list has no name attribute",
    ),
    (
        "cite_error_references_missing_key",
        "Citation with name <code>$1</code> defined in the reference list is not used in prior text",
    ),
    (
        "cite_error_references_missing_group",
        "Citation defined in the reference list has group attribute <code>$1</code> which does not appear in prior text",
    ),
    (
        "cite_error_groups_disabled",
        "The <code>group</code> attribute (<code>$1</code>) is not enabled on this site",
    ),
    (
        "cite_error_ref_invalid_attribute",
        "Invalid citation marker; unknown attribute <code>$1</code>. Use <code>name</code>, <code>group</code> or <code>follow</code>",
    ),
    (
        "cite_error_references_no_text",
        "Invalid citation marker; no text was provided for citation named <code>$1</code>",
    ),
    (
        "cite_warning_sectionpreview_no_text",
        "Citation <code>$1</code> has no text in this section preview",
    ),
    (
        "cite_error_references_no_backlink_label",
        "Ran out of custom back-link labels. Define more in the <code>cite_references_link_many_format_backlink_labels</code> message",
    ),
    (
        "cite_error_no_link_label_group",
        "Ran out of custom link labels for group <code>$1</code>. Define more in the <code>$2</code> message",
    ),
    (
        "cite_error_group_refs_without_references",
        "Citation markers exist for a group named <code>$1</code>, but no corresponding reference list was found",
    ),
    (
        "cite_error_refs_without_references",
        "Citation markers exist, but no reference list was found",
    ),
    (
        "cite_error_references_invalid_parameters",
        "Invalid reference list; unknown attribute <code>$1</code>. Use <code>group</code> or <code>responsive</code>",
    ),
];

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_substitute() {
        assert_eq!(substitute("$1_$2", &["a", "b"]), "a_b");
        assert_eq!(substitute("[$3]", &["x", "y", "z"]), "[z]");
        assert_eq!(substitute("no params", &["x"]), "no params");
    }

    #[test]
    fn test_substitute_does_not_rescan_arguments() {
        assert_eq!(substitute("$1 $2", &["$2", "b"]), "$2 b");
    }

    #[test]
    fn test_substitute_missing_argument_left_as_written() {
        assert_eq!(substitute("$1 and $2", &["a"]), "a and $2");
        assert_eq!(substitute("cost: $", &[]), "cost: $");
        assert_eq!(substitute("$0", &["a"]), "$0");
    }

    #[test]
    fn test_substitute_multi_digit() {
        let args: Vec<String> = (1..=12).map(|n| format!("v{n}")).collect();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        assert_eq!(substitute("$12/$1", &args), "v12/v1");
    }

    #[test]
    fn test_message_undefined_key() {
        let messages = EnglishMessages::new();
        assert_eq!(messages.message("no_such_key", &[]), "⧼no_such_key⧽");
        assert!(!messages.exists("no_such_key"));
    }

    #[test]
    fn test_override() {
        let messages = EnglishMessages::new()
            .with_override("cite_reference_link_prefix", "ref-")
            .with_overrides([("cite_link_label_group-greek", "α β γ")]);

        assert_eq!(messages.message("cite_reference_link_prefix", &[]), "ref-");
        assert!(messages.exists("cite_link_label_group-greek"));
    }

    #[test]
    fn test_list_to_text() {
        let messages = EnglishMessages::new()
            .with_override("cite_references_link_many_sep", ", ")
            .with_override("cite_references_link_many_and", " and ");
        let items = |v: &[&str]| v.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>();

        assert_eq!(messages.list_to_text(&[]), "");
        assert_eq!(messages.list_to_text(&items(&["a"])), "a");
        assert_eq!(messages.list_to_text(&items(&["a", "b"])), "a and b");
        assert_eq!(messages.list_to_text(&items(&["a", "b", "c"])), "a, b and c");
    }

    #[test]
    fn test_default_backlink_labels() {
        let labels = default_backlink_labels();
        let labels: Vec<&str> = labels.split(' ').collect();

        assert_eq!(labels.len(), 26 + 26 * 26);
        assert_eq!(labels[0], "a");
        assert_eq!(labels[25], "z");
        assert_eq!(labels[26], "aa");
        assert_eq!(labels.last(), Some(&"zz"));
    }

    #[test]
    fn test_alpha_group_labels() {
        let messages = EnglishMessages::new();
        let upper = messages.message("cite_link_label_group-upper-alpha", &[]);
        assert!(upper.starts_with("A B C"));
        assert!(upper.ends_with('Z'));
    }

    #[test]
    fn test_format_number_identity() {
        assert_eq!(EnglishMessages::new().format_number("1.05"), "1.05");
    }
}
