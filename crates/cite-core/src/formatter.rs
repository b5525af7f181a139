//! HTML for markers and reference list items.

use crate::error::{CiteError, CiteErrorKind, format_error};
use crate::labels::{LabelTables, numeric_backlink_label};
use crate::messages::Messages;
use crate::sanitize::{IdMode, IdSanitizer};
use crate::stack::{Entry, NamedEntry, Recorded};
use crate::util::escape_html;

/// Anchor ids and hrefs built from the message table's prefixes.
pub(crate) struct Anchors<'a> {
    messages: &'a dyn Messages,
    sanitizer: &'a dyn IdSanitizer,
}

impl<'a> Anchors<'a> {
    pub fn new(messages: &'a dyn Messages, sanitizer: &'a dyn IdSanitizer) -> Self {
        Self {
            messages,
            sanitizer,
        }
    }

    /// `cite_ref-<key>` or `cite_ref-<key>_<num>`.
    fn marker_name(&self, key: &str, num: Option<&str>) -> String {
        let prefix = self.messages.message("cite_reference_link_prefix", &[]);
        let suffix = self.messages.message("cite_reference_link_suffix", &[]);
        let key = match num {
            Some(num) => self
                .messages
                .message("cite_reference_link_key_with_num", &[key, num]),
            None => key.to_owned(),
        };
        format!("{prefix}{key}{suffix}")
    }

    /// `cite_note-<key>`.
    fn note_name(&self, key: &str) -> String {
        let prefix = self.messages.message("cite_references_link_prefix", &[]);
        let suffix = self.messages.message("cite_references_link_suffix", &[]);
        format!("{prefix}{key}{suffix}")
    }

    pub fn marker_id(&self, key: &str, num: Option<&str>) -> String {
        self.sanitizer
            .normalize_id(&self.marker_name(key, num), IdMode::Attribute)
    }

    pub fn marker_href(&self, key: &str, num: Option<&str>) -> String {
        self.sanitizer
            .normalize_id(&self.marker_name(key, num), IdMode::Fragment)
    }

    pub fn note_id(&self, key: &str) -> String {
        self.sanitizer
            .normalize_id(&self.note_name(key), IdMode::Attribute)
    }

    pub fn note_href(&self, key: &str) -> String {
        self.sanitizer
            .normalize_id(&self.note_name(key), IdMode::Fragment)
    }
}

/// Formats markers and reference lists for one registry.
pub(crate) struct Formatter<'a> {
    messages: &'a dyn Messages,
    anchors: Anchors<'a>,
    labels: &'a mut LabelTables,
    preview: bool,
}

impl<'a> Formatter<'a> {
    pub fn new(
        messages: &'a dyn Messages,
        sanitizer: &'a dyn IdSanitizer,
        labels: &'a mut LabelTables,
        preview: bool,
    ) -> Self {
        Self {
            messages,
            anchors: Anchors::new(messages, sanitizer),
            labels,
            preview,
        }
    }

    /// The inline link left where a marker was written.
    pub fn marker_link(&mut self, group: &str, recorded: &Recorded) -> String {
        match recorded {
            Recorded::Continuation => String::new(),
            Recorded::Anonymous { order, number } => {
                let order = order.to_string();
                self.link(group, &order, None, &order, *number)
            }
            Recorded::Named {
                key,
                order,
                use_index,
                number,
            } => self.link(
                group,
                key,
                Some(&format!("{order}-{use_index}")),
                &format!("{key}-{order}"),
                *number,
            ),
        }
    }

    fn link(
        &mut self,
        group: &str,
        marker_key: &str,
        num: Option<&str>,
        note_key: &str,
        number: usize,
    ) -> String {
        let label = match self.labels.link_label(self.messages, group, number) {
            Ok(label) => escape_html(&label),
            Err(error) => format_error(self.messages, &error),
        };
        self.messages.message(
            "cite_reference_link",
            &[
                &self.anchors.marker_id(marker_key, num),
                &self.anchors.note_href(note_key),
                &label,
            ],
        )
    }

    /// `prefix`, one line per entry, `suffix`.
    pub fn reference_list(&mut self, entries: &[Entry]) -> String {
        let items: Vec<String> = entries.iter().map(|entry| self.item(entry)).collect();
        format!(
            "{}\n{}\n{}",
            self.messages.message("cite_references_prefix", &[]),
            items.join("\n"),
            self.messages.message("cite_references_suffix", &[]),
        )
    }

    fn item(&mut self, entry: &Entry) -> String {
        match entry {
            Entry::Continuation { follow, text, .. } => self.messages.message(
                "cite_references_no_link",
                &[
                    &self.anchors.note_id(follow),
                    &self.reference_text(follow, Some(text.as_str())),
                ],
            ),
            Entry::Anonymous { text, order, .. } => {
                let order = order.to_string();
                self.messages.message(
                    "cite_references_link_one",
                    &[
                        &self.anchors.note_id(&order),
                        &self.anchors.marker_href(&order, None),
                        &self.reference_text(&order, Some(text.as_str())),
                    ],
                )
            }
            Entry::Named(named) if named.uses == 0 => {
                let NamedEntry { key, order, .. } = named;
                self.messages.message(
                    "cite_references_link_one",
                    &[
                        &self.anchors.note_id(&format!("{key}-{order}")),
                        &self.anchors.marker_href(key, Some(&format!("{order}-0"))),
                        &self.reference_text(key, named.text.as_deref()),
                    ],
                )
            }
            Entry::Named(named) => self.multi_use_item(named),
        }
    }

    /// One back-link per use, `1.1`, `1.2`, ... for the numeric label.
    fn multi_use_item(&mut self, named: &NamedEntry) -> String {
        let NamedEntry {
            key,
            order,
            uses,
            number,
            ..
        } = named;
        let max = uses + 1;

        let mut backlinks = Vec::with_capacity(max);
        for index in 0..=*uses {
            let custom = match self.labels.backlink_label(self.messages, index) {
                Ok(label) => label,
                Err(error) => format_error(self.messages, &error),
            };
            backlinks.push(self.messages.message(
                "cite_references_link_many_format",
                &[
                    &self.anchors.marker_href(key, Some(&format!("{order}-{index}"))),
                    &numeric_backlink_label(self.messages, *number, index + 1, max),
                    &custom,
                ],
            ));
        }

        self.messages.message(
            "cite_references_link_many",
            &[
                &self.anchors.note_id(&format!("{key}-{order}")),
                &self.messages.list_to_text(&backlinks),
                &self.reference_text(key, named.text.as_deref()),
            ],
        )
    }

    fn reference_text(&self, key: &str, text: Option<&str>) -> String {
        match text.map(|t| t.trim_end_matches('\n')) {
            Some(text) if !text.is_empty() => {
                format!("<span class=\"reference-text\">{text}</span>\n")
            }
            _ => {
                let kind = if self.preview {
                    CiteErrorKind::MissingReferenceTextPreview
                } else {
                    CiteErrorKind::MissingReferenceText
                };
                format_error(
                    self.messages,
                    &CiteError::new(kind).with_param(key).raw(),
                )
            }
        }
    }
}

/// Wrap a rendered list in the responsive container.
pub(crate) fn responsive_wrapper(list: &str, entry_count: usize, columns_threshold: usize) -> String {
    let class = if entry_count > columns_threshold {
        "cite-references-wrap cite-references-columns"
    } else {
        "cite-references-wrap"
    };
    format!("<div class=\"{class}\">{list}</div>")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::messages::EnglishMessages;
    use crate::sanitize::Html5IdSanitizer;
    use crate::stack::ReferenceStack;

    fn plain_messages() -> EnglishMessages {
        EnglishMessages::new()
            .with_override("cite_references_link_many_sep", ", ")
            .with_override("cite_references_link_many_and", " and ")
    }

    #[test]
    fn test_anchor_names() {
        let messages = EnglishMessages::new();
        let anchors = Anchors::new(&messages, &Html5IdSanitizer);

        assert_eq!(anchors.marker_id("3", None), "cite_ref-3");
        assert_eq!(anchors.marker_id("smith", Some("2-1")), "cite_ref-smith_2-1");
        assert_eq!(anchors.note_id("smith-2"), "cite_note-smith-2");
        assert_eq!(anchors.note_href("café-1"), "cite_note-caf%C3%A9-1");
    }

    #[test]
    fn test_anchor_prefix_override() {
        let messages = EnglishMessages::new()
            .with_override("cite_reference_link_prefix", "ref-")
            .with_override("cite_references_link_prefix", "note-")
            .with_override("cite_reference_link_key_with_num", "$1.$2");
        let anchors = Anchors::new(&messages, &Html5IdSanitizer);

        assert_eq!(anchors.marker_id("a", Some("1-0")), "ref-a.1-0");
        assert_eq!(anchors.note_id("a-1"), "note-a-1");
    }

    #[test]
    fn test_marker_links() {
        let messages = EnglishMessages::new();
        let mut labels = LabelTables::default();
        let mut formatter = Formatter::new(&messages, &Html5IdSanitizer, &mut labels, false);

        let anonymous = formatter.marker_link("", &Recorded::Anonymous { order: 1, number: 1 });
        assert_eq!(
            anonymous,
            r##"<sup id="cite_ref-1" class="reference"><a href="#cite_note-1">[1]</a></sup>"##
        );

        let named = formatter.marker_link(
            "note",
            &Recorded::Named {
                key: "x".to_owned(),
                order: 2,
                use_index: 1,
                number: 3,
            },
        );
        assert_eq!(
            named,
            r##"<sup id="cite_ref-x_2-1" class="reference"><a href="#cite_note-x-2">[note 3]</a></sup>"##
        );

        assert_eq!(formatter.marker_link("", &Recorded::Continuation), "");
    }

    #[test]
    fn test_marker_link_label_exhausted() {
        let messages = EnglishMessages::new().with_override("cite_link_label_group-short", "α");
        let mut labels = LabelTables::default();
        let mut formatter = Formatter::new(&messages, &Html5IdSanitizer, &mut labels, false);

        let recorded = |number| Recorded::Named {
            key: "k".to_owned(),
            order: number,
            use_index: 0,
            number,
        };
        assert!(formatter.marker_link("short", &recorded(1)).contains("[α]"));

        let exhausted = formatter.marker_link("short", &recorded(2));
        assert!(exhausted.contains("cite-error"));
        assert!(exhausted.contains("<code>short</code>"));
    }

    #[test]
    fn test_single_use_list() {
        let messages = EnglishMessages::new();
        let mut labels = LabelTables::default();
        let mut stack = ReferenceStack::default();
        stack.record(Some("Anon."), None, "", None).unwrap();
        stack.record(Some("Named."), Some("n"), "", None).unwrap();

        let mut formatter = Formatter::new(&messages, &Html5IdSanitizer, &mut labels, false);
        let list = formatter.reference_list(stack.entries(""));

        assert_eq!(
            list,
            concat!(
                "<ol class=\"references\">\n",
                "<li id=\"cite_note-1\"><span class=\"cite-backlink\"><a href=\"#cite_ref-1\">↑</a></span> ",
                "<span class=\"reference-text\">Anon.</span>\n</li>\n",
                "<li id=\"cite_note-n-2\"><span class=\"cite-backlink\"><a href=\"#cite_ref-n_2-0\">↑</a></span> ",
                "<span class=\"reference-text\">Named.</span>\n</li>\n",
                "</ol>"
            )
        );
    }

    #[test]
    fn test_multi_use_item() {
        let messages = plain_messages();
        let mut labels = LabelTables::default();
        let mut stack = ReferenceStack::default();
        stack.record(Some("A"), Some("x"), "", None).unwrap();
        stack.record(Some("A2"), Some("x"), "", None).unwrap();

        let mut formatter = Formatter::new(&messages, &Html5IdSanitizer, &mut labels, false);
        let list = formatter.reference_list(stack.entries(""));

        assert!(list.contains(r#"<li id="cite_note-x-1">"#));
        assert!(list.contains(
            r##"<sup><a href="#cite_ref-x_1-0">1.1</a></sup> and <sup><a href="#cite_ref-x_1-1">1.2</a></sup>"##
        ));
        assert!(list.contains(r#"<span class="reference-text">A</span>"#));
        assert!(!list.contains("A2"));
    }

    #[test]
    fn test_custom_backlink_labels() {
        let messages = plain_messages()
            .with_override("cite_references_link_many_format", "$3")
            .with_override("cite_references_link_many_format_backlink_labels", "x y");
        let mut labels = LabelTables::default();
        let mut stack = ReferenceStack::default();
        for _ in 0..3 {
            stack.record(Some("A"), Some("k"), "", None).unwrap();
        }

        let mut formatter = Formatter::new(&messages, &Html5IdSanitizer, &mut labels, false);
        let list = formatter.reference_list(stack.entries(""));

        assert!(list.contains("x, y and <strong class=\"error cite-error\">"));
    }

    #[test]
    fn test_missing_text() {
        let messages = EnglishMessages::new();
        let mut labels = LabelTables::default();
        let mut stack = ReferenceStack::default();
        stack.record(None, Some("y"), "", None).unwrap();

        let mut formatter = Formatter::new(&messages, &Html5IdSanitizer, &mut labels, false);
        let list = formatter.reference_list(stack.entries(""));
        assert!(list.contains(r##"<a href="#cite_ref-y_1-0">"##));
        assert!(list.contains("no text was provided for citation named <code>y</code>"));

        let mut formatter = Formatter::new(&messages, &Html5IdSanitizer, &mut labels, true);
        let list = formatter.reference_list(stack.entries(""));
        assert!(list.contains("cite-warning"));
    }

    #[test]
    fn test_orphan_continuation() {
        let messages = EnglishMessages::new();
        let mut labels = LabelTables::default();
        let mut stack = ReferenceStack::default();
        stack.record(Some("Tail."), None, "", Some("gone")).unwrap();

        let mut formatter = Formatter::new(&messages, &Html5IdSanitizer, &mut labels, false);
        let list = formatter.reference_list(stack.entries(""));

        assert!(list.contains(
            "<p id=\"cite_note-gone\"><span class=\"reference-text\">Tail.</span>\n</p>"
        ));
    }

    #[test]
    fn test_responsive_wrapper() {
        assert_eq!(
            responsive_wrapper("<ol></ol>", 3, 10),
            r#"<div class="cite-references-wrap"><ol></ol></div>"#
        );
        assert_eq!(
            responsive_wrapper("<ol></ol>", 11, 10),
            r#"<div class="cite-references-wrap cite-references-columns"><ol></ol></div>"#
        );
    }
}
