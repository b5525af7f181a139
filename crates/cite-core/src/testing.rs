//! Scripted host parser for engine tests.
//!
//! Understands `<ref attr="v">text</ref>`, `<ref attr="v"/>`,
//! `<references attr="v">body</references>` and `<references/>`.
//! Everything else passes through unchanged.

use std::sync::LazyLock;

use regex::Regex;

use crate::Cite;
use crate::host::{Attributes, MarkerKind, Parser};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<references((?:\s+[a-z]+="[^"]*")*)\s*(?:/>|>(.*?)</references>)|<ref((?:\s+[a-z]+="[^"]*")*)\s*(?:/>|>(.*?)</ref>)"#,
    )
    .unwrap()
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"([a-z]+)="([^"]*)""#).unwrap());

static OPENING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<ref\b").unwrap());

pub(crate) struct TestParser {
    pub page: String,
    pub preview: bool,
    pub reject_fragments: bool,
    pub deserialized: usize,
}

impl Default for TestParser {
    fn default() -> Self {
        Self {
            page: "test".to_owned(),
            preview: false,
            reject_fragments: false,
            deserialized: 0,
        }
    }
}

struct Call {
    start: usize,
    end: usize,
    kind: MarkerKind,
    content: Option<String>,
    attrs: Attributes,
}

fn parse_attrs(raw: &str) -> Attributes {
    ATTR_RE
        .captures_iter(raw)
        .map(|c| (c[1].to_owned(), c[2].to_owned()))
        .collect()
}

impl Parser for TestParser {
    fn reparse(&mut self, text: &str, cite: &mut Cite) -> String {
        let calls: Vec<Call> = TAG_RE
            .captures_iter(text)
            .map(|c| {
                let whole = c.get(0).unwrap();
                let (kind, attrs, content) = if c.get(1).is_some() {
                    (MarkerKind::References, c.get(1), c.get(2))
                } else {
                    (MarkerKind::Citation, c.get(3), c.get(4))
                };
                Call {
                    start: whole.start(),
                    end: whole.end(),
                    kind,
                    content: content.map(|m| m.as_str().to_owned()),
                    attrs: attrs.map(|m| parse_attrs(m.as_str())).unwrap_or_default(),
                }
            })
            .collect();

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for call in calls {
            out.push_str(&text[last..call.start]);
            let rendered = match call.kind {
                MarkerKind::Citation => cite
                    .cite(call.content.as_deref(), &call.attrs, self)
                    .unwrap_or_else(|e| format!("!{e}")),
                MarkerKind::References => cite.references(call.content.as_deref(), &call.attrs, self),
            };
            out.push_str(&rendered);
            last = call.end;
        }
        out.push_str(&text[last..]);
        out
    }

    fn page_id(&self) -> &str {
        &self.page
    }

    fn is_section_preview(&self) -> bool {
        self.preview
    }

    fn literal(&self, kind: MarkerKind, content: Option<&str>, attrs: &Attributes) -> String {
        let name = match kind {
            MarkerKind::Citation => "ref",
            MarkerKind::References => "references",
        };
        let attrs: String = attrs.iter().map(|(k, v)| format!(" {k}=\"{v}\"")).collect();
        match content {
            Some(content) => format!("<{name}{attrs}>{content}</{name}>"),
            None => format!("<{name}{attrs}/>"),
        }
    }

    fn contains_marker_opening(&self, text: &str) -> bool {
        OPENING_RE.is_match(text)
    }

    fn deserialize_fragment(&mut self, blob: &[u8]) -> Option<String> {
        self.deserialized += 1;
        String::from_utf8(blob.to_vec()).ok()
    }

    fn is_valid_fragment(&self, blob: &[u8]) -> bool {
        !self.reject_fragments && std::str::from_utf8(blob).is_ok()
    }
}

/// Parse `doc` with a fresh registry and default options.
pub(crate) fn render(doc: &str) -> (String, Cite) {
    let mut parser = TestParser::default();
    let mut cite = Cite::default();
    let html = parser.reparse(doc, &mut cite);
    (html, cite)
}
