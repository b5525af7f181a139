//! Attribute validation for markers and regions.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CiteError, CiteErrorKind};
use crate::host::Attributes;
use crate::sanitize::{IdMode, IdSanitizer};

/// Attributes accepted on a citation marker.
pub const MARKER_ATTRIBUTES: &[&str] = &["name", "group", "follow"];

/// Attributes accepted on a reference list region.
pub const REGION_ATTRIBUTES: &[&str] = &["group", "responsive"];

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([A-Za-z][A-Za-z0-9-]*)[^>]*>").unwrap());

/// Resolved marker attributes.
///
/// Empty values count as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkerKeys {
    pub key: Option<String>,
    pub group: Option<String>,
    pub follow: Option<String>,
}

/// Validate and normalize a marker's attributes.
///
/// Checks run in a fixed order: disabled groups, then `name` together
/// with `follow`, then unknown attributes.
pub fn resolve_marker_attributes(
    attrs: &Attributes,
    groups_enabled: bool,
    sanitizer: &dyn IdSanitizer,
) -> Result<MarkerKeys, CiteError> {
    if !groups_enabled && let Some(group) = attrs.get("group") {
        return Err(CiteError::new(CiteErrorKind::GroupsDisabled).with_param(group));
    }
    if attrs.contains_key("name") && attrs.contains_key("follow") {
        return Err(CiteError::new(CiteErrorKind::ConflictingKeyAndFollow));
    }
    if let Some(unknown) = attrs
        .keys()
        .find(|name| !MARKER_ATTRIBUTES.contains(&name.as_str()))
    {
        return Err(CiteError::new(CiteErrorKind::UnrecognizedAttribute).with_param(unknown));
    }

    let normalize = |raw: &String| {
        let id = sanitizer.normalize_id(raw, IdMode::Attribute);
        (!id.is_empty()).then_some(id)
    };

    Ok(MarkerKeys {
        key: attrs.get("name").and_then(normalize),
        group: attrs.get("group").cloned(),
        follow: attrs.get("follow").and_then(normalize),
    })
}

/// Resolved region attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionKeys {
    pub group: Option<String>,
    /// `None` when the attribute is absent and the configured default applies.
    pub responsive: Option<bool>,
}

/// Validate a region's attributes.
pub fn resolve_region_attributes(
    attrs: &Attributes,
    groups_enabled: bool,
) -> Result<RegionKeys, CiteError> {
    if !groups_enabled && let Some(group) = attrs.get("group") {
        return Err(CiteError::new(CiteErrorKind::GroupsDisabled).with_param(group));
    }

    let unknown: Vec<&str> = attrs
        .keys()
        .map(String::as_str)
        .filter(|name| !REGION_ATTRIBUTES.contains(name))
        .collect();
    if !unknown.is_empty() {
        return Err(
            CiteError::new(CiteErrorKind::InvalidRegionAttributes).with_param(unknown.join(", "))
        );
    }

    Ok(RegionKeys {
        group: attrs.get("group").cloned(),
        responsive: attrs.get("responsive").map(|v| parse_flag(v)),
    })
}

/// `responsive` is on unless explicitly `0`, `false`, `no` or `off`.
fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

/// Whether a key is numeric and therefore unusable as a name.
///
/// A key is numeric when it is ASCII digits with at most one leading `-`.
/// So `42` and `-3` are numeric, while `+3`, `1.5` and `3a` are not.
#[must_use]
pub fn is_numeric_key(key: &str) -> bool {
    let digits = key.strip_prefix('-').unwrap_or(key);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Remove HTML comments and balanced `<tag ...>...</tag>` spans.
///
/// Whatever marker opening survives this is unterminated. Each span
/// ends at the first matching close tag.
#[must_use]
pub fn strip_balanced_spans(text: &str) -> String {
    let text = COMMENT_RE.replace_all(text, "");
    let mut out = String::with_capacity(text.len());
    let mut rest: &str = &text;

    while let Some(open) = OPEN_TAG_RE.captures(rest) {
        let (Some(tag), Some(name)) = (open.get(0), open.get(1)) else {
            break;
        };
        match find_close_tag(&rest[tag.end()..], name.as_str()) {
            Some(close_end) => {
                out.push_str(&rest[..tag.start()]);
                rest = &rest[tag.end() + close_end..];
            }
            None => {
                out.push_str(&rest[..tag.end()]);
                rest = &rest[tag.end()..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Byte offset just past `</name *>` in `s`.
fn find_close_tag(s: &str, name: &str) -> Option<usize> {
    let needle = format!("</{name}");
    let mut from = 0;

    while let Some(pos) = s[from..].find(&needle) {
        let tail_start = from + pos + needle.len();
        let tail = &s[tail_start..];
        let trimmed = tail.trim_start_matches(' ');
        if trimmed.starts_with('>') {
            return Some(tail_start + (tail.len() - trimmed.len()) + 1);
        }
        from = tail_start;
    }
    None
}
