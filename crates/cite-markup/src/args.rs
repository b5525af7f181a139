//! Directive arguments: `[content]{key="value" ...}`.

use cite_core::Attributes;

/// Content and attributes of one directive.
///
/// `content` is `None` when the directive has no brackets at all, which
/// is how the self-closing marker form `:ref{name=x}` is told apart from
/// an empty `:ref[]{name=x}`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectiveArgs {
    pub content: Option<String>,
    pub attrs: Attributes,
}

impl DirectiveArgs {
    /// Parse bracket content and the inside of the braces.
    ///
    /// Attributes are `key="value"`, `key='value'`, `key=value` or a bare
    /// `key`, which gets an empty value.
    #[must_use]
    pub fn parse(content: Option<&str>, attrs_str: &str) -> Self {
        let mut args = Self {
            content: content.map(str::to_owned),
            attrs: Attributes::new(),
        };

        let mut remaining = attrs_str.trim_start();
        while !remaining.is_empty() {
            match parse_attribute(remaining) {
                Some((key, value, rest)) => {
                    args.attrs.insert(key.to_owned(), value.to_owned());
                    remaining = rest.trim_start();
                }
                None => {
                    let skip = remaining.chars().next().map_or(1, char::len_utf8);
                    remaining = remaining[skip..].trim_start();
                }
            }
        }

        args
    }

    /// Whether the directive carried brackets or any attribute.
    #[must_use]
    pub fn is_bare(&self) -> bool {
        self.content.is_none() && self.attrs.is_empty()
    }

    /// Rebuild `[content]{key="value"}` for literal echoing.
    #[must_use]
    pub fn to_syntax(&self) -> String {
        let mut result = String::new();

        if let Some(content) = &self.content {
            result.push('[');
            result.push_str(content);
            result.push(']');
        }

        if !self.attrs.is_empty() {
            let parts: Vec<String> = self
                .attrs
                .iter()
                .map(|(key, value)| format!(r#"{key}="{}""#, value.replace('"', "&quot;")))
                .collect();
            result.push('{');
            result.push_str(&parts.join(" "));
            result.push('}');
        }

        result
    }
}

/// One attribute from the start of `s`: `(key, value, rest)`.
fn parse_attribute(s: &str) -> Option<(&str, &str, &str)> {
    let key_end = s
        .find(|c: char| c == '=' || c.is_whitespace())
        .unwrap_or(s.len());
    let key = &s[..key_end];
    if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        return None;
    }

    let Some(after_eq) = s[key_end..].strip_prefix('=') else {
        return Some((key, "", &s[key_end..]));
    };

    for quote in ['"', '\''] {
        if let Some(quoted) = after_eq.strip_prefix(quote) {
            let end = quoted.find(quote)?;
            return Some((key, &quoted[..end], &quoted[end + 1..]));
        }
    }

    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
    Some((key, &after_eq[..end], &after_eq[end..]))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn attr<'a>(args: &'a DirectiveArgs, key: &str) -> Option<&'a str> {
        args.attrs.get(key).map(String::as_str)
    }

    #[test]
    fn test_empty() {
        let args = DirectiveArgs::parse(None, "");
        assert_eq!(args.content, None);
        assert!(args.attrs.is_empty());
        assert!(args.is_bare());
    }

    #[test]
    fn test_empty_brackets_are_not_bare() {
        let args = DirectiveArgs::parse(Some(""), "");
        assert_eq!(args.content.as_deref(), Some(""));
        assert!(!args.is_bare());
    }

    #[test]
    fn test_quoting_styles() {
        let args = DirectiveArgs::parse(None, r#"name="Smith 2001" group='notes' follow=prev"#);
        assert_eq!(attr(&args, "name"), Some("Smith 2001"));
        assert_eq!(attr(&args, "group"), Some("notes"));
        assert_eq!(attr(&args, "follow"), Some("prev"));
    }

    #[test]
    fn test_bare_key() {
        let args = DirectiveArgs::parse(None, "responsive group=g");
        assert_eq!(attr(&args, "responsive"), Some(""));
        assert_eq!(attr(&args, "group"), Some("g"));
    }

    #[test]
    fn test_garbage_skipped() {
        let args = DirectiveArgs::parse(None, r#"#id .class name="a""#);
        assert_eq!(attr(&args, "name"), Some("a"));
        assert_eq!(args.attrs.len(), 3);
        assert_eq!(attr(&args, "id"), Some(""));
        assert_eq!(attr(&args, "class"), Some(""));
    }

    #[test]
    fn test_unterminated_quote_skipped() {
        let args = DirectiveArgs::parse(None, r#"name="open"#);
        assert_eq!(attr(&args, "name"), None);
    }

    #[test]
    fn test_to_syntax() {
        let args = DirectiveArgs::parse(Some("Text"), r#"name="a" group=g"#);
        assert_eq!(args.to_syntax(), r#"[Text]{group="g" name="a"}"#);

        let args = DirectiveArgs::parse(None, r#"name="a""#);
        assert_eq!(args.to_syntax(), r#"{name="a"}"#);
    }
}
