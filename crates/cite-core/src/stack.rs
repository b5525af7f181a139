//! Ordered citation entries per group.

use indexmap::IndexMap;

use crate::error::{CiteError, CiteErrorKind, Error};

/// One entry in a group's list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    /// Citation without a key. Never shared.
    Anonymous {
        text: String,
        order: usize,
        /// Display number, shared with named entries of the group.
        number: usize,
    },
    /// Keyed citation, possibly used several times.
    Named(NamedEntry),
    /// Text waiting for a keyed citation that has not been seen yet.
    Continuation {
        follow: String,
        text: String,
        order: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedEntry {
    pub key: String,
    pub text: Option<String>,
    /// Index of the latest use; 0 after the first.
    pub uses: usize,
    pub order: usize,
    /// Display number, dense across the group's numbered entries.
    pub number: usize,
}

impl Entry {
    #[must_use]
    pub fn order(&self) -> usize {
        match self {
            Self::Anonymous { order, .. } | Self::Continuation { order, .. } => *order,
            Self::Named(named) => named.order,
        }
    }

    /// `-1` for entries that are never reused, else the latest use index.
    #[must_use]
    pub fn occurrence_count(&self) -> i64 {
        match self {
            Self::Named(named) => i64::try_from(named.uses).unwrap_or(i64::MAX),
            Self::Anonymous { .. } | Self::Continuation { .. } => -1,
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Anonymous { text, .. } | Self::Continuation { text, .. } => Some(text.as_str()),
            Self::Named(named) => named.text.as_deref(),
        }
    }
}

/// What a recorded marker should link to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recorded {
    /// Continuation; nothing visible at the point of use.
    Continuation,
    Anonymous {
        order: usize,
        number: usize,
    },
    Named {
        key: String,
        order: usize,
        /// Index of this use.
        use_index: usize,
        number: usize,
    },
}

#[derive(Clone, Debug, Default)]
struct Group {
    entries: Vec<Entry>,
    /// Last display number handed out; anonymous and named entries share it.
    last_number: usize,
}

impl Group {
    fn named_mut(&mut self, key: &str) -> Option<&mut NamedEntry> {
        self.entries.iter_mut().find_map(|entry| match entry {
            Entry::Named(named) if named.key == key => Some(named),
            _ => None,
        })
    }
}

/// All groups of one document, in first-use order.
#[derive(Clone, Debug, Default)]
pub struct ReferenceStack {
    groups: IndexMap<String, Group>,
    next_order: usize,
}

impl ReferenceStack {
    /// Record one marker occurrence.
    ///
    /// `text` is `None` for an empty marker, which needs a key.
    pub fn record(
        &mut self,
        text: Option<&str>,
        key: Option<&str>,
        group: &str,
        follow: Option<&str>,
    ) -> Result<Recorded, Error> {
        if let Some(follow) = follow {
            self.push_continuation(text.unwrap_or_default(), group, follow);
            return Ok(Recorded::Continuation);
        }

        match (key, text) {
            (Some(key), text) => Ok(self.push_named(text, key, group)),
            (None, Some(text)) => Ok(self.push_anonymous(text, group)),
            (None, None) => Err(Error::MissingTextAndKey {
                group: group.to_owned(),
            }),
        }
    }

    fn fresh_order(&mut self) -> usize {
        self.next_order += 1;
        self.next_order
    }

    fn push_continuation(&mut self, text: &str, group_name: &str, follow: &str) {
        if let Some(target) = self
            .groups
            .get_mut(group_name)
            .and_then(|group| group.named_mut(follow))
        {
            if !text.is_empty() {
                match &mut target.text {
                    Some(existing) => {
                        existing.push(' ');
                        existing.push_str(text);
                    }
                    None => target.text = Some(text.to_owned()),
                }
            }
            return;
        }

        let order = self.fresh_order();
        let group = self.groups.entry(group_name.to_owned()).or_default();
        let at = group
            .entries
            .iter()
            .position(|entry| !matches!(entry, Entry::Continuation { .. }))
            .unwrap_or(group.entries.len());
        group.entries.insert(
            at,
            Entry::Continuation {
                follow: follow.to_owned(),
                text: text.to_owned(),
                order,
            },
        );
    }

    fn push_anonymous(&mut self, text: &str, group_name: &str) -> Recorded {
        let order = self.fresh_order();
        let group = self.groups.entry(group_name.to_owned()).or_default();
        group.last_number += 1;
        let number = group.last_number;
        group.entries.push(Entry::Anonymous {
            text: text.to_owned(),
            order,
            number,
        });
        Recorded::Anonymous { order, number }
    }

    fn push_named(&mut self, text: Option<&str>, key: &str, group_name: &str) -> Recorded {
        let text = text.filter(|t| !t.is_empty());

        if let Some(existing) = self
            .groups
            .get_mut(group_name)
            .and_then(|group| group.named_mut(key))
        {
            if existing.text.as_deref().is_none_or(str::is_empty)
                && let Some(text) = text
            {
                existing.text = Some(text.to_owned());
            }
            existing.uses += 1;
            return Recorded::Named {
                key: key.to_owned(),
                order: existing.order,
                use_index: existing.uses,
                number: existing.number,
            };
        }

        let order = self.fresh_order();
        let group = self.groups.entry(group_name.to_owned()).or_default();

        // Continuations that arrived before their target, in arrival order.
        let mut absorbed: Vec<String> = Vec::new();
        group.entries.retain(|entry| match entry {
            Entry::Continuation { follow, text, .. } if follow == key => {
                if !text.is_empty() {
                    absorbed.push(text.clone());
                }
                false
            }
            _ => true,
        });
        let text = match (text, absorbed.is_empty()) {
            (Some(text), true) => Some(text.to_owned()),
            (Some(text), false) => Some(format!("{text} {}", absorbed.join(" "))),
            (None, false) => Some(absorbed.join(" ")),
            (None, true) => None,
        };

        group.last_number += 1;
        let number = group.last_number;
        group.entries.push(Entry::Named(NamedEntry {
            key: key.to_owned(),
            text,
            uses: 0,
            order,
            number,
        }));
        Recorded::Named {
            key: key.to_owned(),
            order,
            use_index: 0,
            number,
        }
    }

    /// Whether `key` has a named entry in `group`.
    #[must_use]
    pub fn is_registered(&self, group: &str, key: &str) -> bool {
        self.groups.get(group).is_some_and(|g| {
            g.entries
                .iter()
                .any(|entry| matches!(entry, Entry::Named(named) if named.key == key))
        })
    }

    /// Replace the text of an existing named entry from inside a region.
    pub fn define(&mut self, group_name: &str, key: &str, text: &str) -> Result<(), CiteError> {
        let Some(group) = self
            .groups
            .get_mut(group_name)
            .filter(|group| !group.entries.is_empty())
        else {
            return Err(CiteError::new(CiteErrorKind::UnknownGroupInRegion).with_param(group_name));
        };
        let Some(entry) = group.named_mut(key) else {
            return Err(CiteError::new(CiteErrorKind::UnknownKeyInRegion).with_param(key));
        };
        entry.text = Some(text.to_owned());
        Ok(())
    }

    #[must_use]
    pub fn entries(&self, group: &str) -> &[Entry] {
        self.groups.get(group).map_or(&[], |g| g.entries.as_slice())
    }

    /// Remove a group and return its entries, or `None` if it has none.
    pub fn take_group(&mut self, group: &str) -> Option<Vec<Entry>> {
        self.groups
            .shift_remove(group)
            .map(|g| g.entries)
            .filter(|entries| !entries.is_empty())
    }

    /// Groups that still hold entries, in first-use order.
    #[must_use]
    pub fn pending_groups(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter(|(_, g)| !g.entries.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.next_order = 0;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn named(stack: &ReferenceStack, group: &str, key: &str) -> NamedEntry {
        stack
            .entries(group)
            .iter()
            .find_map(|entry| match entry {
                Entry::Named(named) if named.key == key => Some(named.clone()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_named_uses_are_monotonic() {
        let mut stack = ReferenceStack::default();

        for expected in 0..5 {
            let recorded = stack.record(Some("A"), Some("x"), "", None).unwrap();
            assert_eq!(
                recorded,
                Recorded::Named {
                    key: "x".to_owned(),
                    order: 1,
                    use_index: expected,
                    number: 1,
                }
            );
        }
        assert_eq!(stack.entries("").len(), 1);
        assert_eq!(stack.entries("")[0].occurrence_count(), 4);
    }

    #[test]
    fn test_first_text_wins() {
        let mut stack = ReferenceStack::default();
        stack.record(Some("A"), Some("x"), "", None).unwrap();
        stack.record(Some("A2"), Some("x"), "", None).unwrap();

        assert_eq!(named(&stack, "", "x").text.as_deref(), Some("A"));
    }

    #[test]
    fn test_empty_text_backfilled_later() {
        let mut stack = ReferenceStack::default();
        stack.record(None, Some("y"), "", None).unwrap();
        assert_eq!(named(&stack, "", "y").text, None);

        stack.record(Some("Later"), Some("y"), "", None).unwrap();
        assert_eq!(named(&stack, "", "y").text.as_deref(), Some("Later"));
    }

    #[test]
    fn test_anonymous_never_shared() {
        let mut stack = ReferenceStack::default();
        let a = stack.record(Some("same"), None, "", None).unwrap();
        let b = stack.record(Some("same"), None, "", None).unwrap();

        assert_eq!(a, Recorded::Anonymous { order: 1, number: 1 });
        assert_eq!(b, Recorded::Anonymous { order: 2, number: 2 });
        assert_eq!(stack.entries("").len(), 2);
    }

    #[test]
    fn test_numbers_shared_by_named_and_anonymous() {
        let mut stack = ReferenceStack::default();
        stack.record(Some("a"), Some("a"), "", None).unwrap();
        let anon = stack.record(Some("anon"), None, "", None).unwrap();
        stack.record(Some("n"), Some("n"), "notes", None).unwrap();
        let b = stack.record(Some("b"), Some("b"), "", None).unwrap();
        stack.record(None, Some("a"), "", None).unwrap();

        assert_eq!(named(&stack, "", "a").number, 1);
        assert_eq!(anon, Recorded::Anonymous { order: 2, number: 2 });
        assert_eq!(named(&stack, "notes", "n").number, 1);
        assert!(matches!(b, Recorded::Named { number: 3, order: 4, .. }));
    }

    #[test]
    fn test_continuations_take_no_number() {
        let mut stack = ReferenceStack::default();
        stack.record(Some("tail"), None, "", Some("later")).unwrap();
        let anon = stack.record(Some("anon"), None, "", None).unwrap();

        assert_eq!(anon, Recorded::Anonymous { order: 2, number: 1 });
    }

    #[test]
    fn test_follow_existing_appends() {
        let mut stack = ReferenceStack::default();
        stack.record(Some("Start."), Some("x"), "", None).unwrap();
        let recorded = stack.record(Some("More."), None, "", Some("x")).unwrap();

        assert_eq!(recorded, Recorded::Continuation);
        assert_eq!(named(&stack, "", "x").text.as_deref(), Some("Start. More."));
        assert_eq!(stack.entries("").len(), 1);
    }

    #[test]
    fn test_follow_missing_clusters_at_head() {
        let mut stack = ReferenceStack::default();
        stack.record(Some("anon"), None, "", None).unwrap();
        stack.record(Some("one"), None, "", Some("later")).unwrap();
        stack.record(Some("two"), None, "", Some("other")).unwrap();

        let entries = stack.entries("");
        assert_eq!(entries.len(), 3);
        assert!(matches!(&entries[0], Entry::Continuation { follow, .. } if follow == "later"));
        assert!(matches!(&entries[1], Entry::Continuation { follow, .. } if follow == "other"));
        assert!(matches!(&entries[2], Entry::Anonymous { .. }));
        assert_eq!(entries[0].occurrence_count(), -1);
    }

    #[test]
    fn test_definition_absorbs_waiting_continuations_in_order() {
        let mut stack = ReferenceStack::default();
        stack.record(Some("second"), None, "", Some("x")).unwrap();
        stack.record(Some("third"), None, "", Some("x")).unwrap();
        stack.record(Some("first"), Some("x"), "", None).unwrap();

        let entries = stack.entries("");
        assert_eq!(entries.len(), 1);
        assert_eq!(
            named(&stack, "", "x").text.as_deref(),
            Some("first second third")
        );
    }

    #[test]
    fn test_missing_text_and_key_is_contract_error() {
        let mut stack = ReferenceStack::default();
        let err = stack.record(None, None, "notes", None).unwrap_err();
        assert!(matches!(err, Error::MissingTextAndKey { group } if group == "notes"));
    }

    #[test]
    fn test_define() {
        let mut stack = ReferenceStack::default();
        stack.record(None, Some("x"), "", None).unwrap();

        stack.define("", "x", "Defined").unwrap();
        assert_eq!(named(&stack, "", "x").text.as_deref(), Some("Defined"));

        let err = stack.define("", "y", "text").unwrap_err();
        assert_eq!(err.kind, CiteErrorKind::UnknownKeyInRegion);

        let err = stack.define("notes", "x", "text").unwrap_err();
        assert_eq!(err.kind, CiteErrorKind::UnknownGroupInRegion);
    }

    #[test]
    fn test_take_group_clears() {
        let mut stack = ReferenceStack::default();
        stack.record(Some("a"), None, "", None).unwrap();
        stack.record(Some("b"), None, "notes", None).unwrap();
        assert_eq!(stack.pending_groups(), vec![String::new(), "notes".to_owned()]);

        assert_eq!(stack.take_group("").map(|e| e.len()), Some(1));
        assert_eq!(stack.take_group(""), None);
        assert_eq!(stack.pending_groups(), vec!["notes".to_owned()]);

        let again = stack.record(Some("c"), Some("c"), "", None).unwrap();
        assert!(matches!(again, Recorded::Named { number: 1, order: 3, .. }));
    }

    #[test]
    fn test_clear_resets_order() {
        let mut stack = ReferenceStack::default();
        stack.record(Some("a"), None, "", None).unwrap();
        stack.clear();

        let recorded = stack.record(Some("a"), None, "", None).unwrap();
        assert_eq!(recorded, Recorded::Anonymous { order: 1, number: 1 });
    }
}
