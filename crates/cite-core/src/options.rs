use std::time::Duration;

/// Behaviour switches for a [`Cite`](crate::Cite) registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CiteOptions {
    /// Allow the `group` attribute.
    pub groups_enabled: bool,
    /// Wrap reference lists in a responsive container by default.
    pub responsive: bool,
    /// Entry count above which a responsive list switches to columns.
    pub responsive_columns: usize,
    /// Render the default group at the end of the page when no list was
    /// placed explicitly.
    pub auto_references: bool,
    /// Cache rendered reference lists.
    pub cache_references: bool,
    /// Lifetime of cached reference lists.
    pub cache_ttl: Duration,
}

impl Default for CiteOptions {
    fn default() -> Self {
        Self {
            groups_enabled: true,
            responsive: false,
            responsive_columns: 10,
            auto_references: false,
            cache_references: false,
            cache_ttl: Duration::from_secs(86_400),
        }
    }
}

impl CiteOptions {
    #[must_use]
    pub fn with_groups(mut self, enabled: bool) -> Self {
        self.groups_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_responsive(mut self, responsive: bool) -> Self {
        self.responsive = responsive;
        self
    }

    #[must_use]
    pub fn with_responsive_columns(mut self, threshold: usize) -> Self {
        self.responsive_columns = threshold;
        self
    }

    #[must_use]
    pub fn with_auto_references(mut self, enabled: bool) -> Self {
        self.auto_references = enabled;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, enabled: bool, ttl: Duration) -> Self {
        self.cache_references = enabled;
        self.cache_ttl = ttl;
        self
    }
}
