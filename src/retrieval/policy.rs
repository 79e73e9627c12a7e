//! Source tier configuration.
//!
//! A tier names the source patterns a user context should see first and
//! the sibling patterns it should not see at all. Pure data; the retriever
//! gives it teeth.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Included and excluded source patterns for one context group.
///
/// Patterns use SQL `LIKE` syntax (`%columbia_college%`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTier {
    /// Sources this context prefers.
    pub included: Vec<String>,
    /// Sibling sources this context must not receive.
    pub excluded: Vec<String>,
}

impl SourceTier {
    /// Builds a tier from pattern lists.
    pub fn new<I, E, S, T>(included: I, excluded: E) -> Self
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            included: included.into_iter().map(Into::into).collect(),
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }
}

/// Maps context keys (schools) to source tiers.
///
/// Related contexts that share a curriculum register the same tier under
/// several keys. Review sources are always included regardless of tier,
/// because professor reviews are school-agnostic. Unknown keys resolve to
/// no tier at all, which the retriever treats as unfiltered.
///
/// # Examples
///
/// ```rust
/// use passagesmith::SourceTierPolicy;
///
/// let policy = SourceTierPolicy::default();
/// assert!(policy.resolve("columbia_college").is_some());
/// assert!(policy.resolve("juilliard").is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTierPolicy {
    tiers: HashMap<String, SourceTier>,
    review_sources: Vec<String>,
}

impl Default for SourceTierPolicy {
    /// The bulletin school groups: Columbia College and GS share one
    /// curriculum tier, SEAS and Barnard each get their own.
    fn default() -> Self {
        let college = SourceTier::new(
            ["%columbia_college%", "%columbia_gs%"],
            ["%barnard%", "%columbia_engineering%", "%seas%"],
        );
        let engineering = SourceTier::new(
            ["%columbia_engineering%", "%seas%"],
            ["%barnard%"],
        );
        let barnard = SourceTier::new(
            ["%barnard%"],
            ["%columbia_engineering%", "%seas%"],
        );

        Self::empty()
            .with_group(["columbia_college", "columbia_gs"], college)
            .with_tier("columbia_engineering", engineering)
            .with_tier("barnard", barnard)
            .with_review_sources(["%culpa%"])
    }
}

impl SourceTierPolicy {
    /// A policy with no tiers and no review sources.
    pub fn empty() -> Self {
        Self {
            tiers: HashMap::new(),
            review_sources: Vec::new(),
        }
    }

    /// Registers a tier under one context key.
    #[must_use]
    pub fn with_tier(mut self, key: impl Into<String>, tier: SourceTier) -> Self {
        self.tiers.insert(key.into(), tier);
        self
    }

    /// Registers the same tier under several context keys.
    #[must_use]
    pub fn with_group<I, S>(mut self, keys: I, tier: SourceTier) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            self.tiers.insert(key.into(), tier.clone());
        }
        self
    }

    /// Replaces the always-included review source patterns.
    #[must_use]
    pub fn with_review_sources<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.review_sources = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Looks up the tier for a context key, if one is configured.
    pub fn resolve(&self, context_key: &str) -> Option<&SourceTier> {
        self.tiers.get(context_key)
    }

    /// Source patterns included for every context.
    pub fn review_sources(&self) -> &[String] {
        &self.review_sources
    }
}
