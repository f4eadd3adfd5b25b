use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Content,
    Distance,
}

/// One parsed occurrence paired with a previous entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptMatch {
    /// Index into the previous entry list.
    pub entry: usize,
    /// Distance ratio between the two normalized texts; 0 for content matches.
    pub ratio: f64,
    pub tier: MatchTier,
}

/// Matches keyed by parsed index. The key doubles as the order token, so merging tables
/// from several passes keeps parsed order without relying on insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchTable {
    matches: BTreeMap<usize, PromptMatch>,
}

impl MatchTable {
    pub fn insert(&mut self, parsed: usize, matched: PromptMatch) {
        self.matches.insert(parsed, matched);
    }

    #[must_use]
    pub fn get(&self, parsed: usize) -> Option<&PromptMatch> {
        self.matches.get(&parsed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &PromptMatch)> {
        self.matches.iter().map(|(parsed, matched)| (*parsed, matched))
    }

    /// Passes work on disjoint pools, so keys never collide.
    #[must_use]
    pub fn merge(mut self, other: MatchTable) -> Self {
        self.matches.extend(other.matches);
        self
    }
}

/// What one pass paired, plus the residual pools (indices, original order kept).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassOutcome {
    pub table: MatchTable,
    pub unmatched_entries: Vec<usize>,
    pub unmatched_parsed: Vec<usize>,
}
