//! Fuzzy pass over whatever the exact pass left unpaired.
//!
//! Candidate pairs are ranked by `(ratio, parsed index)` and committed greedily, skipping
//! pairs whose endpoints were already taken. Greedy, not an optimal assignment; the
//! tie-break order (best ratio first, then earliest occurrence) is observable behavior.

use crate::table::{MatchTable, MatchTier, PassOutcome, PromptMatch};
use crate::text::{distance_ratio, normalize_content};
use playground_protocol::{ParsedPrompt, PromptEntry};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub parsed: usize,
    pub entry: usize,
    pub ratio: f64,
}

/// Every pair with `ratio < max_ratio`, best first. Texts must be normalized.
pub(crate) fn rank_candidates(
    entry_texts: &[(usize, String)],
    parsed_texts: &[(usize, String)],
    max_ratio: f64,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for (parsed, parsed_text) in parsed_texts {
        for (entry, entry_text) in entry_texts {
            let ratio = distance_ratio(entry_text, parsed_text);
            if ratio < max_ratio {
                candidates.push(Candidate {
                    parsed: *parsed,
                    entry: *entry,
                    ratio,
                });
            }
        }
    }
    // Stable: equal (ratio, parsed) keeps entry pool order.
    candidates.sort_by(|a, b| a.ratio.total_cmp(&b.ratio).then(a.parsed.cmp(&b.parsed)));
    candidates
}

#[must_use]
pub fn match_by_distance(
    entries: &[PromptEntry],
    parsed: &[ParsedPrompt],
    unmatched_entries: &[usize],
    unmatched_parsed: &[usize],
    max_ratio: f64,
) -> PassOutcome {
    if unmatched_entries.is_empty() || unmatched_parsed.is_empty() {
        return PassOutcome {
            table: MatchTable::default(),
            unmatched_entries: unmatched_entries.to_vec(),
            unmatched_parsed: unmatched_parsed.to_vec(),
        };
    }

    let entry_texts: Vec<(usize, String)> = unmatched_entries
        .iter()
        .map(|&idx| (idx, normalize_content(&entries[idx].content)))
        .collect();
    let parsed_texts: Vec<(usize, String)> = unmatched_parsed
        .iter()
        .map(|&idx| (idx, normalize_content(&parsed[idx].content)))
        .collect();

    let mut table = MatchTable::default();
    let mut taken_entries = HashSet::new();
    let mut taken_parsed = HashSet::new();

    for candidate in rank_candidates(&entry_texts, &parsed_texts, max_ratio) {
        if taken_entries.contains(&candidate.entry) || taken_parsed.contains(&candidate.parsed) {
            continue;
        }
        taken_entries.insert(candidate.entry);
        taken_parsed.insert(candidate.parsed);
        table.insert(
            candidate.parsed,
            PromptMatch {
                entry: candidate.entry,
                ratio: candidate.ratio,
                tier: MatchTier::Distance,
            },
        );
    }

    PassOutcome {
        table,
        unmatched_entries: unmatched_entries
            .iter()
            .copied()
            .filter(|idx| !taken_entries.contains(idx))
            .collect(),
        unmatched_parsed: unmatched_parsed
            .iter()
            .copied()
            .filter(|idx| !taken_parsed.contains(idx))
            .collect(),
    }
}
