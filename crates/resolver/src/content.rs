use crate::table::{MatchTable, MatchTier, PassOutcome, PromptMatch};
use crate::text::normalize_content;
use playground_protocol::{ParsedPrompt, PromptEntry};

/// Exact pass: pairs each parsed prompt, in parsed order, with the first unmatched entry
/// whose normalized content is identical. Greedy first-fit; consumed entries leave the pool
/// immediately.
#[must_use]
pub fn match_by_content(
    entries: &[PromptEntry],
    parsed: &[ParsedPrompt],
    unmatched_entries: &[usize],
    unmatched_parsed: &[usize],
) -> PassOutcome {
    let mut pool: Vec<(usize, String)> = unmatched_entries
        .iter()
        .map(|&idx| (idx, normalize_content(&entries[idx].content)))
        .collect();
    let mut table = MatchTable::default();
    let mut residual_parsed = Vec::new();

    for &parsed_idx in unmatched_parsed {
        if pool.is_empty() {
            residual_parsed.push(parsed_idx);
            continue;
        }
        let target = normalize_content(&parsed[parsed_idx].content);
        match pool.iter().position(|(_, content)| *content == target) {
            Some(pos) => {
                let (entry, _) = pool.remove(pos);
                table.insert(
                    parsed_idx,
                    PromptMatch {
                        entry,
                        ratio: 0.0,
                        tier: MatchTier::Content,
                    },
                );
            }
            None => residual_parsed.push(parsed_idx),
        }
    }

    PassOutcome {
        table,
        unmatched_entries: pool.into_iter().map(|(idx, _)| idx).collect(),
        unmatched_parsed: residual_parsed,
    }
}
