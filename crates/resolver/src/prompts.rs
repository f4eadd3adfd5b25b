use crate::config::MatchThresholds;
use crate::content::match_by_content;
use crate::distance::match_by_distance;
use crate::ids::IdGenerator;
use crate::table::{MatchTable, MatchTier, PromptMatch};
use crate::vars::match_vars;
use playground_protocol::{ParsedPrompt, PromptEntry, PromptId};

/// Inputs shared by every operation that may mint ids or stamp times.
#[derive(Clone, Copy)]
pub struct MatchContext<'a> {
    pub timestamp: u64,
    pub ids: &'a dyn IdGenerator,
    pub thresholds: MatchThresholds,
}

impl<'a> MatchContext<'a> {
    pub fn new(timestamp: u64, ids: &'a dyn IdGenerator) -> Self {
        Self {
            timestamp,
            ids,
            thresholds: MatchThresholds::default(),
        }
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: MatchThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

/// Both passes over one file's prompt list.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSetMatch {
    table: MatchTable,
    unmatched_entries: Vec<usize>,
    unmatched_parsed: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOrigin {
    New,
    Matched { previous: usize, tier: MatchTier },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RebuiltPrompt {
    pub entry: PromptEntry,
    pub origin: PromptOrigin,
}

#[must_use]
pub fn match_prompt_set(
    entries: &[PromptEntry],
    parsed: &[ParsedPrompt],
    thresholds: &MatchThresholds,
) -> PromptSetMatch {
    let all_entries: Vec<usize> = (0..entries.len()).collect();
    let all_parsed: Vec<usize> = (0..parsed.len()).collect();

    let by_content = match_by_content(entries, parsed, &all_entries, &all_parsed);
    let by_distance = match_by_distance(
        entries,
        parsed,
        &by_content.unmatched_entries,
        &by_content.unmatched_parsed,
        thresholds.max_distance_ratio,
    );

    PromptSetMatch {
        table: by_content.table.merge(by_distance.table),
        unmatched_entries: by_distance.unmatched_entries,
        unmatched_parsed: by_distance.unmatched_parsed,
    }
}

impl PromptSetMatch {
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn unmatched_entries(&self) -> &[usize] {
        &self.unmatched_entries
    }

    #[must_use]
    pub fn unmatched_parsed(&self) -> &[usize] {
        &self.unmatched_parsed
    }

    #[must_use]
    pub fn get(&self, parsed: usize) -> Option<&PromptMatch> {
        self.table.get(parsed)
    }

    /// `matched / (matched + unmatched entries + unmatched parsed)`; 1 when both sides
    /// were empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self) -> f64 {
        let matched = self.table.len();
        let total = matched + self.unmatched_entries.len() + self.unmatched_parsed.len();
        if total == 0 {
            return 1.0;
        }
        matched as f64 / total as f64
    }

    /// Next prompt list in parsed order. Matched occurrences keep their entry's id and
    /// `updated_at` with content, span and vars refreshed; the rest become new entries.
    #[must_use]
    pub fn rebuild(
        &self,
        entries: &[PromptEntry],
        parsed: &[ParsedPrompt],
        ctx: &MatchContext<'_>,
    ) -> Vec<RebuiltPrompt> {
        parsed
            .iter()
            .enumerate()
            .map(|(idx, prompt)| match self.table.get(idx) {
                Some(matched) => {
                    let previous = &entries[matched.entry];
                    RebuiltPrompt {
                        entry: PromptEntry {
                            id: previous.id.clone(),
                            content: prompt.content.clone(),
                            span: Some(prompt.span.outer),
                            vars: match_vars(
                                &previous.vars,
                                &prompt.variables,
                                prompt.span.outer.start,
                                ctx,
                            ),
                            updated_at: previous.updated_at,
                        },
                        origin: PromptOrigin::Matched {
                            previous: matched.entry,
                            tier: matched.tier,
                        },
                    }
                }
                None => RebuiltPrompt {
                    entry: new_prompt_entry(prompt, ctx),
                    origin: PromptOrigin::New,
                },
            })
            .collect()
    }
}

#[must_use]
pub fn new_prompt_entry(prompt: &ParsedPrompt, ctx: &MatchContext<'_>) -> PromptEntry {
    PromptEntry {
        id: PromptId::new(ctx.ids.generate()),
        content: prompt.content.clone(),
        span: Some(prompt.span.outer),
        vars: match_vars(&[], &prompt.variables, prompt.span.outer.start, ctx),
        updated_at: Some(ctx.timestamp),
    }
}
