use crate::distance::rank_candidates;
use crate::prompts::MatchContext;
use crate::text::normalize_content;
use playground_protocol::{ParsedVar, VarEntry, VarId};
use std::collections::{HashMap, HashSet};

/// Carries var ids over from the previous version of a prompt.
///
/// Same two passes as prompts (exact, then greedy by distance), with one difference:
/// occurrences of the same expression share one id, so a repeated `${name}` never
/// consumes a second previous var.
#[must_use]
pub fn match_vars(
    previous: &[VarEntry],
    parsed: &[ParsedVar],
    prompt_start: usize,
    ctx: &MatchContext<'_>,
) -> Vec<VarEntry> {
    let mut assigned: Vec<Option<VarId>> = vec![None; parsed.len()];
    let mut by_exp: HashMap<&str, VarId> = HashMap::new();
    let mut pool: Vec<usize> = (0..previous.len()).collect();

    for (idx, var) in parsed.iter().enumerate() {
        if let Some(id) = by_exp.get(var.exp.as_str()) {
            assigned[idx] = Some(id.clone());
            continue;
        }
        if let Some(pos) = pool.iter().position(|&p| previous[p].exp == var.exp) {
            let prev = &previous[pool.remove(pos)];
            by_exp.insert(var.exp.as_str(), prev.id.clone());
            assigned[idx] = Some(prev.id.clone());
        }
    }

    let pending: Vec<(usize, String)> = assigned
        .iter()
        .enumerate()
        .filter(|(_, id)| id.is_none())
        .map(|(idx, _)| (idx, normalize_content(&parsed[idx].exp)))
        .collect();
    if !pending.is_empty() && !pool.is_empty() {
        let pool_texts: Vec<(usize, String)> = pool
            .iter()
            .map(|&p| (p, normalize_content(&previous[p].exp)))
            .collect();
        let mut taken = HashSet::new();
        for candidate in rank_candidates(&pool_texts, &pending, ctx.thresholds.max_distance_ratio)
        {
            if assigned[candidate.parsed].is_some() {
                continue;
            }
            let exp = parsed[candidate.parsed].exp.as_str();
            if let Some(id) = by_exp.get(exp) {
                assigned[candidate.parsed] = Some(id.clone());
                continue;
            }
            if !taken.insert(candidate.entry) {
                continue;
            }
            let id = previous[candidate.entry].id.clone();
            by_exp.insert(exp, id.clone());
            assigned[candidate.parsed] = Some(id);
        }
    }

    parsed
        .iter()
        .zip(assigned)
        .map(|(var, id)| {
            let id = id.unwrap_or_else(|| {
                by_exp
                    .entry(var.exp.as_str())
                    .or_insert_with(|| VarId::new(ctx.ids.generate()))
                    .clone()
            });
            VarEntry {
                id,
                exp: var.exp.clone(),
                span: var.span.outer.relative_to(prompt_start),
            }
        })
        .collect()
}
