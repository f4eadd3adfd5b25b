use crate::file::{resolve_file, FileMatch, ResolveTier};
use crate::prompts::{new_prompt_entry, MatchContext, PromptOrigin, RebuiltPrompt};
use crate::table::MatchTier;
use playground_protocol::{FileEntry, FileId, ParsedPrompt, PlaygroundMap, PromptEntry};
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Nothing structural changed; the input map is handed back as-is.
    Unchanged { file_id: FileId },
    Updated {
        file_id: FileId,
        tier: ResolveTier,
        /// Previous path when the record was carried over from another file.
        moved_from: Option<String>,
    },
    Created { file_id: FileId },
    /// Unknown path with no prompts: nothing to track.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct Reconciliation<'a> {
    /// `Cow::Borrowed` means the caller's map is still current and need not be persisted.
    pub map: Cow<'a, PlaygroundMap>,
    pub outcome: ReconcileOutcome,
    pub path_score: Option<f64>,
    pub distance_score: Option<f64>,
}

impl Reconciliation<'_> {
    #[must_use]
    pub fn changed(&self) -> bool {
        matches!(self.map, Cow::Owned(_))
    }

    #[must_use]
    pub fn file_id(&self) -> Option<&FileId> {
        match &self.outcome {
            ReconcileOutcome::Unchanged { file_id }
            | ReconcileOutcome::Updated { file_id, .. }
            | ReconcileOutcome::Created { file_id } => Some(file_id),
            ReconcileOutcome::Skipped => None,
        }
    }
}

/// Folds a fresh parse of `path` into the catalogue.
#[must_use]
pub fn reconcile_map<'a>(
    map: &'a PlaygroundMap,
    path: &str,
    parsed: &[ParsedPrompt],
    ctx: &MatchContext<'_>,
) -> Reconciliation<'a> {
    let resolution = resolve_file(map, path, parsed, &ctx.thresholds);
    let (next, outcome) = match resolution.matched {
        Some(file_match) => apply_file_match(map, path, parsed, file_match, ctx),
        None if parsed.is_empty() && !map.files.contains_key(path) => {
            (Cow::Borrowed(map), ReconcileOutcome::Skipped)
        }
        None => {
            let file = create_file_entry(path, parsed, ctx);
            let file_id = file.id.clone();
            let mut next = map.clone();
            next.files.insert(path.to_string(), file);
            next.updated_at = ctx.timestamp;
            (Cow::Owned(next), ReconcileOutcome::Created { file_id })
        }
    };

    Reconciliation {
        map: next,
        outcome,
        path_score: resolution.path_score,
        distance_score: resolution.distance_score,
    }
}

/// A record for a file nothing in the catalogue matched: new id, every prompt new.
#[must_use]
pub fn create_file_entry(path: &str, parsed: &[ParsedPrompt], ctx: &MatchContext<'_>) -> FileEntry {
    FileEntry {
        id: FileId::new(ctx.ids.generate()),
        path: path.to_string(),
        prompts: parsed
            .iter()
            .map(|prompt| new_prompt_entry(prompt, ctx))
            .collect(),
        updated_at: ctx.timestamp,
    }
}

fn apply_file_match<'a>(
    map: &'a PlaygroundMap,
    path: &str,
    parsed: &[ParsedPrompt],
    file_match: FileMatch<'a>,
    ctx: &MatchContext<'_>,
) -> (Cow<'a, PlaygroundMap>, ReconcileOutcome) {
    let base = file_match.base;
    let carried_over = file_match.tier == ResolveTier::Distance;
    let prompts: Vec<PromptEntry> = file_match
        .prompts
        .rebuild(&base.prompts, parsed, ctx)
        .into_iter()
        .map(|rebuilt| stamp(rebuilt, &base.prompts, carried_over, ctx.timestamp))
        .collect();

    let moved = base.path != path;
    if !moved && same_prompts(&base.prompts, &prompts) {
        return (
            Cow::Borrowed(map),
            ReconcileOutcome::Unchanged {
                file_id: base.id.clone(),
            },
        );
    }

    let mut next = map.clone();
    if moved {
        next.files.remove(&base.path);
    }
    next.files.insert(
        path.to_string(),
        FileEntry {
            id: base.id.clone(),
            path: path.to_string(),
            prompts,
            updated_at: ctx.timestamp,
        },
    );
    next.updated_at = ctx.timestamp;

    (
        Cow::Owned(next),
        ReconcileOutcome::Updated {
            file_id: base.id.clone(),
            tier: file_match.tier,
            moved_from: moved.then(|| base.path.clone()),
        },
    )
}

/// Advances `updated_at` only when the prompt really changed. Anything carried over by the
/// workspace-wide tier counts as changed.
fn stamp(
    rebuilt: RebuiltPrompt,
    previous: &[PromptEntry],
    carried_over: bool,
    timestamp: u64,
) -> PromptEntry {
    let mut entry = rebuilt.entry;
    let PromptOrigin::Matched {
        previous: previous_idx,
        tier,
    } = rebuilt.origin
    else {
        return entry;
    };

    let prev = &previous[previous_idx];
    if carried_over
        || tier == MatchTier::Distance
        || prev.updated_at.is_none()
        || prev.content != entry.content
    {
        entry.updated_at = Some(timestamp);
    }
    entry
}

/// Spans are not compared: a prompt shifted by edits elsewhere is the same prompt.
fn same_prompts(previous: &[PromptEntry], next: &[PromptEntry]) -> bool {
    previous.len() == next.len()
        && previous.iter().zip(next).all(|(a, b)| {
            a.id == b.id
                && a.content == b.content
                && a.updated_at == b.updated_at
                && a.vars.len() == b.vars.len()
                && a
                    .vars
                    .iter()
                    .zip(&b.vars)
                    .all(|(va, vb)| va.id == vb.id && va.exp == vb.exp)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::test_support::{file, map_of, parsed_list};
    use playground_protocol::PromptId;
    use pretty_assertions::assert_eq;

    fn prompt_ids(map: &PlaygroundMap, path: &str) -> Vec<String> {
        map.files[path]
            .prompts
            .iter()
            .map(|p| p.id.to_string())
            .collect()
    }

    #[test]
    fn reconciling_twice_returns_the_same_map() {
        let ids = SequentialIds::new("id");
        let empty = PlaygroundMap::empty(0);
        let parsed = parsed_list("a.ts", &["alpha", "beta"]);

        let first = reconcile_map(&empty, "a.ts", &parsed, &MatchContext::new(10, &ids));
        assert!(first.changed());
        let first_map = first.map.into_owned();

        let second = reconcile_map(&first_map, "a.ts", &parsed, &MatchContext::new(20, &ids));

        assert!(!second.changed());
        assert!(std::ptr::eq(&*second.map, &first_map));
        assert!(matches!(second.outcome, ReconcileOutcome::Unchanged { .. }));
    }

    #[test]
    fn drifting_prompt_keeps_id_and_gets_new_timestamp() {
        let ids = SequentialIds::new("id");
        let empty = PlaygroundMap::empty(0);
        let first = reconcile_map(
            &empty,
            "a.ts",
            &parsed_list("a.ts", &["alpha", "beta"]),
            &MatchContext::new(10, &ids),
        )
        .map
        .into_owned();
        let before = first.files["a.ts"].prompts.clone();

        let second = reconcile_map(
            &first,
            "a.ts",
            &parsed_list("a.ts", &["alpha alpha", "beta"]),
            &MatchContext::new(20, &ids),
        );

        let after = &second.map.files["a.ts"].prompts;
        assert_eq!(after[0].id, before[0].id);
        assert_eq!(after[0].content, "alpha alpha");
        assert_eq!(after[0].updated_at, Some(20));
        assert_eq!(after[1].id, before[1].id);
        assert_eq!(after[1].updated_at, Some(10));
        assert_eq!(second.map.updated_at, 20);
    }

    #[test]
    fn unseen_path_creates_new_file_entry() {
        let ids = SequentialIds::new("id");
        let map = map_of(vec![file("f1", "other.ts", &["something else entirely"])]);
        let parsed = parsed_list("new.ts", &["Hello, world!", "How are you doing?"]);

        let out = reconcile_map(&map, "new.ts", &parsed, &MatchContext::new(50, &ids));

        assert_eq!(out.distance_score, Some(0.0));
        assert_eq!(
            out.outcome,
            ReconcileOutcome::Created {
                file_id: FileId::from("id-1")
            }
        );
        let created = &out.map.files["new.ts"];
        assert_eq!(created.updated_at, 50);
        assert_eq!(
            created
                .prompts
                .iter()
                .map(|p| (p.id.as_str(), p.updated_at))
                .collect::<Vec<_>>(),
            vec![("id-2", Some(50)), ("id-3", Some(50))]
        );
        assert_eq!(out.map.files["other.ts"], map.files["other.ts"]);
        assert_eq!(out.map.updated_at, 50);
    }

    #[test]
    fn renamed_file_moves_record_and_stamps_carried_prompts() {
        let ids = SequentialIds::new("id");
        let map = map_of(vec![file("f1", "old.ts", &["alpha", "beta", "gamma"])]);
        let parsed = parsed_list("new.ts", &["alpha", "beta", "delta-delta-delta"]);

        let out = reconcile_map(&map, "new.ts", &parsed, &MatchContext::new(70, &ids));

        assert_eq!(
            out.outcome,
            ReconcileOutcome::Updated {
                file_id: FileId::from("f1"),
                tier: ResolveTier::Distance,
                moved_from: Some("old.ts".to_string()),
            }
        );
        assert!(!out.map.files.contains_key("old.ts"));
        let moved = &out.map.files["new.ts"];
        assert_eq!(moved.id.as_str(), "f1");
        assert_eq!(moved.path, "new.ts");
        assert_eq!(prompt_ids(&out.map, "new.ts"), vec!["f1-p0", "f1-p1", "id-1"]);
        assert!(moved.prompts.iter().all(|p| p.updated_at == Some(70)));
    }

    #[test]
    fn better_record_elsewhere_replaces_weak_same_path_entry() {
        let ids = SequentialIds::new("id");
        let map = map_of(vec![
            file("f1", "a.ts", &["zzzzzzzzzzzzzzzzzzzz"]),
            file("f2", "b.ts", &["beta", "gamma"]),
        ]);
        let parsed = parsed_list("a.ts", &["beta", "gamma"]);

        let out = reconcile_map(&map, "a.ts", &parsed, &MatchContext::new(70, &ids));

        assert_eq!(
            out.outcome,
            ReconcileOutcome::Updated {
                file_id: FileId::from("f2"),
                tier: ResolveTier::Distance,
                moved_from: Some("b.ts".to_string()),
            }
        );
        assert_eq!(out.map.files.len(), 1);
        assert!(!out.map.files.contains_key("b.ts"));
        let winner = &out.map.files["a.ts"];
        assert_eq!(winner.id.as_str(), "f2");
        assert_eq!(winner.updated_at, 70);
        assert_eq!(prompt_ids(&out.map, "a.ts"), vec!["f2-p0", "f2-p1"]);
        assert!(winner.prompts.iter().all(|p| p.updated_at == Some(70)));
        assert_eq!(out.map.updated_at, 70);
    }

    #[test]
    fn same_path_record_rematched_by_distance_is_restamped_in_place() {
        let ids = SequentialIds::new("id");
        let map = map_of(vec![file("f1", "a.ts", &["alpha", "beta", "gamma"])]);
        let parsed = parsed_list("a.ts", &["alpha", "beta", "delta-delta-delta"]);

        let out = reconcile_map(&map, "a.ts", &parsed, &MatchContext::new(70, &ids));

        assert_eq!(
            out.outcome,
            ReconcileOutcome::Updated {
                file_id: FileId::from("f1"),
                tier: ResolveTier::Distance,
                moved_from: None,
            }
        );
        assert_eq!(out.map.files.len(), 1);
        assert_eq!(prompt_ids(&out.map, "a.ts"), vec!["f1-p0", "f1-p1", "id-1"]);
        assert!(out.map.files["a.ts"]
            .prompts
            .iter()
            .all(|p| p.updated_at == Some(70)));
    }

    #[test]
    fn reorder_follows_parsed_order() {
        let ids = SequentialIds::new("id");
        let map = map_of(vec![file("f1", "a.ts", &["alpha", "beta", "gamma"])]);
        let parsed = parsed_list("a.ts", &["gamma", "alpha", "beta"]);

        let out = reconcile_map(&map, "a.ts", &parsed, &MatchContext::new(5, &ids));

        assert!(out.changed());
        assert_eq!(prompt_ids(&out.map, "a.ts"), vec!["f1-p2", "f1-p0", "f1-p1"]);
        assert!(out.map.files["a.ts"]
            .prompts
            .iter()
            .all(|p| p.updated_at == Some(1)));
    }

    #[test]
    fn shifted_spans_alone_do_not_rewrite_the_map() {
        let ids = SequentialIds::new("id");
        let map = map_of(vec![file("f1", "a.ts", &["alpha", "beta"])]);
        let mut parsed = parsed_list("a.ts", &["alpha", "beta"]);
        for prompt in &mut parsed {
            prompt.span.outer.start += 100;
            prompt.span.outer.end += 100;
        }

        let out = reconcile_map(&map, "a.ts", &parsed, &MatchContext::new(5, &ids));

        assert!(!out.changed());
    }

    #[test]
    fn missing_timestamp_is_filled_in() {
        let ids = SequentialIds::new("id");
        let mut map = map_of(vec![file("f1", "a.ts", &["alpha"])]);
        if let Some(file) = map.files.get_mut("a.ts") {
            file.prompts[0].updated_at = None;
        }

        let out = reconcile_map(
            &map,
            "a.ts",
            &parsed_list("a.ts", &["alpha"]),
            &MatchContext::new(9, &ids),
        );

        assert_eq!(out.map.files["a.ts"].prompts[0].updated_at, Some(9));
        assert_eq!(
            out.map.files["a.ts"].prompts[0].id,
            PromptId::from("f1-p0")
        );
    }

    #[test]
    fn unknown_path_without_prompts_is_skipped() {
        let ids = SequentialIds::new("id");
        let map = map_of(vec![file("f1", "a.ts", &["alpha"])]);

        let out = reconcile_map(&map, "b.ts", &[], &MatchContext::new(9, &ids));

        assert_eq!(out.outcome, ReconcileOutcome::Skipped);
        assert!(!out.changed());
        assert!(out.file_id().is_none());
    }

    #[test]
    fn all_prompts_removed_replaces_record() {
        let ids = SequentialIds::new("id");
        let map = map_of(vec![file("f1", "a.ts", &["alpha"])]);

        let out = reconcile_map(&map, "a.ts", &[], &MatchContext::new(9, &ids));

        assert_eq!(out.path_score, Some(0.0));
        let replaced = &out.map.files["a.ts"];
        assert!(replaced.prompts.is_empty());
        assert_eq!(replaced.id.as_str(), "id-1");
    }
}
