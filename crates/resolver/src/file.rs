use crate::config::MatchThresholds;
use crate::prompts::{match_prompt_set, PromptSetMatch};
use log::debug;
use playground_protocol::{FileEntry, ParsedPrompt, PlaygroundMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveTier {
    /// Entry stored under the active path.
    Path,
    /// Best-scoring entry anywhere in the map.
    Distance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileMatch<'a> {
    pub base: &'a FileEntry,
    pub tier: ResolveTier,
    pub prompts: PromptSetMatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileResolution<'a> {
    pub matched: Option<FileMatch<'a>>,
    /// Score of the same-path attempt, if an entry existed at that path.
    pub path_score: Option<f64>,
    /// Best score of the workspace-wide attempt, if it ran over a non-empty map.
    pub distance_score: Option<f64>,
}

/// Picks the stored file record the active file should be reconciled against.
///
/// Tries the entry at the same path first, then every entry in the map. Candidates of the
/// workspace-wide tier need at least one matched prompt: a vacuous full score between two
/// empty lists does not justify carrying a record over from another path.
#[must_use]
pub fn resolve_file<'a>(
    map: &'a PlaygroundMap,
    path: &str,
    parsed: &[ParsedPrompt],
    thresholds: &MatchThresholds,
) -> FileResolution<'a> {
    let mut path_score = None;

    if let Some(base) = map.files.get(path) {
        let prompts = match_prompt_set(&base.prompts, parsed, thresholds);
        let score = prompts.score();
        path_score = Some(score);
        if score >= thresholds.by_path {
            debug!("Matched {path} by path (score {score:.3})");
            return FileResolution {
                matched: Some(FileMatch {
                    base,
                    tier: ResolveTier::Path,
                    prompts,
                }),
                path_score,
                distance_score: None,
            };
        }
        debug!("Path match for {path} below threshold (score {score:.3})");
    }

    if map.files.is_empty() {
        return FileResolution {
            matched: None,
            path_score,
            distance_score: None,
        };
    }

    let mut best: Option<(&FileEntry, PromptSetMatch, f64)> = None;
    for base in map.files.values() {
        let prompts = match_prompt_set(&base.prompts, parsed, thresholds);
        if prompts.matched_count() == 0 {
            continue;
        }
        let score = prompts.score();
        if best
            .as_ref()
            .map_or(true, |(_, _, best_score)| score > *best_score)
        {
            best = Some((base, prompts, score));
        }
    }

    let distance_score = Some(best.as_ref().map_or(0.0, |(_, _, score)| *score));
    let matched = match best {
        Some((base, prompts, score)) if score >= thresholds.by_distance => {
            debug!(
                "Matched {path} to {} by distance (score {score:.3})",
                base.path
            );
            Some(FileMatch {
                base,
                tier: ResolveTier::Distance,
                prompts,
            })
        }
        _ => None,
    };

    FileResolution {
        matched,
        path_score,
        distance_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{file, map_of, parsed_list};
    use pretty_assertions::assert_eq;

    #[test]
    fn same_path_wins_when_above_threshold() {
        let map = map_of(vec![
            file("f1", "a.ts", &["alpha", "beta"]),
            file("f2", "b.ts", &["alpha", "beta"]),
        ]);
        let parsed = parsed_list("b.ts", &["alpha", "beta"]);

        let out = resolve_file(&map, "b.ts", &parsed, &MatchThresholds::default());

        let matched = out.matched.expect("match");
        assert_eq!(matched.base.id.as_str(), "f2");
        assert_eq!(matched.tier, ResolveTier::Path);
        assert_eq!(out.path_score, Some(1.0));
    }

    #[test]
    fn renamed_file_is_found_by_distance() {
        let map = map_of(vec![file("f1", "old.ts", &["alpha", "beta", "gamma"])]);
        let parsed = parsed_list("new.ts", &["alpha", "beta", "delta-delta-delta"]);

        let out = resolve_file(&map, "new.ts", &parsed, &MatchThresholds::default());

        let matched = out.matched.expect("match");
        assert_eq!(matched.base.id.as_str(), "f1");
        assert_eq!(matched.tier, ResolveTier::Distance);
        assert_eq!(out.path_score, None);
        assert_eq!(out.distance_score, Some(0.5));
    }

    #[test]
    fn weak_same_path_falls_back_to_distance_tier() {
        let map = map_of(vec![file(
            "f1",
            "a.ts",
            &["alpha", "unrelated one", "unrelated two"],
        )]);
        let parsed = parsed_list("a.ts", &["alpha", "zzzzzzzzzzzzzzzzzzzz"]);

        let out = resolve_file(&map, "a.ts", &parsed, &MatchThresholds::default());

        // 1 matched of 1 + 2 + 1
        assert_eq!(out.path_score, Some(0.25));
        assert!(out.matched.is_none());
        assert_eq!(out.distance_score, Some(0.25));
    }

    #[test]
    fn weak_same_path_loses_to_better_record_elsewhere() {
        let map = map_of(vec![
            file("f1", "a.ts", &["zzzzzzzzzzzzzzzzzzzz"]),
            file("f2", "b.ts", &["beta", "gamma"]),
        ]);
        let parsed = parsed_list("a.ts", &["beta", "gamma"]);

        let out = resolve_file(&map, "a.ts", &parsed, &MatchThresholds::default());

        assert_eq!(out.path_score, Some(0.0));
        assert_eq!(out.distance_score, Some(1.0));
        let matched = out.matched.expect("match");
        assert_eq!(matched.base.id.as_str(), "f2");
        assert_eq!(matched.tier, ResolveTier::Distance);
    }

    #[test]
    fn weak_same_path_can_be_picked_again_by_distance() {
        let map = map_of(vec![file("f1", "a.ts", &["alpha", "beta", "gamma"])]);
        let parsed = parsed_list("a.ts", &["alpha", "beta", "delta-delta-delta"]);

        let out = resolve_file(&map, "a.ts", &parsed, &MatchThresholds::default());

        assert_eq!(out.path_score, Some(0.5));
        assert_eq!(out.distance_score, Some(0.5));
        let matched = out.matched.expect("match");
        assert_eq!(matched.base.id.as_str(), "f1");
        assert_eq!(matched.tier, ResolveTier::Distance);
    }

    #[test]
    fn best_scoring_file_is_chosen() {
        let map = map_of(vec![
            file("f1", "a.ts", &["alpha", "other thing", "third thing"]),
            file("f2", "b.ts", &["alpha", "beta"]),
        ]);
        let parsed = parsed_list("c.ts", &["alpha", "beta"]);

        let out = resolve_file(&map, "c.ts", &parsed, &MatchThresholds::default());

        assert_eq!(out.matched.expect("match").base.id.as_str(), "f2");
        assert_eq!(out.distance_score, Some(1.0));
    }

    #[test]
    fn unrelated_map_yields_no_base_and_zero_score() {
        let map = map_of(vec![file("f1", "a.ts", &["something else entirely"])]);
        let parsed = parsed_list("new.ts", &["Hello, world!", "How are you doing?"]);

        let out = resolve_file(&map, "new.ts", &parsed, &MatchThresholds::default());

        assert!(out.matched.is_none());
        assert_eq!(out.distance_score, Some(0.0));
    }

    #[test]
    fn empty_files_are_not_carried_across_paths() {
        let map = map_of(vec![file("f1", "a.ts", &[])]);

        let out = resolve_file(&map, "b.ts", &[], &MatchThresholds::default());

        assert!(out.matched.is_none());
    }
}
