use crate::text::preview;
use playground_protocol::{
    EditorFile, FileEntry, FileMeta, ParsedPrompt, PlaygroundMap, PlaygroundState, PromptEntry,
    PromptItem, PromptReason, PromptRef, PromptState,
};

/// Preview length used by the prompt picker.
pub const DEFAULT_PREVIEW_LENGTH: usize = 160;

/// Everything the state resolver looks at. Borrowed; resolving never mutates.
#[derive(Debug, Clone, Copy)]
pub struct StateInput<'a> {
    pub map: &'a PlaygroundMap,
    pub file: Option<&'a EditorFile>,
    pub parsed: &'a [ParsedPrompt],
    pub pin: Option<&'a PromptRef>,
    pub parse_error: Option<&'a str>,
    pub preview_length: usize,
}

impl<'a> StateInput<'a> {
    pub fn new(map: &'a PlaygroundMap) -> Self {
        Self {
            map,
            file: None,
            parsed: &[],
            pin: None,
            parse_error: None,
            preview_length: DEFAULT_PREVIEW_LENGTH,
        }
    }

    #[must_use]
    pub fn with_file(mut self, file: Option<&'a EditorFile>, parsed: &'a [ParsedPrompt]) -> Self {
        self.file = file;
        self.parsed = parsed;
        self
    }

    #[must_use]
    pub fn with_pin(mut self, pin: Option<&'a PromptRef>) -> Self {
        self.pin = pin;
        self
    }

    #[must_use]
    pub fn with_parse_error(mut self, parse_error: Option<&'a str>) -> Self {
        self.parse_error = parse_error;
        self
    }

    #[must_use]
    pub fn with_preview_length(mut self, preview_length: usize) -> Self {
        self.preview_length = preview_length;
        self
    }
}

/// Drops a pin whose file or prompt no longer exists.
#[must_use]
pub fn sanitize_pin(map: &PlaygroundMap, pin: Option<&PromptRef>) -> Option<PromptRef> {
    let pin = pin?;
    map.pair(pin).map(|_| pin.clone())
}

#[must_use]
pub fn prompt_items(file: &FileEntry, preview_length: usize) -> Vec<PromptItem> {
    file.prompts
        .iter()
        .map(|prompt| PromptItem {
            file_id: file.id.clone(),
            prompt_id: prompt.id.clone(),
            preview: preview(&prompt.content, preview_length),
        })
        .collect()
}

/// Derives the externally visible state.
///
/// A live pin wins over the cursor and over which file is open: the pinned file then
/// supplies `file` and `prompts`. Otherwise the active prompt is the parsed prompt under
/// the cursor, index-aligned with the stored list, falling back to the first stored
/// prompt when the cursor sits between prompts. A file without a cursor has no active
/// prompt.
#[must_use]
pub fn resolve_state(input: &StateInput<'_>) -> PlaygroundState {
    let parse_error = input.parse_error.map(str::to_string);

    if let Some(pin) = input.pin {
        if let Some((pin_file, pin_prompt)) = input.map.pair(pin) {
            let file = match input.file {
                Some(active) if active.path == pin_file.path => active.meta(),
                _ => FileMeta::from_path(pin_file.path.clone()),
            };
            return PlaygroundState {
                file: Some(file),
                prompt: Some(prompt_state(pin_file, pin_prompt, PromptReason::Pinned)),
                prompts: prompt_items(pin_file, input.preview_length),
                pin: Some(pin.clone()),
                parse_error,
            };
        }
    }

    let Some(active) = input.file else {
        return PlaygroundState {
            parse_error,
            ..PlaygroundState::default()
        };
    };

    let stored = input.map.files.get(&active.path);
    let prompt = stored.and_then(|stored| {
        let offset = active.cursor?.offset;
        let prompt = input
            .parsed
            .iter()
            .position(|parsed| parsed.span.outer.contains(offset))
            .and_then(|idx| stored.prompts.get(idx))
            .or_else(|| stored.prompts.first())?;
        Some(prompt_state(stored, prompt, PromptReason::Cursor))
    });

    PlaygroundState {
        file: Some(active.meta()),
        prompt,
        prompts: stored.map_or_else(Vec::new, |stored| {
            prompt_items(stored, input.preview_length)
        }),
        pin: None,
        parse_error,
    }
}

fn prompt_state(file: &FileEntry, prompt: &PromptEntry, reason: PromptReason) -> PromptState {
    PromptState {
        file_id: file.id.clone(),
        prompt_id: prompt.id.clone(),
        content: prompt.content.clone(),
        vars: prompt.vars.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{file, map_of, parsed_at};
    use playground_protocol::Span;
    use pretty_assertions::assert_eq;

    fn two_prompt_fixture() -> (PlaygroundMap, Vec<ParsedPrompt>) {
        let map = map_of(vec![
            file("f1", "a.ts", &["hello", "how are you"]),
            file("f2", "b.ts", &["pinned prompt"]),
        ]);
        let mut first = parsed_at("a.ts", "hello", 0);
        first.span.outer = Span::new(0, 5);
        let mut second = parsed_at("a.ts", "how are you", 6);
        second.span.outer = Span::new(6, 15);
        (map, vec![first, second])
    }

    fn active_prompt(state: &PlaygroundState) -> Option<(&str, PromptReason)> {
        state
            .prompt
            .as_ref()
            .map(|p| (p.prompt_id.as_str(), p.reason))
    }

    #[test]
    fn cursor_selects_prompt_containing_offset() {
        let (map, parsed) = two_prompt_fixture();
        let active = EditorFile::new("a.ts", "").with_cursor(8);

        let state = resolve_state(&StateInput::new(&map).with_file(Some(&active), &parsed));

        assert_eq!(active_prompt(&state), Some(("f1-p1", PromptReason::Cursor)));
        assert_eq!(state.prompts.len(), 2);
        assert_eq!(state.pin, None);
    }

    #[test]
    fn span_end_counts_as_inside() {
        let (map, parsed) = two_prompt_fixture();
        let active = EditorFile::new("a.ts", "").with_cursor(5);

        let state = resolve_state(&StateInput::new(&map).with_file(Some(&active), &parsed));

        assert_eq!(active_prompt(&state), Some(("f1-p0", PromptReason::Cursor)));
    }

    #[test]
    fn cursor_outside_prompts_defaults_to_first() {
        let (map, parsed) = two_prompt_fixture();
        let active = EditorFile::new("a.ts", "").with_cursor(400);

        let state = resolve_state(&StateInput::new(&map).with_file(Some(&active), &parsed));

        assert_eq!(active_prompt(&state), Some(("f1-p0", PromptReason::Cursor)));
    }

    #[test]
    fn pin_takes_precedence_over_cursor_and_active_file() {
        let (map, parsed) = two_prompt_fixture();
        let active = EditorFile::new("a.ts", "").with_cursor(8);
        let pin = PromptRef::new("f2", "f2-p0");

        let state = resolve_state(
            &StateInput::new(&map)
                .with_file(Some(&active), &parsed)
                .with_pin(Some(&pin)),
        );

        assert_eq!(active_prompt(&state), Some(("f2-p0", PromptReason::Pinned)));
        assert_eq!(state.pin, Some(pin));
        assert_eq!(state.file, Some(FileMeta::from_path("b.ts")));
        assert_eq!(
            state
                .prompts
                .iter()
                .map(|p| p.preview.as_str())
                .collect::<Vec<_>>(),
            vec!["pinned prompt"]
        );
    }

    #[test]
    fn dangling_pin_is_dropped_silently() {
        let (map, parsed) = two_prompt_fixture();
        let active = EditorFile::new("a.ts", "");
        let pin = PromptRef::new("gone", "nothing");

        let state = resolve_state(
            &StateInput::new(&map)
                .with_file(Some(&active), &parsed)
                .with_pin(Some(&pin)),
        );

        assert_eq!(state.pin, None);
        assert_eq!(state.prompt, None);
        assert_eq!(
            state
                .prompts
                .iter()
                .map(|p| p.prompt_id.as_str())
                .collect::<Vec<_>>(),
            vec!["f1-p0", "f1-p1"]
        );
    }

    #[test]
    fn pin_to_removed_prompt_is_dropped() {
        let (map, _) = two_prompt_fixture();
        assert_eq!(
            sanitize_pin(&map, Some(&PromptRef::new("f2", "f2-p9"))),
            None
        );
        assert_eq!(
            sanitize_pin(&map, Some(&PromptRef::new("f2", "f2-p0"))),
            Some(PromptRef::new("f2", "f2-p0"))
        );
    }

    #[test]
    fn untracked_file_yields_metadata_only() {
        let (map, _) = two_prompt_fixture();
        let active = EditorFile::new("c.ts", "plain text").with_cursor(3);

        let state = resolve_state(
            &StateInput::new(&map)
                .with_file(Some(&active), &[])
                .with_parse_error(Some("unexpected token")),
        );

        assert_eq!(state.file, Some(active.meta()));
        assert_eq!(state.prompt, None);
        assert!(state.prompts.is_empty());
        assert_eq!(state.parse_error.as_deref(), Some("unexpected token"));
    }

    #[test]
    fn no_active_file_gives_empty_state() {
        let (map, _) = two_prompt_fixture();
        assert_eq!(
            resolve_state(&StateInput::new(&map)),
            PlaygroundState::default()
        );
    }

    #[test]
    fn previews_are_truncated() {
        let map = map_of(vec![file("f1", "a.ts", &["abcdefghij\nsecond line"])]);
        let items = prompt_items(&map.files["a.ts"], 5);
        assert_eq!(items[0].preview, "abcd…");
    }
}
