use playground_protocol::{
    FileEntry, FileId, ParsedPrompt, PlaygroundMap, PromptEntry, PromptId, Span, SpanShape,
};

pub fn entry(id: &str, content: &str) -> PromptEntry {
    PromptEntry {
        id: PromptId::from(id),
        content: content.to_string(),
        span: None,
        vars: Vec::new(),
        updated_at: Some(1),
    }
}

pub fn parsed_at(path: &str, content: &str, start: usize) -> ParsedPrompt {
    let end = start + content.len();
    ParsedPrompt {
        path: path.to_string(),
        content: content.to_string(),
        span: SpanShape {
            outer: Span::new(start, end),
            inner: Span::new(start + 1, end.saturating_sub(1).max(start + 1)),
        },
        variables: Vec::new(),
    }
}

pub fn parsed(content: &str, start: usize) -> ParsedPrompt {
    parsed_at("test.ts", content, start)
}

/// Lays prompts out back to back, one offset apart.
pub fn parsed_list(path: &str, contents: &[&str]) -> Vec<ParsedPrompt> {
    let mut start = 0;
    contents
        .iter()
        .map(|content| {
            let prompt = parsed_at(path, content, start);
            start = prompt.span.outer.end + 1;
            prompt
        })
        .collect()
}

pub fn file(id: &str, path: &str, contents: &[&str]) -> FileEntry {
    FileEntry {
        id: FileId::from(id),
        path: path.to_string(),
        prompts: contents
            .iter()
            .enumerate()
            .map(|(idx, content)| entry(&format!("{id}-p{idx}"), content))
            .collect(),
        updated_at: 1,
    }
}

pub fn map_of(files: Vec<FileEntry>) -> PlaygroundMap {
    let mut map = PlaygroundMap::empty(1);
    for file in files {
        map.files.insert(file.path.clone(), file);
    }
    map
}
