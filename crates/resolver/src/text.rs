use unicode_segmentation::UnicodeSegmentation;

/// Trims and collapses every whitespace run to a single space.
#[must_use]
pub fn normalize_content(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Character-level Levenshtein distance.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Edit distance scaled by the longer string: 0 for identical, towards 1 for unrelated.
///
/// Both arguments are expected to be normalized already.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn distance_ratio(a: &str, b: &str) -> f64 {
    if a == b {
        return 0.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    levenshtein(a, b) as f64 / max_len as f64
}

/// First non-empty line of `content`, cut to `max_len` graphemes with a trailing ellipsis.
#[must_use]
pub fn preview(content: &str, max_len: usize) -> String {
    let trimmed = content.trim();
    let first_line = trimmed.lines().next().unwrap_or_default().trim_end();
    let graphemes: Vec<&str> = first_line.graphemes(true).collect();
    if graphemes.len() <= max_len {
        return first_line.to_string();
    }
    let mut out: String = graphemes[..max_len.saturating_sub(1)].concat();
    out.push('…');
    out
}
