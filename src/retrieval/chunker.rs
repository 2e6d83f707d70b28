//! Recursive character splitter: paragraph, then line, then word, then
//! hard character split, with a fixed overlap carried between neighbours.

fn char_count(text: &str) -> usize {
    text.chars().count()
}

fn split_keep_delimiter(text: &str, delimiter: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;

    while let Some(relative_pos) = text[start..].find(delimiter) {
        let end = start + relative_pos + delimiter.len();
        parts.push(text[start..end].to_string());
        start = end;
    }

    if start < text.len() {
        parts.push(text[start..].to_string());
    }

    parts
}

fn hard_split(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for ch in text.chars() {
        if current_len == max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        current.push(ch);
        current_len += 1;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Separators tried in order: `"\n\n"`, `"\n"`, `" "`, then per character.
#[derive(Clone, Copy)]
enum SplitLevel {
    Paragraph,
    Line,
    Word,
    Hard,
}

impl SplitLevel {
    fn next(self) -> Self {
        match self {
            Self::Paragraph => Self::Line,
            Self::Line => Self::Word,
            Self::Word | Self::Hard => Self::Hard,
        }
    }

    fn split(self, text: &str) -> Vec<String> {
        match self {
            Self::Paragraph => split_keep_delimiter(text, "\n\n"),
            Self::Line => split_keep_delimiter(text, "\n"),
            Self::Word => split_keep_delimiter(text, " "),
            Self::Hard => hard_split(text, 1),
        }
    }
}

fn chunk_segment(text: &str, max_chars: usize, level: SplitLevel, out: &mut Vec<String>) {
    if text.is_empty() {
        return;
    }

    if char_count(text) <= max_chars {
        out.push(text.to_string());
        return;
    }

    if matches!(level, SplitLevel::Hard) {
        out.extend(hard_split(text, max_chars));
        return;
    }

    let parts = level.split(text);
    if parts.len() <= 1 {
        chunk_segment(text, max_chars, level.next(), out);
        return;
    }

    let mut current = String::new();

    for part in parts {
        if char_count(&part) > max_chars {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            chunk_segment(&part, max_chars, level.next(), out);
            continue;
        }

        if current.is_empty() {
            current = part;
            continue;
        }

        if char_count(&current) + char_count(&part) <= max_chars {
            current.push_str(&part);
        } else {
            out.push(std::mem::take(&mut current));
            current = part;
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
}

/// Last `overlap` characters of `text`, advanced to the next word start when
/// the cut lands mid-word.
fn overlap_tail(text: &str, overlap: usize) -> &str {
    let len = char_count(text);
    if overlap == 0 || len == 0 {
        return "";
    }
    let skip = len.saturating_sub(overlap);
    let start = text
        .char_indices()
        .nth(skip)
        .map_or(text.len(), |(i, _)| i);
    let tail = &text[start..];
    if start == 0 || text[..start].ends_with(char::is_whitespace) {
        return tail;
    }
    match tail.find(char::is_whitespace) {
        Some(pos) if pos + 1 < tail.len() => tail[pos..].trim_start(),
        _ => tail,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveSplitter {
    /// `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into chunks of at most `chunk_size` characters. Every
    /// chunk after the first starts with up to `chunk_overlap` characters
    /// taken from the end of its predecessor. Whitespace-only pieces are
    /// dropped.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let budget = self.chunk_size - self.chunk_overlap;
        let mut pieces = Vec::new();
        chunk_segment(text, budget, SplitLevel::Paragraph, &mut pieces);
        pieces.retain(|piece| !piece.trim().is_empty());

        let mut chunks = Vec::with_capacity(pieces.len());
        let mut previous: Option<&str> = None;
        for piece in &pieces {
            let chunk = match previous {
                Some(prev) => format!("{}{piece}", overlap_tail(prev, self.chunk_overlap)),
                None => piece.clone(),
            };
            chunks.push(chunk);
            previous = Some(piece);
        }
        chunks
    }
}

impl Default for RecursiveSplitter {
    fn default() -> Self {
        Self::new(1_000, 200)
    }
}
