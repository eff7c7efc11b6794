use std::collections::VecDeque;

use tracing::warn;

use super::Language;

/// Separator ladder for text with no recognized language: paragraph breaks,
/// then lines, then words, then characters.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Recursive character splitter.
///
/// Splits on the most significant separator present in the text, recurses
/// with the remaining (weaker) separators into any piece still over the
/// target size, then merges adjacent pieces back into chunks of at most
/// `chunk_size` characters with a trailing window of up to `chunk_overlap`
/// characters repeated at the start of the next chunk.
///
/// `chunk_size` is a soft target: a piece with no separator left to split on
/// is emitted whole rather than cut mid-token.
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &'static [&'static str],
}

impl RecursiveSplitter {
    /// Splitter with the generic separator ladder.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS,
        }
    }

    /// Splitter using the language's own split points first.
    pub fn for_language(language: Language, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: language.separators(),
        }
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, self.separators)
    }

    fn split_with(&self, text: &str, separators: &'static [&'static str]) -> Vec<String> {
        // Pick the first separator that actually occurs in this text; the
        // ones after it feed the recursion for oversized pieces.
        let mut separator = *separators.last().unwrap_or(&"");
        let mut remaining: &'static [&'static str] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = candidate;
                break;
            }
            if text.contains(candidate) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits = split_keeping_separator(text, separator);

        let mut chunks = Vec::new();
        let mut good: Vec<String> = Vec::new();
        for piece in splits {
            if piece.len() < self.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                chunks.extend(self.merge_splits(&good));
                good.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_with(&piece, remaining));
            }
        }
        if !good.is_empty() {
            chunks.extend(self.merge_splits(&good));
        }
        chunks
    }

    /// Greedily joins small pieces into chunks, sliding a window so that up
    /// to `chunk_overlap` trailing characters carry over into the next chunk.
    fn merge_splits(&self, splits: &[String]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in splits {
            let len = piece.len();
            if total + len > self.chunk_size && !window.is_empty() {
                if total > self.chunk_size {
                    warn!(
                        size = total,
                        target = self.chunk_size,
                        "produced a chunk larger than the target size"
                    );
                }
                if let Some(doc) = join_window(&window) {
                    docs.push(doc);
                }
                // Drop leading pieces until the carried-over tail fits the
                // overlap budget and leaves room for the next piece.
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some(front) => total -= front.len(),
                        None => break,
                    }
                }
            }
            window.push_back(piece);
            total += len;
        }

        if let Some(doc) = join_window(&window) {
            docs.push(doc);
        }
        docs
    }
}

/// Splits `text` on `separator`, keeping the separator attached to the front
/// of the following piece so no characters are lost. The empty separator
/// splits into single characters.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }
    let mut pieces = Vec::new();
    let mut parts = text.split(separator);
    if let Some(first) = parts.next() {
        if !first.is_empty() {
            pieces.push(first.to_string());
        }
    }
    for part in parts {
        pieces.push(format!("{separator}{part}"));
    }
    pieces
}

fn join_window(window: &VecDeque<&str>) -> Option<String> {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
