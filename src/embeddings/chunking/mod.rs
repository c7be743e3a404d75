
use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::LazyLock;
use tracing::debug;

static PAGE_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--- Page (\d+) ---").expect("valid regex"));

/// Unit in which chunk size and overlap are measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkUnit {
    /// Unicode scalar values
    Characters,
    /// A run of non-whitespace plus the whitespace that follows it
    #[default]
    Tokens,
}

impl std::fmt::Display for ChunkUnit {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Characters => f.write_str("characters"),
            Self::Tokens => f.write_str("tokens"),
        }
    }
}

/// A bounded, position-tagged span of a document's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Position of this segment in document order
    pub index: usize,
    /// The segment text, an exact substring of the source
    pub content: String,
    /// Byte range of `content` within the source text
    pub span: Range<usize>,
    /// Page in force at the start of the segment, when the text carries page markers
    pub page: Option<usize>,
    /// Estimated token count
    pub token_count: usize,
}

/// Configuration for content chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in `unit`s
    pub chunk_size: usize,
    /// Units shared by consecutive windows
    pub chunk_overlap: usize,
    pub unit: ChunkUnit,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            unit: ChunkUnit::Tokens,
        }
    }
}

/// Split `text` into overlapping windows.
///
/// Window `i` covers units `[i * step, i * step + chunk_size)` with
/// `step = chunk_size - chunk_overlap`; the last window may be shorter.
/// Empty text yields no segments.
#[inline]
pub fn segment_text(text: &str, config: &ChunkingConfig) -> Vec<Segment> {
    if text.is_empty() {
        return Vec::new();
    }

    let bounds = unit_boundaries(text, config.unit);
    let unit_count = bounds.len() - 1;
    let size = config.chunk_size.max(1);
    let step = size.saturating_sub(config.chunk_overlap).max(1);
    let pages = page_markers(text);

    let mut segments = Vec::new();
    let mut start_unit = 0;
    loop {
        let end_unit = (start_unit + size).min(unit_count);
        let span = bounds[start_unit]..bounds[end_unit];
        let content = text[span.clone()].to_string();

        segments.push(Segment {
            index: segments.len(),
            token_count: estimate_token_count(&content),
            page: page_at(&pages, span.start),
            content,
            span,
        });

        if end_unit == unit_count {
            break;
        }
        start_unit += step;
    }

    debug!(
        "Segmented {} {} into {} segments (size {}, overlap {})",
        unit_count,
        config.unit,
        segments.len(),
        size,
        config.chunk_overlap
    );

    segments
}

/// Rebuild the source text from ordered segments, discounting overlap
#[inline]
pub fn reconstruct_text(segments: &[Segment]) -> String {
    let mut text = String::new();
    let mut covered = 0;

    for segment in segments {
        if segment.span.end <= covered {
            continue;
        }
        let skip = covered.saturating_sub(segment.span.start);
        text.push_str(&segment.content[skip..]);
        covered = segment.span.end;
    }

    text
}

/// Byte offsets of every unit boundary, including 0 and `text.len()`
fn unit_boundaries(text: &str, unit: ChunkUnit) -> Vec<usize> {
    let mut bounds = vec![0];

    match unit {
        ChunkUnit::Characters => {
            bounds.extend(text.char_indices().skip(1).map(|(i, _)| i));
        }
        ChunkUnit::Tokens => {
            // Leading whitespace belongs to the first token
            let mut seen_word = false;
            let mut previous_was_space = false;
            for (i, c) in text.char_indices() {
                let is_space = c.is_whitespace();
                if seen_word && previous_was_space && !is_space {
                    bounds.push(i);
                }
                seen_word |= !is_space;
                previous_was_space = is_space;
            }
        }
    }

    bounds.push(text.len());
    bounds
}

fn page_markers(text: &str) -> Vec<(usize, usize)> {
    PAGE_MARKER_REGEX
        .captures_iter(text)
        .filter_map(|captures| {
            let captures = captures.ok()?;
            let offset = captures.get(0)?.start();
            let page = captures.get(1)?.as_str().parse().ok()?;
            Some((offset, page))
        })
        .collect()
}

fn page_at(pages: &[(usize, usize)], offset: usize) -> Option<usize> {
    let first = pages.first()?;
    let page = pages
        .iter()
        .take_while(|(marker, _)| *marker <= offset)
        .last()
        .unwrap_or(first);
    Some(page.1)
}

/// Estimate token count using a simple heuristic
/// This is a rough approximation - actual tokenization would be more accurate
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    // Rough heuristic: 1 token ≈ 0.75 words for English text
    // Add extra tokens for punctuation and special characters
    let word_count = text.split_whitespace().count();
    let punct_count = text.chars().filter(|c| c.is_ascii_punctuation()).count();

    (punct_count as f64).mul_add(0.1, word_count as f64 / 0.75) as usize
}
