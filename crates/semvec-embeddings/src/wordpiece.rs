//! Greedy longest-match-first WordPiece segmentation.

use crate::vocab::{Vocabulary, UNK_TOKEN};

/// Marker prepended to pieces that continue a word.
pub const CONTINUATION_PREFIX: &str = "##";

/// Split one lower-cased word into vocabulary pieces.
///
/// At each start offset the longest remaining span present in the vocabulary
/// wins (prefixed with `##` past the first piece). If no span matches at some
/// offset the whole word becomes a single `[UNK]`.
pub fn segment_word(word: &str, vocab: &Vocabulary) -> Vec<String> {
    // Byte offsets of every char boundary, including the end of the word.
    let bounds: Vec<usize> = word
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(word.len()))
        .collect();
    let last = bounds.len() - 1;

    let mut pieces = Vec::new();
    let mut start = 0;

    while start < last {
        let mut end = last;
        let mut matched = None;

        while start < end {
            let span = &word[bounds[start]..bounds[end]];
            let candidate = if start > 0 {
                format!("{CONTINUATION_PREFIX}{span}")
            } else {
                span.to_string()
            };
            if vocab.contains(&candidate) {
                matched = Some(candidate);
                break;
            }
            end -= 1;
        }

        match matched {
            Some(piece) => {
                pieces.push(piece);
                start = end;
            }
            None => return vec![UNK_TOKEN.to_string()],
        }
    }

    pieces
}
