//! Document context for mentions: sentence positions and text windows
//! anchored on a mention.
//!
//! The engine does not segment text properly. When the caller hands over the
//! document, sentence starts are found with a terminal-punctuation scan that
//! skips honorific and initial periods ("Mr. Smith", "J. Smith"). Callers
//! that own a real segmenter pass explicit start offsets instead.
//!
//! All offsets are character offsets, matching [`crate::CandidateSpan`].

use std::ops::Range;

use crate::lexicon;

/// Characters that end a sentence.
const TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Characters that may open a sentence before its first word.
const OPENERS: [char; 6] = ['"', '\'', '“', '‘', '(', '['];

/// Sorted sentence start offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceIndex {
    starts: Vec<usize>,
}

impl SentenceIndex {
    /// Scan `text` for sentence starts.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut starts = Vec::new();
        let mut expect_start = true;
        let mut token_start = 0;

        for (i, &c) in chars.iter().enumerate() {
            if c.is_whitespace() {
                token_start = i + 1;
                continue;
            }
            if expect_start && !OPENERS.contains(&c) {
                starts.push(i);
                expect_start = false;
            }
            if TERMINATORS.contains(&c) {
                let at_boundary = chars
                    .get(i + 1)
                    .map_or(true, |next| next.is_whitespace() || is_closer(*next));
                if at_boundary && !is_abbreviation(&chars[token_start..i], c) {
                    expect_start = true;
                }
            }
        }
        Self { starts }
    }

    /// Use caller-supplied sentence starts.
    #[must_use]
    pub fn from_starts(mut starts: Vec<usize>) -> Self {
        starts.sort_unstable();
        starts.dedup();
        Self { starts }
    }

    /// Index of the sentence containing `offset` (0 before the first start).
    #[must_use]
    pub fn sentence_of(&self, offset: usize) -> usize {
        self.starts
            .partition_point(|&s| s <= offset)
            .saturating_sub(1)
    }

    /// True if a sentence starts exactly at `offset`.
    #[must_use]
    pub fn is_sentence_initial(&self, offset: usize) -> bool {
        self.starts.binary_search(&offset).is_ok()
    }

    /// Number of known sentence starts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// True if no sentence start is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | '”' | '’' | ')' | ']')
}

/// "Mr." and "J." end a token, not a sentence.
fn is_abbreviation(token: &[char], terminator: char) -> bool {
    if terminator != '.' || token.is_empty() {
        return false;
    }
    let word: String = token
        .iter()
        .skip_while(|c| OPENERS.contains(c))
        .collect();
    let mut letters = word.chars();
    let single_initial = matches!((letters.next(), letters.next()), (Some(c), None) if c.is_uppercase());
    single_initial || lexicon::is_title_prefix(&word)
}

/// Document text around one mention, with the mention located inside it.
///
/// A naming cue found in the window only counts for the mention when it
/// overlaps or touches [`MentionContext::mention`]; a cue that belongs to
/// a neighbouring name does not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionContext {
    /// Window text.
    pub text: String,
    /// Byte range of the mention within `text`.
    pub mention: Range<usize>,
}

impl MentionContext {
    /// Up to `radius` characters of `text` on each side of the mention at
    /// character offsets `[start, end)`. Out-of-range offsets are clipped.
    #[must_use]
    pub fn around(text: &str, start: usize, end: usize, radius: usize) -> Self {
        let before = slice_chars(text, start.saturating_sub(radius), start);
        let surface = slice_chars(text, start, end);
        let after = slice_chars(text, end, end.saturating_add(radius));
        let mention = before.len()..before.len() + surface.len();
        Self {
            text: before + &surface + &after,
            mention,
        }
    }

    /// Context holding nothing but the mention surface.
    #[must_use]
    pub fn bare(surface: &str) -> Self {
        Self {
            text: surface.to_string(),
            mention: 0..surface.len(),
        }
    }

    /// True if the byte range `[from, to)` overlaps or touches the mention.
    #[must_use]
    pub fn touches(&self, from: usize, to: usize) -> bool {
        from <= self.mention.end && to >= self.mention.start
    }
}

/// Surface of `[start, end)` in `text`, by character offsets.
#[must_use]
pub fn slice_chars(text: &str, start: usize, end: usize) -> String {
    text.chars()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        let text = "Frodo left. Sam followed! Did Merry come? Yes.";
        let idx = SentenceIndex::from_text(text);
        assert_eq!(idx.len(), 4);
        assert!(idx.is_sentence_initial(0));
        assert!(idx.is_sentence_initial(12));
        assert!(!idx.is_sentence_initial(16));
        assert_eq!(idx.sentence_of(16), 1);
        assert_eq!(idx.sentence_of(30), 2);
    }

    #[test]
    fn honorific_and_initial_periods_do_not_split() {
        let text = "Then Mr. Smith met J. Jones. Smith nodded.";
        let idx = SentenceIndex::from_text(text);
        assert_eq!(idx.len(), 2);
        assert!(!idx.is_sentence_initial(9));
        assert!(idx.is_sentence_initial(29));
    }

    #[test]
    fn opening_quote_is_skipped() {
        let text = "He left. \"Gandalf!\" cried Pippin.";
        let idx = SentenceIndex::from_text(text);
        assert!(idx.is_sentence_initial(10));
    }

    #[test]
    fn explicit_starts() {
        let idx = SentenceIndex::from_starts(vec![40, 0, 40, 15]);
        assert_eq!(idx.len(), 3);
        assert_eq!(idx.sentence_of(20), 1);
        assert_eq!(idx.sentence_of(99), 2);
        assert!(SentenceIndex::default().is_empty());
        assert_eq!(SentenceIndex::default().sentence_of(7), 0);
    }

    #[test]
    fn windows_clip_and_count_chars() {
        let text = "Élan met Frodo";
        assert_eq!(slice_chars(text, 9, 14), "Frodo");

        let ctx = MentionContext::around(text, 9, 14, 4);
        assert_eq!(ctx.text, "met Frodo");
        assert_eq!(&ctx.text[ctx.mention.clone()], "Frodo");

        let ctx = MentionContext::around(text, 0, 4, 100);
        assert_eq!(ctx.text, text);
        assert_eq!(&ctx.text[ctx.mention.clone()], "Élan");
        assert_eq!(ctx.mention, 0..5);
    }

    #[test]
    fn touching_is_inclusive_of_edges() {
        let ctx = MentionContext::around("Sam met Frodo there", 8, 13, 40);
        assert_eq!(ctx.mention, 8..13);
        assert!(ctx.touches(0, 8));
        assert!(ctx.touches(13, 19));
        assert!(ctx.touches(10, 11));
        assert!(!ctx.touches(0, 7));
        assert!(!ctx.touches(14, 19));
        assert_eq!(MentionContext::bare("Bree").mention, 0..4);
    }
}
