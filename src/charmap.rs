//! Character index and character multisets.
//!
//! A [`CharMap`] gives every canonical character of the corpus a dense index,
//! most frequent first. A [`CharCount`] is a multiset over that index space;
//! it is never mutated in place, [`CharCount::decrement`] returns a new value.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;

/// Maps a raw character to its canonical form, or `None` to ignore it.
pub type Normalizer = fn(char) -> Option<char>;

/// Lowercases letters and drops everything else.
pub fn basic_normalize(c: char) -> Option<char> {
    if c.is_alphabetic() {
        c.to_lowercase().next()
    } else {
        None
    }
}

/// Error raised when text contains a canonical character the index lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharMapError {
    /// A word handed to a trie could not be translated.
    UnrepresentableWord(String),
    /// The search phrase could not be counted.
    UnrepresentablePhrase(String),
}

impl fmt::Display for CharMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharMapError::UnrepresentableWord(w) => {
                write!(f, "word '{}' contains characters absent from every word list", w)
            }
            CharMapError::UnrepresentablePhrase(p) => {
                write!(f, "phrase '{}' contains characters absent from every word list", p)
            }
        }
    }
}

impl std::error::Error for CharMapError {}

/// Accumulates character frequencies before the index is fixed.
pub struct CharMapBuilder {
    counter: FxHashMap<char, usize>,
    normalizer: Normalizer,
}

impl CharMapBuilder {
    /// Create a builder using [`basic_normalize`].
    pub fn new() -> Self {
        Self::with_normalizer(basic_normalize)
    }

    /// Create a builder with a custom normalizer.
    pub fn with_normalizer(normalizer: Normalizer) -> Self {
        Self {
            counter: FxHashMap::default(),
            normalizer,
        }
    }

    /// Count the canonical characters of every word.
    pub fn add_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            for c in word.as_ref().chars().filter_map(self.normalizer) {
                *self.counter.entry(c).or_insert(0) += 1;
            }
        }
    }

    /// Fix the index: descending frequency, ties by character.
    pub fn build(self) -> CharMap {
        let mut order: Vec<(char, usize)> = self.counter.into_iter().collect();
        order.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let chars: Vec<char> = order.into_iter().map(|(c, _)| c).collect();
        let index = chars.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        CharMap {
            index,
            chars,
            normalizer: self.normalizer,
        }
    }
}

impl Default for CharMapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable character index shared by every search thread.
#[derive(Debug, Clone)]
pub struct CharMap {
    index: FxHashMap<char, usize>,
    chars: Vec<char>,
    normalizer: Normalizer,
}

impl CharMap {
    /// Number of distinct canonical characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Index of a raw character after normalization.
    pub fn index_of(&self, c: char) -> Option<usize> {
        (self.normalizer)(c).and_then(|n| self.index.get(&n).copied())
    }

    /// Canonical character stored at `index`.
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// Translate a word into its index sequence, skipping ignored characters.
    pub fn translate(&self, word: &str) -> Result<SmallVec<[usize; 16]>, CharMapError> {
        let mut out = SmallVec::new();
        for c in word.chars().filter_map(self.normalizer) {
            match self.index.get(&c) {
                Some(&i) => out.push(i),
                None => return Err(CharMapError::UnrepresentableWord(word.to_string())),
            }
        }
        Ok(out)
    }

    /// Multiset of a whole phrase.
    pub fn count(&self, phrase: &str) -> Result<CharCount, CharMapError> {
        let mut cc = CharCount::new(self.len());
        if self.accumulate(phrase, &mut cc) {
            Ok(cc)
        } else {
            Err(CharMapError::UnrepresentablePhrase(phrase.to_string()))
        }
    }

    /// Multiset of a phrase given as separate words.
    pub fn count_words<S: AsRef<str>>(&self, words: &[S]) -> Result<CharCount, CharMapError> {
        let mut cc = CharCount::new(self.len());
        for word in words {
            if !self.accumulate(word.as_ref(), &mut cc) {
                let phrase: Vec<&str> = words.iter().map(AsRef::as_ref).collect();
                return Err(CharMapError::UnrepresentablePhrase(phrase.join(" ")));
            }
        }
        Ok(cc)
    }

    fn accumulate(&self, text: &str, cc: &mut CharCount) -> bool {
        for c in text.chars().filter_map(self.normalizer) {
            match self.index.get(&c) {
                Some(&i) => {
                    cc.counts[i] += 1;
                    cc.total += 1;
                }
                None => return false,
            }
        }
        true
    }
}

/// Remaining letters to place, indexed by [`CharMap`] position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharCount {
    counts: SmallVec<[u32; 32]>,
    total: usize,
}

impl CharCount {
    /// An empty multiset over `size` indices.
    pub fn new(size: usize) -> Self {
        Self {
            counts: smallvec::smallvec![0; size],
            total: 0,
        }
    }

    /// Total number of characters left.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Count at `index` (zero when out of range).
    pub fn get(&self, index: usize) -> u32 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    /// Whether at least one character with this index remains.
    pub fn has(&self, index: usize) -> bool {
        self.get(index) > 0
    }

    /// A copy with one fewer `index`, or `None` if none is left.
    pub fn decrement(&self, index: usize) -> Option<CharCount> {
        if !self.has(index) {
            return None;
        }
        let mut next = self.clone();
        next.counts[index] -= 1;
        next.total -= 1;
        Some(next)
    }
}

#[cfg(test)]
#[path = "tests/charmap.rs"]
mod tests;
