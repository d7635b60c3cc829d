//! Prefix trees over character indices.
//!
//! One [`Trie`] is built per word list. After all insertions [`Trie::finish`]
//! precomputes each node's jump list so the search never scans empty slots.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::charmap::{CharMap, CharMapError};

/// A trie node. The root of a word list's trie is also a `Trie`.
#[derive(Debug, Default)]
pub struct Trie {
    /// Distinct spellings whose normalized form ends here.
    values: Vec<String>,
    /// Child slots keyed by character index; absent children are `None`.
    children: Vec<Option<Box<Trie>>>,
    /// Sorted indices of the children that exist.
    jump_list: Vec<usize>,
    terminal: bool,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a finished trie from a word list.
    pub fn from_words<S: AsRef<str>>(charmap: &CharMap, words: &[S]) -> Result<Self, CharMapError> {
        let mut trie = Trie::new();
        for word in words {
            let word = word.as_ref();
            let translation = charmap.translate(word)?;
            if translation.is_empty() {
                continue;
            }
            trie.insert(word, &translation);
        }
        trie.finish();
        Ok(trie)
    }

    /// Store `word` under its translated path.
    ///
    /// Spellings sharing a normalized form accumulate at one node; an exact
    /// duplicate is not added twice.
    pub fn insert(&mut self, word: &str, translation: &[usize]) {
        let mut node = self;
        for &i in translation {
            if i >= node.children.len() {
                node.children.resize_with(i + 1, || None);
            }
            node = node.children[i]
                .get_or_insert_with(|| Box::new(Trie::new()))
                .as_mut();
        }
        if !node.values.iter().any(|v| v == word) {
            node.values.push(word.to_string());
        }
        node.terminal = true;
    }

    /// Compute jump lists for this node and every descendant.
    pub fn finish(&mut self) {
        self.jump_list = self
            .children
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|_| i))
            .collect();
        for child in self.children.iter_mut().flatten() {
            child.finish();
        }
    }

    /// Child reached by character index `i`.
    pub fn child(&self, i: usize) -> Option<&Trie> {
        self.children.get(i).and_then(|c| c.as_deref())
    }

    pub fn jump_list(&self) -> &[usize] {
        &self.jump_list
    }

    /// Whether a complete word ends at this node.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Number of distinct spellings stored in this subtree.
    pub fn word_count(&self) -> usize {
        self.values.len()
            + self
                .children
                .iter()
                .flatten()
                .map(|c| c.word_count())
                .sum::<usize>()
    }
}

/// Finished tries keyed by word-list name.
#[derive(Debug, Default, Clone)]
pub struct TrieCatalog {
    tries: FxHashMap<String, Arc<Trie>>,
}

impl TrieCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, trie: Trie) {
        self.tries.insert(name.into(), Arc::new(trie));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Trie>> {
        self.tries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tries.is_empty()
    }

    /// List names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[path = "tests/trie.rs"]
mod tests;
