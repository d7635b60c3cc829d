//! Character index plus one trie per word list.

use std::collections::HashMap;

use crate::charmap::{CharMap, CharMapBuilder, CharMapError, Normalizer};
use crate::trace::debug;
use crate::trie::{Trie, TrieCatalog};

/// Word lists as handed over by the loading collaborator.
pub type WordLists = HashMap<String, Vec<String>>;

/// The immutable data a search reads: the index and the tries built with it.
#[derive(Debug, Clone)]
pub struct Lexicon {
    charmap: CharMap,
    tries: TrieCatalog,
}

impl Lexicon {
    /// Build the index from every list, then a trie per list.
    pub fn build(word_lists: &WordLists) -> Result<Self, CharMapError> {
        Self::build_with(CharMapBuilder::new(), word_lists)
    }

    /// Like [`Lexicon::build`] with a custom character normalizer.
    pub fn build_with_normalizer(
        normalizer: Normalizer,
        word_lists: &WordLists,
    ) -> Result<Self, CharMapError> {
        Self::build_with(CharMapBuilder::with_normalizer(normalizer), word_lists)
    }

    fn build_with(
        mut builder: CharMapBuilder,
        word_lists: &WordLists,
    ) -> Result<Self, CharMapError> {
        for words in word_lists.values() {
            builder.add_words(words);
        }
        let charmap = builder.build();

        let mut tries = TrieCatalog::new();
        for (name, words) in word_lists {
            let trie = Trie::from_words(&charmap, words)?;
            debug!(list = %name, words = trie.word_count(), "trie built");
            tries.insert(name.clone(), trie);
        }
        debug!(lists = tries.len(), alphabet = charmap.len(), "lexicon built");

        Ok(Self { charmap, tries })
    }

    pub fn charmap(&self) -> &CharMap {
        &self.charmap
    }

    pub fn tries(&self) -> &TrieCatalog {
        &self.tries
    }
}

#[cfg(test)]
#[path = "tests/lexicon.rs"]
mod tests;
