//! Search states.
//!
//! A [`WorkInProgress`] is one step of a partial phrase: where we are in the
//! automaton, where we are in the current word's trie, and which letters are
//! still unplaced. States are immutable and link to their predecessor, so
//! branches share their common history.

use std::sync::Arc;

use crate::automaton::StateId;
use crate::charmap::CharCount;
use crate::trie::Trie;

#[derive(Debug)]
pub struct WorkInProgress<'a> {
    trie: &'a Trie,
    node: StateId,
    count: CharCount,
    previous: Option<Arc<WorkInProgress<'a>>>,
    /// Created by crossing an automaton edge, so a new word starts here.
    over_edge: bool,
}

impl<'a> WorkInProgress<'a> {
    /// Initial state at a Terminal's trie root with the whole phrase unplaced.
    pub fn seed(trie: &'a Trie, node: StateId, count: CharCount) -> Self {
        Self {
            trie,
            node,
            count,
            previous: None,
            over_edge: true,
        }
    }

    /// One letter further into the current word.
    pub fn descend(self: &Arc<Self>, child: &'a Trie, count: CharCount) -> Self {
        Self {
            trie: child,
            node: self.node,
            count,
            previous: Some(Arc::clone(self)),
            over_edge: false,
        }
    }

    /// Finish the current word and start one from `root` at `node`.
    pub fn cross(self: &Arc<Self>, node: StateId, root: &'a Trie) -> Self {
        Self {
            trie: root,
            node,
            count: self.count.clone(),
            previous: Some(Arc::clone(self)),
            over_edge: true,
        }
    }

    pub fn trie(&self) -> &'a Trie {
        self.trie
    }

    pub fn node(&self) -> StateId {
        self.node
    }

    pub fn count(&self) -> &CharCount {
        &self.count
    }

    pub fn previous(&self) -> Option<&WorkInProgress<'a>> {
        self.previous.as_deref()
    }

    pub fn over_edge(&self) -> bool {
        self.over_edge
    }
}

/// A state that consumed every letter and reached End.
#[derive(Debug, Clone)]
pub struct CompletedState<'a> {
    last: Arc<WorkInProgress<'a>>,
}

impl<'a> CompletedState<'a> {
    pub(crate) fn new(last: Arc<WorkInProgress<'a>>) -> Self {
        Self { last }
    }

    pub fn last(&self) -> &WorkInProgress<'a> {
        &self.last
    }

    /// Every literal word sequence this state stands for.
    ///
    /// A trie node with several spellings multiplies the result, one
    /// sequence per spelling.
    pub fn phrases(&self) -> Vec<Vec<String>> {
        // Words are collected back to front.
        let mut sequences: Vec<Vec<&str>> = vec![Vec::new()];
        let mut word_ends_here = true;
        let mut cursor = Some(&*self.last);
        while let Some(state) = cursor {
            if word_ends_here {
                match state.trie.values() {
                    [] => {}
                    [only] => {
                        for seq in &mut sequences {
                            seq.push(only);
                        }
                    }
                    spellings => {
                        sequences = sequences
                            .iter()
                            .flat_map(|seq| {
                                spellings.iter().map(move |s| {
                                    let mut next = seq.clone();
                                    next.push(s);
                                    next
                                })
                            })
                            .collect();
                    }
                }
            }
            word_ends_here = state.over_edge;
            cursor = state.previous();
        }
        sequences
            .into_iter()
            .map(|seq| seq.into_iter().rev().map(str::to_string).collect())
            .collect()
    }

    /// Number of words in each of this state's phrases.
    pub fn word_count(&self) -> usize {
        let mut words = 0;
        let mut word_ends_here = true;
        let mut cursor = Some(&*self.last);
        while let Some(state) = cursor {
            if word_ends_here {
                words += 1;
            }
            word_ends_here = state.over_edge;
            cursor = state.previous();
        }
        words
    }
}

#[cfg(test)]
#[path = "tests/work.rs"]
mod tests;
