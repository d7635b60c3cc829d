use super::*;
use crate::charmap::{CharMap, CharMapBuilder};

fn setup(words: &[&str]) -> (CharMap, Trie) {
    let mut builder = CharMapBuilder::new();
    builder.add_words(words);
    let charmap = builder.build();
    let trie = Trie::from_words(&charmap, words).unwrap();
    (charmap, trie)
}

/// Walk `word` down from `state`, one letter per state.
fn spell<'a>(
    charmap: &CharMap,
    mut state: Arc<WorkInProgress<'a>>,
    word: &str,
) -> Arc<WorkInProgress<'a>> {
    for c in word.chars() {
        let i = charmap.index_of(c).unwrap();
        let child = state.trie().child(i).unwrap();
        let count = state.count().decrement(i).unwrap();
        state = Arc::new(state.descend(child, count));
    }
    state
}

// ========================================================================
// STATE TRANSITIONS
// ========================================================================

#[test]
fn descend_keeps_node_and_links_back() {
    let (charmap, trie) = setup(&["ab"]);
    let seed = Arc::new(WorkInProgress::seed(&trie, 2, charmap.count("ab").unwrap()));
    let after = spell(&charmap, seed.clone(), "a");

    assert_eq!(after.node(), 2);
    assert!(!after.over_edge());
    assert_eq!(after.count().total(), 1);
    assert_eq!(seed.count().total(), 2, "seed count untouched");
    assert!(std::ptr::eq(after.previous().unwrap(), &*seed));
}

#[test]
fn cross_resets_trie_and_keeps_count() {
    let (charmap, trie) = setup(&["ab", "b"]);
    let seed = Arc::new(WorkInProgress::seed(&trie, 2, charmap.count("abb").unwrap()));
    let word = spell(&charmap, seed, "ab");
    let crossed = word.cross(3, &trie);

    assert_eq!(crossed.node(), 3);
    assert!(crossed.over_edge());
    assert!(std::ptr::eq(crossed.trie(), &trie));
    assert_eq!(crossed.count(), word.count());
}

// ========================================================================
// PHRASE RECONSTRUCTION
// ========================================================================

#[test]
fn single_word_phrase() {
    let (charmap, trie) = setup(&["cat"]);
    let seed = Arc::new(WorkInProgress::seed(&trie, 2, charmap.count("cat").unwrap()));
    let done = CompletedState::new(spell(&charmap, seed, "cat"));
    assert_eq!(done.phrases(), vec![vec!["cat".to_string()]]);
    assert_eq!(done.word_count(), 1);
}

#[test]
fn words_come_out_in_order() {
    let (charmap, trie) = setup(&["ab", "b", "ba"]);
    let seed = Arc::new(WorkInProgress::seed(&trie, 2, charmap.count("abbba").unwrap()));
    let first = spell(&charmap, seed, "ab");
    let second = spell(&charmap, Arc::new(first.cross(3, &trie)), "b");
    let third = spell(&charmap, Arc::new(second.cross(4, &trie)), "ba");

    let done = CompletedState::new(third);
    assert!(done.last().count().is_empty());
    assert_eq!(done.phrases(), vec![vec!["ab", "b", "ba"]]);
    assert_eq!(done.word_count(), 3);
}

#[test]
fn prefix_word_inside_longer_word_is_not_split() {
    // "a" is a word too, but the path never crossed an edge after it.
    let (charmap, trie) = setup(&["a", "ab"]);
    let seed = Arc::new(WorkInProgress::seed(&trie, 2, charmap.count("ab").unwrap()));
    let done = CompletedState::new(spell(&charmap, seed, "ab"));
    assert_eq!(done.phrases(), vec![vec!["ab"]]);
}

#[test]
fn alternative_spellings_multiply_phrases() {
    let (charmap, trie) = setup(&["Ab", "ab", "c", "C"]);
    let seed = Arc::new(WorkInProgress::seed(&trie, 2, charmap.count("abc").unwrap()));
    let first = spell(&charmap, seed, "ab");
    let second = spell(&charmap, Arc::new(first.cross(3, &trie)), "c");

    let mut phrases = CompletedState::new(second).phrases();
    phrases.sort();
    assert_eq!(
        phrases,
        vec![
            vec!["Ab", "C"],
            vec!["Ab", "c"],
            vec!["ab", "C"],
            vec!["ab", "c"],
        ]
    );
}

#[test]
fn shared_history_serves_several_branches() {
    let (charmap, trie) = setup(&["a", "b", "c"]);
    let seed = Arc::new(WorkInProgress::seed(&trie, 2, charmap.count("abc").unwrap()));
    let a = spell(&charmap, seed, "a");
    let root = Arc::new(a.cross(3, &trie));
    let ab = spell(&charmap, root.clone(), "b");
    let ac = spell(&charmap, root, "c");

    assert_eq!(CompletedState::new(ab).phrases(), vec![vec!["a", "b"]]);
    assert_eq!(CompletedState::new(ac).phrases(), vec![vec!["a", "c"]]);
}
