use crate::automaton::{Automaton, StateId};
use crate::engine::{Engine, SearchOptions};
use crate::grammar::compile;
use crate::lexicon::WordLists;

pub(crate) fn word_lists(entries: &[(&str, &[&str])]) -> WordLists {
    entries
        .iter()
        .map(|(name, words)| {
            (
                name.to_string(),
                words.iter().map(|w| w.to_string()).collect(),
            )
        })
        .collect()
}

/// Whether the automaton accepts this sequence of list names.
pub(crate) fn accepts(automaton: &Automaton, lists: &[&str]) -> bool {
    let mut current: Vec<StateId> = vec![automaton.start()];
    for list in lists {
        let mut next = Vec::new();
        for &s in &current {
            for &e in automaton.edges(s) {
                if automaton.list_name(e) == Some(list) && !next.contains(&e) {
                    next.push(e);
                }
            }
        }
        current = next;
    }
    current
        .iter()
        .any(|&s| automaton.edges(s).contains(&automaton.end()))
}

pub(crate) fn make_engine(grammar: &[&str], lists: &[(&str, &[&str])], threads: usize) -> Engine {
    let automaton = compile(grammar).expect("grammar compiles");
    Engine::new(automaton, &word_lists(lists), threads).expect("engine builds")
}

/// Run a search and return each phrase joined by spaces, sorted.
pub(crate) fn phrases(engine: &mut Engine, input: &str, options: SearchOptions) -> Vec<String> {
    let mut out = Vec::new();
    engine
        .run(input, options, |done| {
            for phrase in done.phrases() {
                out.push(phrase.join(" "));
            }
        })
        .expect("phrase is representable");
    out.sort();
    out
}
