use anagrammar::{compile, Engine, SearchOptions, WordLists};
use proptest::prelude::*;

const GRAMMAR: [&str; 2] = ["TOP -> Word{1,3}", "Word -> <w>"];

fn word_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!['a', 'b', 'c', 'd']), 1..=3)
        .prop_map(|chars| chars.into_iter().collect())
}

prop_compose! {
    // A word list and a phrase built from one to three of its words.
    fn case_strategy()
        (words in prop::collection::vec(word_strategy(), 2..=5))
        (picks in prop::collection::vec(0..words.len(), 1..=3), words in Just(words))
        -> (Vec<String>, String)
    {
        let phrase: String = picks.iter().map(|&i| words[i].as_str()).collect();
        (words, phrase)
    }
}

fn engine(words: &[String], threads: usize) -> Engine {
    let automaton = compile(&GRAMMAR).expect("grammar compiles");
    let mut lists = WordLists::new();
    lists.insert("w".to_string(), words.to_vec());
    Engine::new(automaton, &lists, threads).expect("engine builds")
}

fn sorted_phrases(engine: &mut Engine, input: &str, options: SearchOptions) -> Vec<Vec<String>> {
    let mut phrases = engine
        .collect_phrases(input, options)
        .expect("phrase is representable");
    phrases.sort();
    phrases
}

fn sorted_chars(s: &str) -> Vec<char> {
    let mut chars: Vec<char> = s.chars().collect();
    chars.sort_unstable();
    chars
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn every_phrase_uses_exactly_the_input_letters((words, phrase) in case_strategy()) {
        let mut engine = engine(&words, 2);
        let found = sorted_phrases(&mut engine, &phrase, SearchOptions::new());
        prop_assert!(!found.is_empty(), "the phrase itself is a solution");
        let expected = sorted_chars(&phrase);
        for p in &found {
            prop_assert!((1..=3).contains(&p.len()));
            prop_assert!(p.iter().all(|w| words.contains(w)));
            prop_assert_eq!(sorted_chars(&p.concat()), expected.clone());
        }
    }

    #[test]
    fn thread_count_does_not_change_the_result_set((words, phrase) in case_strategy()) {
        let single = sorted_phrases(&mut engine(&words, 1), &phrase, SearchOptions::new());
        let many = sorted_phrases(&mut engine(&words, 4), &phrase, SearchOptions::new());
        prop_assert_eq!(single, many);
    }

    #[test]
    fn random_order_does_not_change_the_result_set((words, phrase) in case_strategy()) {
        let mut engine = engine(&words, 3);
        let fixed = sorted_phrases(&mut engine, &phrase, SearchOptions::new());
        let shuffled = sorted_phrases(&mut engine, &phrase, SearchOptions::new().random());
        prop_assert_eq!(fixed, shuffled);
    }
}
