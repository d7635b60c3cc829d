use super::*;
use crate::grammar::compile;
use crate::lexicon::Lexicon;
use crate::test_utils::word_lists;

fn bound(grammar: &[&str], lists: &[(&str, &[&str])]) -> (Automaton, Lexicon) {
    let mut automaton = compile(grammar).unwrap();
    let lexicon = Lexicon::build(&word_lists(lists)).unwrap();
    automaton.attach_tries(lexicon.tries()).unwrap();
    (automaton, lexicon)
}

fn seeds<'a>(
    automaton: &'a Automaton,
    lexicon: &Lexicon,
    input: &str,
) -> Vec<WorkInProgress<'a>> {
    let count = lexicon.charmap().count(input).unwrap();
    automaton
        .edges(automaton.start())
        .iter()
        .filter_map(|&e| {
            automaton
                .trie(e)
                .map(|trie| WorkInProgress::seed(trie, e, count.clone()))
        })
        .collect()
}

fn collect(
    scheduler: &Scheduler,
    automaton: &Automaton,
    lexicon: &Lexicon,
    input: &str,
) -> Vec<String> {
    let out = Mutex::new(Vec::new());
    scheduler.run(automaton, seeds(automaton, lexicon, input), |done| {
        for phrase in done.phrases() {
            out.lock().push(phrase.join(" "));
        }
    });
    let mut out = out.into_inner();
    out.sort();
    out
}

const LETTERS: &[&str] = &["a", "b", "c", "d", "e", "f", "g"];

fn scheduler(threads: usize) -> Scheduler {
    Scheduler::new(threads, Duration::from_millis(5))
}

// ========================================================================
// EXHAUSTIVE RUNS
// ========================================================================

#[test]
fn finds_every_ordering() {
    let (automaton, lexicon) = bound(&["TOP -> <w>+"], &[("w", &["a", "b", "c"])]);
    let found = collect(&scheduler(2), &automaton, &lexicon, "abc");
    assert_eq!(found, vec!["a b c", "a c b", "b a c", "b c a", "c a b", "c b a"]);
}

#[test]
fn outcome_counts_completed_states() {
    let (automaton, lexicon) = bound(&["TOP -> <w> <w>"], &[("w", &["ab", "ba", "a", "b"])]);
    let outcome = scheduler(3).run(&automaton, seeds(&automaton, &lexicon, "ab"), |_| {});
    assert_eq!(outcome.found, 2);
    assert!(!outcome.sampled);
    assert!(!outcome.cancelled);
    assert_eq!(outcome.metrics.emitted, 2);
    assert!(outcome.metrics.expanded > 0);
}

#[test]
fn no_seeds_finishes_immediately() {
    let (automaton, _) = bound(&["TOP -> <w>"], &[("w", &["a"])]);
    let outcome = scheduler(4).run(&automaton, Vec::new(), |_| panic!("nothing to find"));
    assert_eq!(outcome.found, 0);
}

#[test]
fn leftover_letters_are_dead_ends() {
    let (automaton, lexicon) = bound(&["TOP -> <w> <w>"], &[("w", &["a", "b"])]);
    assert!(collect(&scheduler(2), &automaton, &lexicon, "abb").is_empty());
}

#[test]
fn thread_count_does_not_change_results() {
    let (automaton, lexicon) = bound(&["TOP -> <w>{1,4}"], &[("w", &["ab", "ba", "a", "b", "c"])]);
    let single = collect(&scheduler(1), &automaton, &lexicon, "abcab");
    let many = collect(&scheduler(6), &automaton, &lexicon, "abcab");
    assert!(!single.is_empty());
    assert_eq!(single, many);
}

#[test]
fn random_order_finds_the_same_set() {
    let (automaton, lexicon) = bound(&["TOP -> <w>+"], &[("w", LETTERS)]);
    let fixed = collect(&scheduler(2), &automaton, &lexicon, "abcde");
    let shuffled = collect(&scheduler(2).with_random(true), &automaton, &lexicon, "abcde");
    assert_eq!(fixed.len(), 120);
    assert_eq!(fixed, shuffled);
}

// ========================================================================
// EARLY EXITS
// ========================================================================

#[test]
fn sample_stops_after_n_results() {
    let (automaton, lexicon) = bound(&["TOP -> <w>+"], &[("w", LETTERS)]);
    let mut handled = 0;
    let outcome = scheduler(4).with_sample(Some(3)).run(
        &automaton,
        seeds(&automaton, &lexicon, "abcdefg"),
        |_| handled += 1,
    );
    assert_eq!(handled, 3);
    assert_eq!(outcome.found, 3);
    assert!(outcome.sampled);
}

#[test]
fn sample_of_zero_does_nothing() {
    let (automaton, lexicon) = bound(&["TOP -> <w>"], &[("w", &["a"])]);
    let outcome = scheduler(1).with_sample(Some(0)).run(
        &automaton,
        seeds(&automaton, &lexicon, "a"),
        |_| panic!("sample is empty"),
    );
    assert_eq!(outcome.found, 0);
}

#[test]
fn cancel_flag_abandons_the_run() {
    let (automaton, lexicon) = bound(&["TOP -> <w>+"], &[("w", LETTERS)]);
    let flag = Arc::new(AtomicBool::new(false));
    let trigger = flag.clone();
    let outcome = scheduler(2).with_cancel(Some(flag)).run(
        &automaton,
        seeds(&automaton, &lexicon, "abcdefg"),
        move |_| {
            if !trigger.swap(true, Ordering::AcqRel) {
                // Hold this result until the controller notices.
                thread::sleep(Duration::from_millis(50));
            }
        },
    );
    assert!(outcome.cancelled);
    assert!(outcome.found < 5040);
}
