//! Engine - Top-level search over a bound automaton.
//!
//! The Engine owns an automaton whose Terminals are bound to the tries of a
//! [`Lexicon`], and runs searches by:
//! 1. Counting the input phrase's letters
//! 2. Seeding one state per Start edge into a Terminal
//! 3. Handing the seeds to the [`Scheduler`] and each completed state to the
//!    caller's handler

use parking_lot::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::automaton::{Automaton, BindError};
use crate::charmap::{CharMapError, Normalizer};
use crate::config::EngineConfig;
use crate::error::Error;
use crate::grammar;
use crate::lexicon::{Lexicon, WordLists};
use crate::scheduler::Scheduler;
use crate::trace::info;
use crate::work::{CompletedState, WorkInProgress};

/// Per-run overrides of the engine's [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Stop after this many completed states.
    pub sample: Option<usize>,
    /// Shuffle expansion order.
    pub random: bool,
    /// Abandon the run once this flag is set.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(mut self, n: usize) -> Self {
        self.sample = Some(n);
        self
    }

    pub fn random(mut self) -> Self {
        self.random = true;
        self
    }

    pub fn cancel_on(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }
}

/// Summary of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchReport {
    /// Completed states handed to the handler.
    pub found: usize,
    /// Initial states seeded from Start.
    pub seeds: usize,
    /// Search states expanded by the workers.
    pub expanded: u64,
    /// The run stopped because the sample was full.
    pub sampled: bool,
    /// The run stopped because the cancel flag was set.
    pub cancelled: bool,
}

/// Search engine for one grammar and one set of word lists.
///
/// The automaton and lexicon are read-only during a run and reused across
/// runs.
#[derive(Debug)]
pub struct Engine {
    automaton: Automaton,
    lexicon: Lexicon,
    config: EngineConfig,
    found: usize,
}

impl Engine {
    /// Build the lexicon from the lists `automaton` needs and bind them.
    pub fn new(
        automaton: Automaton,
        word_lists: &WordLists,
        threads: usize,
    ) -> Result<Self, Error> {
        Self::with_config(
            automaton,
            word_lists,
            EngineConfig::default().with_threads(threads),
        )
    }

    /// Create an Engine with an explicit configuration.
    pub fn with_config(
        automaton: Automaton,
        word_lists: &WordLists,
        config: EngineConfig,
    ) -> Result<Self, Error> {
        let needed = required_word_lists(&automaton, word_lists)?;
        let lexicon = Lexicon::build(&needed)?;
        Ok(Self::with_lexicon(automaton, lexicon, config)?)
    }

    /// Like [`Engine::with_config`] with a custom character normalizer.
    pub fn with_normalizer(
        automaton: Automaton,
        word_lists: &WordLists,
        normalizer: Normalizer,
        config: EngineConfig,
    ) -> Result<Self, Error> {
        let needed = required_word_lists(&automaton, word_lists)?;
        let lexicon = Lexicon::build_with_normalizer(normalizer, &needed)?;
        Ok(Self::with_lexicon(automaton, lexicon, config)?)
    }

    /// Create an Engine over an already built lexicon.
    pub fn with_lexicon(
        mut automaton: Automaton,
        lexicon: Lexicon,
        config: EngineConfig,
    ) -> Result<Self, BindError> {
        automaton.attach_tries(lexicon.tries())?;
        Ok(Self {
            automaton,
            lexicon,
            config,
            found: 0,
        })
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Completed states handled in the most recent run.
    pub fn found(&self) -> usize {
        self.found
    }

    /// Search for every phrase that uses exactly the letters of `input`.
    ///
    /// `handler` is called on a dedicated thread for each completed state.
    /// Fails before searching if `input` has a letter outside the index.
    pub fn run<F>(
        &mut self,
        input: &str,
        options: SearchOptions,
        handler: F,
    ) -> Result<SearchReport, CharMapError>
    where
        F: for<'s> FnMut(CompletedState<'s>) + Send,
    {
        let count = self.lexicon.charmap().count(input)?;

        let automaton = &self.automaton;
        let seeds: Vec<WorkInProgress<'_>> = automaton
            .edges(automaton.start())
            .iter()
            .filter_map(|&e| {
                automaton
                    .trie(e)
                    .map(|trie| WorkInProgress::seed(trie, e, count.clone()))
            })
            .collect();
        let seed_count = seeds.len();

        let sample = options.sample.or(self.config.sample);
        let random = options.random || self.config.random;
        info!(
            seeds = seed_count,
            threads = self.config.threads,
            ?sample,
            random,
            "run started"
        );

        let outcome = Scheduler::new(self.config.threads, self.config.poll_interval)
            .with_sample(sample)
            .with_random(random)
            .with_cancel(options.cancel)
            .run(automaton, seeds, handler);

        self.found = outcome.found;
        info!(
            found = outcome.found,
            expanded = outcome.metrics.expanded,
            cancelled = outcome.cancelled,
            "run finished"
        );

        Ok(SearchReport {
            found: outcome.found,
            seeds: seed_count,
            expanded: outcome.metrics.expanded,
            sampled: outcome.sampled,
            cancelled: outcome.cancelled,
        })
    }

    /// Collect every phrase of a run as word sequences.
    pub fn collect_phrases(
        &mut self,
        input: &str,
        options: SearchOptions,
    ) -> Result<Vec<Vec<String>>, CharMapError> {
        let out = Mutex::new(Vec::new());
        self.run(input, options, |done| out.lock().extend(done.phrases()))?;
        Ok(out.into_inner())
    }

    /// Count the completed states of a run.
    pub fn count_completed(
        &mut self,
        input: &str,
        options: SearchOptions,
    ) -> Result<usize, CharMapError> {
        Ok(self.run(input, options, |_| {})?.found)
    }
}

/// The subset of `word_lists` that `automaton` refers to.
fn required_word_lists(
    automaton: &Automaton,
    word_lists: &WordLists,
) -> Result<WordLists, BindError> {
    automaton
        .required_lists()
        .into_iter()
        .map(|name| match word_lists.get(&name) {
            Some(words) => Ok((name, words.clone())),
            None => Err(BindError::MissingWordlist(name)),
        })
        .collect()
}

/// Convenience function: compile, bind and collect every phrase.
pub fn anagrams<S: AsRef<str>>(
    grammar_lines: &[S],
    word_lists: &WordLists,
    input: &str,
) -> Result<Vec<Vec<String>>, Error> {
    let automaton = grammar::compile(grammar_lines)?;
    let mut engine = Engine::with_config(automaton, word_lists, EngineConfig::default())?;
    Ok(engine.collect_phrases(input, SearchOptions::default())?)
}

#[cfg(test)]
#[path = "tests/engine.rs"]
mod tests;
