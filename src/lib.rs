pub mod automaton;
pub mod charmap;
pub mod config;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod lexicon;
pub mod node;
pub mod scheduler;
pub mod trace;
pub mod trie;
pub mod work;

pub use automaton::{Automaton, BindError};
pub use charmap::{CharMap, CharMapError};
pub use config::EngineConfig;
pub use engine::{anagrams, Engine, SearchOptions, SearchReport};
pub use error::Error;
pub use grammar::{compile, GrammarError};
pub use lexicon::{Lexicon, WordLists};
pub use work::CompletedState;

#[cfg(test)]
pub(crate) mod test_utils;
