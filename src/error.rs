//! Crate-level error covering every failure a caller can cause.

use std::fmt;
use std::io;

use crate::automaton::BindError;
use crate::charmap::CharMapError;
use crate::grammar::GrammarError;

#[derive(Debug)]
pub enum Error {
    Grammar(GrammarError),
    Bind(BindError),
    CharMap(CharMapError),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Grammar(e) => write!(f, "{}", e),
            Error::Bind(e) => write!(f, "{}", e),
            Error::CharMap(e) => write!(f, "{}", e),
            Error::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Grammar(e) => Some(e),
            Error::Bind(e) => Some(e),
            Error::CharMap(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<GrammarError> for Error {
    fn from(e: GrammarError) -> Self {
        Error::Grammar(e)
    }
}

impl From<BindError> for Error {
    fn from(e: BindError) -> Self {
        Error::Bind(e)
    }
}

impl From<CharMapError> for Error {
    fn from(e: CharMapError) -> Self {
        Error::CharMap(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
