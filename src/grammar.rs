//! Grammar compiler.
//!
//! Rule syntax, one rule per line:
//! - `Name -> elem elem ... | elem ...` - alternatives separated by `|`
//! - `<list>` - one word from a word list
//! - `name` - reference to another rule
//! - suffix `?`, `*`, `+`, `{n}`, `{n,}` or `{n,m}` - repetition
//! - `#` starts a comment; whitespace runs collapse to one space
//!
//! Lines defining the same name are merged as alternatives. The first rule
//! is the one the whole phrase must match. References are resolved by
//! repeatedly substituting copies of fully resolved rules until none remain.

use rustc_hash::FxHashMap;
use std::fmt;

use crate::automaton::Automaton;
use crate::node::{Network, NodeId};
use crate::trace::{info, trace};

/// Compilation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GrammarError {
    /// Malformed or duplicate rule. `line` is 1-based; `None` concerns the
    /// grammar as a whole.
    BadRule {
        line: Option<usize>,
        text: String,
        reason: String,
    },
    /// These rules never became free of references; the grammar has a cycle
    /// with no way out and is not a finite automaton.
    Recursion { unresolved: Vec<String> },
}

impl GrammarError {
    fn bad_rule(line: usize, text: &str, reason: impl Into<String>) -> Self {
        GrammarError::BadRule {
            line: Some(line),
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::BadRule {
                line: Some(line),
                text,
                reason,
            } => write!(f, "line {}: {}: {}", line, reason, text),
            GrammarError::BadRule { line: None, reason, .. } => write!(f, "{}", reason),
            GrammarError::Recursion { unresolved } => write!(
                f,
                "recursive rules cannot be reduced to a finite automaton: {}",
                unresolved.join(", ")
            ),
        }
    }
}

impl std::error::Error for GrammarError {}

/// A parsed, possibly unresolved, rule set.
pub struct Grammar {
    network: Network,
    /// Rule name and its root `Alternater`, in order of first definition.
    rules: Vec<(String, NodeId)>,
}

impl Grammar {
    /// Parse rule lines. References are left unresolved; a name no line
    /// defines surfaces later as a stalled resolution.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self, GrammarError> {
        let mut network = Network::new();
        let mut rules: Vec<(String, NodeId)> = Vec::new();
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        let mut seen: FxHashMap<String, usize> = FxHashMap::default();

        for (i, raw) in lines.iter().enumerate() {
            let raw = raw.as_ref();
            let line_no = i + 1;
            let line = normalize_line(raw);
            if line.is_empty() {
                continue;
            }
            if let Some(&earlier) = seen.get(&line) {
                return Err(GrammarError::bad_rule(
                    line_no,
                    raw,
                    format!("duplicate rule (first on line {})", earlier),
                ));
            }
            seen.insert(line.clone(), line_no);

            let (name, alternatives) = parse_rule(&mut network, &line)
                .map_err(|reason| GrammarError::bad_rule(line_no, raw, reason))?;

            let root = match index.get(&name) {
                Some(&k) => rules[k].1,
                None => {
                    let root = network.alternater(Vec::new());
                    index.insert(name.clone(), rules.len());
                    rules.push((name, root));
                    root
                }
            };
            for alt in alternatives {
                network.push_alternative(root, alt);
            }
        }

        if rules.is_empty() {
            return Err(GrammarError::BadRule {
                line: None,
                text: String::new(),
                reason: "no rules in grammar".to_string(),
            });
        }
        Ok(Self { network, rules })
    }

    /// Rule names in order of first definition; the first is the top rule.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Whether rule `name` still contains references.
    pub fn is_resolved(&self, name: &str) -> Option<bool> {
        self.rules
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, root)| self.network.is_resolved(root))
    }

    /// Substitute resolved rules into unresolved ones until every rule is
    /// resolved, or fail when an iteration makes no progress.
    pub fn resolve(&mut self) -> Result<(), GrammarError> {
        let mut understood = 0;
        loop {
            let resolved: FxHashMap<String, NodeId> = self
                .rules
                .iter()
                .filter(|&&(_, root)| self.network.is_resolved(root))
                .map(|(name, root)| (name.clone(), *root))
                .collect();
            if resolved.len() == self.rules.len() {
                return Ok(());
            }
            if resolved.len() == understood {
                let mut unresolved: Vec<String> = self
                    .rules
                    .iter()
                    .filter(|(name, _)| !resolved.contains_key(name))
                    .map(|(name, _)| name.clone())
                    .collect();
                unresolved.sort();
                return Err(GrammarError::Recursion { unresolved });
            }
            understood = resolved.len();
            trace!(resolved = understood, "substituting resolved rules");

            for &(_, root) in &self.rules {
                if !resolved.values().any(|&r| r == root) {
                    self.network.replace_references(root, &resolved);
                }
            }
        }
    }

    /// Resolve and reduce to an automaton.
    pub fn compile(mut self) -> Result<Automaton, GrammarError> {
        self.resolve()?;
        let top = self.rules[0].1;
        let automaton = Automaton::assemble(&mut self.network, top).map_err(|e| {
            GrammarError::Recursion {
                unresolved: vec![e.0],
            }
        })?;
        info!(
            rules = self.rules.len(),
            states = automaton.len(),
            "grammar compiled"
        );
        Ok(automaton)
    }
}

/// Parse and compile rule lines into an automaton.
pub fn compile<S: AsRef<str>>(lines: &[S]) -> Result<Automaton, GrammarError> {
    Grammar::parse(lines)?.compile()
}

/// Strip the comment, collapse whitespace and tighten the `->` separator.
pub fn normalize_line(line: &str) -> String {
    let content = match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    };
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.find("->") {
        Some(i) => format!(
            "{}->{}",
            collapsed[..i].trim_end(),
            collapsed[i + 2..].trim_start()
        ),
        None => collapsed,
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_word_char)
}

/// Parse a normalized rule line into its name and alternatives.
fn parse_rule(network: &mut Network, line: &str) -> Result<(String, Vec<NodeId>), String> {
    let (name, body) = line
        .split_once("->")
        .ok_or_else(|| "expected '->'".to_string())?;
    if !is_word(name) {
        return Err(format!("invalid rule name '{}'", name));
    }
    if body.is_empty() {
        return Err("empty rule body".to_string());
    }
    let alternatives = body
        .split('|')
        .map(|alt| parse_alternative(network, alt.trim()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name.to_string(), alternatives))
}

fn parse_alternative(network: &mut Network, alternative: &str) -> Result<NodeId, String> {
    if alternative.is_empty() {
        return Err("empty alternative".to_string());
    }
    let mut elements = alternative
        .split(' ')
        .map(|e| parse_element(network, e))
        .collect::<Result<Vec<_>, _>>()?;
    if elements.len() == 1 {
        Ok(elements.remove(0))
    } else {
        Ok(network.sequence(elements))
    }
}

fn parse_element(network: &mut Network, element: &str) -> Result<NodeId, String> {
    let (base, quantifier) = if let Some(rest) = element.strip_prefix('<') {
        let close = rest
            .find('>')
            .ok_or_else(|| format!("unclosed '<' in '{}'", element))?;
        let list = &rest[..close];
        if !is_word(list) {
            return Err(format!("invalid word list name in '{}'", element));
        }
        (network.terminal(list), &rest[close + 1..])
    } else {
        let end = element
            .find(|c: char| !is_word_char(c))
            .unwrap_or(element.len());
        if end == 0 {
            return Err(format!("cannot parse expression '{}'", element));
        }
        (network.placeholder(&element[..end]), &element[end..])
    };

    let (low, high) = match quantifier {
        "" => return Ok(base),
        "?" => (0, Some(1)),
        "*" => (0, None),
        "+" => (1, None),
        q => parse_repetition(q).ok_or_else(|| format!("cannot parse expression '{}'", element))?,
    };
    if let Some(high) = high {
        if high < low {
            return Err(format!(
                "repetition upper bound below lower bound in '{}'",
                element
            ));
        }
    }
    Ok(network.repeater(base, low, high))
}

/// `{n}`, `{n,}` or `{n,m}`.
fn parse_repetition(q: &str) -> Option<(usize, Option<usize>)> {
    let inner = q.strip_prefix('{')?.strip_suffix('}')?;
    let digits = |s: &str| -> Option<usize> {
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            s.parse().ok()
        } else {
            None
        }
    };
    match inner.split_once(',') {
        None => {
            let n = digits(inner)?;
            Some((n, Some(n)))
        }
        Some((low, "")) => Some((digits(low)?, None)),
        Some((low, high)) => Some((digits(low)?, Some(digits(high)?))),
    }
}

#[cfg(test)]
#[path = "tests/grammar.rs"]
mod tests;
