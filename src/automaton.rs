//! The compiled automaton: only Start, End and Terminal states survive.
//!
//! Edges carry no label. Reaching a Terminal means the next word comes from
//! that Terminal's list. Terminals may branch and merge, so the automaton is
//! nondeterministic; the search resolves which path a phrase takes.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::node::{Network, NodeId, NodeKind, UnresolvedReference};
use crate::trie::{Trie, TrieCatalog};

/// Index of a state in an [`Automaton`].
pub type StateId = u32;

/// A Terminal names a list that the catalog does not contain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindError {
    MissingWordlist(String),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::MissingWordlist(name) => write!(f, "cannot find word list '{}'", name),
        }
    }
}

impl std::error::Error for BindError {}

#[derive(Clone, Debug)]
pub enum StateKind {
    Start,
    End,
    Terminal {
        list: String,
        trie: Option<Arc<Trie>>,
    },
}

#[derive(Clone, Debug)]
pub struct State {
    pub kind: StateKind,
    pub edges: Vec<StateId>,
}

/// Compiled grammar. Immutable during a search.
#[derive(Clone, Debug)]
pub struct Automaton {
    states: Vec<State>,
}

const START: StateId = 0;
const END: StateId = 1;

impl Automaton {
    /// Lower `top` under a fresh Start and End, then splice out every Join.
    ///
    /// When `top` is an alternation each alternative hangs directly off
    /// Start.
    pub fn assemble(network: &mut Network, top: NodeId) -> Result<Self, UnresolvedReference> {
        let start = network.add(NodeKind::Start);
        let end = network.add(NodeKind::End);
        let branches = match network.kind(top) {
            NodeKind::Alternater(alts) => alts.clone(),
            _ => vec![top],
        };
        for branch in branches {
            let pipe = network.reduce(branch)?;
            network.add_edge(start, pipe.entry);
            network.add_edge(pipe.exit, end);
        }
        Ok(Self::simplify(network, start, end))
    }

    /// Keep Start, End and Terminals; every kept node's edges become the kept
    /// nodes reachable through chains of Joins.
    fn simplify(network: &Network, start: NodeId, end: NodeId) -> Self {
        let mut ids: FxHashMap<NodeId, StateId> = FxHashMap::default();
        ids.insert(start, START);
        ids.insert(end, END);
        let mut order = vec![start, end];
        let mut states = Vec::new();

        let mut next = 0;
        while next < order.len() {
            let n = order[next];
            next += 1;
            let mut edges = Vec::new();
            for target in kept_successors(network, n) {
                let id = *ids.entry(target).or_insert_with(|| {
                    order.push(target);
                    (order.len() - 1) as StateId
                });
                edges.push(id);
            }
            let kind = match network.kind(n) {
                NodeKind::Start => StateKind::Start,
                NodeKind::End => StateKind::End,
                NodeKind::Terminal(list) => StateKind::Terminal {
                    list: list.clone(),
                    trie: None,
                },
                _ => unreachable!("only kept nodes are queued"),
            };
            states.push(State { kind, edges });
        }
        Self { states }
    }

    pub fn start(&self) -> StateId {
        START
    }

    pub fn end(&self) -> StateId {
        END
    }

    /// Number of states, Start and End included.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id as usize]
    }

    pub fn edges(&self, id: StateId) -> &[StateId] {
        &self.state(id).edges
    }

    pub fn is_end(&self, id: StateId) -> bool {
        id == END
    }

    /// List name of a Terminal state.
    pub fn list_name(&self, id: StateId) -> Option<&str> {
        match &self.state(id).kind {
            StateKind::Terminal { list, .. } => Some(list),
            _ => None,
        }
    }

    /// Trie bound to a Terminal state, if binding has happened.
    pub fn trie(&self, id: StateId) -> Option<&Trie> {
        match &self.state(id).kind {
            StateKind::Terminal { trie, .. } => trie.as_deref(),
            _ => None,
        }
    }

    /// Every list name a Terminal refers to.
    pub fn required_lists(&self) -> BTreeSet<String> {
        self.states
            .iter()
            .filter_map(|s| match &s.kind {
                StateKind::Terminal { list, .. } => Some(list.clone()),
                _ => None,
            })
            .collect()
    }

    /// Bind every Terminal to its list's trie.
    ///
    /// Nothing is bound unless every list is present.
    pub fn attach_tries(&mut self, catalog: &TrieCatalog) -> Result<(), BindError> {
        if let Some(missing) = self
            .required_lists()
            .into_iter()
            .find(|name| !catalog.contains(name))
        {
            return Err(BindError::MissingWordlist(missing));
        }
        for state in &mut self.states {
            if let StateKind::Terminal { list, trie } = &mut state.kind {
                *trie = catalog.get(list).cloned();
            }
        }
        Ok(())
    }

    /// Whether every Terminal has a trie.
    pub fn is_bound(&self) -> bool {
        self.states.iter().all(|s| match &s.kind {
            StateKind::Terminal { trie, .. } => trie.is_some(),
            _ => true,
        })
    }

    /// Graphviz description of the automaton.
    pub fn graphviz_dot(&self, name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph {} {{", name);
        let _ = writeln!(out, "  label=\"{}\";", name);
        out.push_str("  fontsize=20;\n  rankdir=LR;\n  node [shape=circle,fontsize=10];\n");
        for (i, state) in self.states.iter().enumerate() {
            let attrs = match &state.kind {
                StateKind::Start => "[shape=doublecircle;label=\"IN\"]".to_string(),
                StateKind::End => "[shape=doublecircle;label=\"OUT\"]".to_string(),
                StateKind::Terminal { list, .. } => {
                    format!("[label=\"{}\"]", list.replace('"', "\\\""))
                }
            };
            let _ = writeln!(out, "  n{} {};", i, attrs);
        }
        for (i, state) in self.states.iter().enumerate() {
            for e in &state.edges {
                let _ = writeln!(out, "  n{} -> n{};", i, e);
            }
        }
        out.push_str("}\n");
        out
    }
}

/// Kept nodes reachable from `from` through Join-only paths, in edge order.
fn kept_successors(network: &Network, from: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut visited = vec![from];
    let mut stack: Vec<NodeId> = network.edges(from).iter().rev().copied().collect();
    while let Some(n) = stack.pop() {
        match network.kind(n) {
            NodeKind::Join => {
                if !visited.contains(&n) {
                    visited.push(n);
                    stack.extend(network.edges(n).iter().rev().copied());
                }
            }
            _ => {
                if !out.contains(&n) {
                    out.push(n);
                }
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/automaton.rs"]
mod tests;
