//! Compile-time node network.
//!
//! The grammar compiler builds combinator trees (`Sequence`, `Alternater`,
//! `Repeater`, `Placeholder`) in a [`Network`] arena. [`Network::reduce`]
//! lowers a combinator into a [`Pipe`] of plain nodes: `Join` connectors and
//! `Terminal`s wired by edges. Nodes are addressed by [`NodeId`]; nothing is
//! ever removed, so abandoned templates simply stay unreachable.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::fmt;

/// Index of a node in a [`Network`].
pub type NodeId = u32;

/// What a node is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Unlabelled connector; removed when the automaton is simplified.
    Join,
    /// Entry of the whole automaton.
    Start,
    /// Accepting exit of the whole automaton.
    End,
    /// One word from the named list.
    Terminal(String),
    /// Elements matched one after another.
    Sequence(Vec<NodeId>),
    /// Any one of the alternatives.
    Alternater(Vec<NodeId>),
    /// `inner` repeated between `low` and `high` times; `None` is unbounded.
    Repeater {
        inner: NodeId,
        low: usize,
        high: Option<usize>,
    },
    /// Reference to a rule that has not been substituted yet.
    Placeholder(String),
}

impl NodeKind {
    /// Combinators exist only before reduction.
    pub fn is_combinator(&self) -> bool {
        matches!(
            self,
            NodeKind::Sequence(_)
                | NodeKind::Alternater(_)
                | NodeKind::Repeater { .. }
                | NodeKind::Placeholder(_)
        )
    }
}

/// A node and its outgoing edges.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub edges: SmallVec<[NodeId; 4]>,
}

/// Entry and exit of a reduced sub-network.
///
/// Internal edges are realized; the exit has no outgoing edges until the
/// caller wires it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pipe {
    pub entry: NodeId,
    pub exit: NodeId,
}

impl Pipe {
    pub fn new(entry: NodeId, exit: NodeId) -> Self {
        Self { entry, exit }
    }
}

/// Reduction met a rule reference that was never substituted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedReference(pub String);

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unresolved reference to rule '{}'", self.0)
    }
}

impl std::error::Error for UnresolvedReference {}

/// Arena of nodes.
#[derive(Clone, Debug, Default)]
pub struct Network {
    nodes: Vec<Node>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn edges(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).edges
    }

    pub fn add(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node {
            kind,
            edges: SmallVec::new(),
        });
        id
    }

    pub fn join(&mut self) -> NodeId {
        self.add(NodeKind::Join)
    }

    pub fn terminal(&mut self, list: impl Into<String>) -> NodeId {
        self.add(NodeKind::Terminal(list.into()))
    }

    pub fn placeholder(&mut self, rule: impl Into<String>) -> NodeId {
        self.add(NodeKind::Placeholder(rule.into()))
    }

    pub fn sequence(&mut self, items: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::Sequence(items))
    }

    pub fn alternater(&mut self, alternatives: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::Alternater(alternatives))
    }

    pub fn repeater(&mut self, inner: NodeId, low: usize, high: Option<usize>) -> NodeId {
        self.add(NodeKind::Repeater { inner, low, high })
    }

    /// Add `from -> to` unless that edge already exists.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        let edges = &mut self.nodes[from as usize].edges;
        if !edges.contains(&to) {
            edges.push(to);
        }
    }

    /// Append an alternative to an `Alternater`; other kinds are left alone.
    pub fn push_alternative(&mut self, alternater: NodeId, alternative: NodeId) {
        if let NodeKind::Alternater(alts) = &mut self.nodes[alternater as usize].kind {
            alts.push(alternative);
        }
    }

    /// Direct combinator children of a node.
    fn children(&self, id: NodeId) -> SmallVec<[NodeId; 4]> {
        match self.kind(id) {
            NodeKind::Sequence(items) | NodeKind::Alternater(items) => {
                items.iter().copied().collect()
            }
            NodeKind::Repeater { inner, .. } => SmallVec::from_slice(&[*inner]),
            _ => SmallVec::new(),
        }
    }

    /// Whether the tree under `id` contains no placeholder.
    pub fn is_resolved(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Placeholder(_) => false,
            _ => self.children(id).iter().all(|&c| self.is_resolved(c)),
        }
    }

    /// Names of every rule referenced under `id`, in first-seen order.
    pub fn references(&self, id: NodeId) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_references(id, &mut out);
        out
    }

    fn collect_references(&self, id: NodeId, out: &mut Vec<String>) {
        match self.kind(id) {
            NodeKind::Placeholder(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            _ => {
                for c in self.children(id) {
                    self.collect_references(c, out);
                }
            }
        }
    }

    /// Deep-copy the tree (and any edges) under `id`.
    ///
    /// Sharing inside the copied tree is preserved; nothing is shared with
    /// the original.
    pub fn copy_tree(&mut self, id: NodeId) -> NodeId {
        let mut seen = FxHashMap::default();
        self.copy_tree_with(id, &mut seen)
    }

    fn copy_tree_with(&mut self, id: NodeId, seen: &mut FxHashMap<NodeId, NodeId>) -> NodeId {
        if let Some(&copy) = seen.get(&id) {
            return copy;
        }
        let kind = match self.kind(id).clone() {
            NodeKind::Sequence(items) => NodeKind::Sequence(
                items
                    .into_iter()
                    .map(|c| self.copy_tree_with(c, seen))
                    .collect(),
            ),
            NodeKind::Alternater(alts) => NodeKind::Alternater(
                alts.into_iter()
                    .map(|c| self.copy_tree_with(c, seen))
                    .collect(),
            ),
            NodeKind::Repeater { inner, low, high } => NodeKind::Repeater {
                inner: self.copy_tree_with(inner, seen),
                low,
                high,
            },
            other => other,
        };
        let copy = self.add(kind);
        seen.insert(id, copy);
        let edges = self.node(id).edges.clone();
        for e in edges {
            let target = self.copy_tree_with(e, seen);
            self.add_edge(copy, target);
        }
        copy
    }

    /// Replace each placeholder under `id` whose rule appears in `resolved`
    /// with a private copy of that rule's tree. Returns whether anything
    /// changed.
    pub fn replace_references(&mut self, id: NodeId, resolved: &FxHashMap<String, NodeId>) -> bool {
        let mut changed = false;
        for (slot, child) in self.children(id).into_iter().enumerate() {
            let replacement = match self.kind(child) {
                NodeKind::Placeholder(name) => resolved.get(name).copied(),
                _ => None,
            };
            match replacement {
                Some(template) => {
                    let copy = self.copy_tree(template);
                    self.set_child(id, slot, copy);
                    changed = true;
                }
                None => changed |= self.replace_references(child, resolved),
            }
        }
        changed
    }

    fn set_child(&mut self, id: NodeId, slot: usize, child: NodeId) {
        match &mut self.nodes[id as usize].kind {
            NodeKind::Sequence(items) | NodeKind::Alternater(items) => items[slot] = child,
            NodeKind::Repeater { inner, .. } => *inner = child,
            _ => {}
        }
    }

    /// Copy a reduced sub-network: every node reachable from `pipe.entry`
    /// is cloned with its edges redirected to the clones.
    pub fn duplicate(&mut self, pipe: Pipe) -> Pipe {
        let mut map: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        let mut queue = VecDeque::new();
        let entry = self.add(self.kind(pipe.entry).clone());
        map.insert(pipe.entry, entry);
        queue.push_back(pipe.entry);
        while let Some(original) = queue.pop_front() {
            let copy = map[&original];
            let edges = self.node(original).edges.clone();
            for e in edges {
                let target = match map.get(&e) {
                    Some(&t) => t,
                    None => {
                        let t = self.add(self.kind(e).clone());
                        map.insert(e, t);
                        queue.push_back(e);
                        t
                    }
                };
                self.add_edge(copy, target);
            }
        }
        let exit = match map.get(&pipe.exit) {
            Some(&exit) => exit,
            None => self.add(self.kind(pipe.exit).clone()),
        };
        Pipe::new(entry, exit)
    }

    /// Lower the combinator at `id` into fresh plain nodes.
    pub fn reduce(&mut self, id: NodeId) -> Result<Pipe, UnresolvedReference> {
        match self.kind(id).clone() {
            NodeKind::Terminal(list) => {
                let n = self.terminal(list);
                Ok(Pipe::new(n, n))
            }
            NodeKind::Join | NodeKind::Start | NodeKind::End => {
                let n = self.join();
                Ok(Pipe::new(n, n))
            }
            NodeKind::Placeholder(name) => Err(UnresolvedReference(name)),
            NodeKind::Sequence(items) => {
                let (s, e) = (self.join(), self.join());
                let mut open = s;
                for item in items {
                    let p = self.reduce(item)?;
                    self.add_edge(open, p.entry);
                    open = p.exit;
                }
                self.add_edge(open, e);
                Ok(Pipe::new(s, e))
            }
            NodeKind::Alternater(alts) => {
                let (s, e) = (self.join(), self.join());
                for alt in alts {
                    let p = self.reduce(alt)?;
                    self.add_edge(s, p.entry);
                    self.add_edge(p.exit, e);
                }
                Ok(Pipe::new(s, e))
            }
            NodeKind::Repeater { inner, low, high } => self.reduce_repeater(inner, low, high),
        }
    }

    fn reduce_repeater(
        &mut self,
        inner: NodeId,
        low: usize,
        high: Option<usize>,
    ) -> Result<Pipe, UnresolvedReference> {
        let (s, e) = (self.join(), self.join());
        let template = self.reduce(inner)?;
        let mut open = s;
        let mut copy = self.duplicate(template);
        for _ in 0..low {
            self.add_edge(open, copy.entry);
            open = copy.exit;
            copy = self.duplicate(template);
        }
        match high {
            None => {
                self.add_edge(open, e);
                self.add_edge(open, copy.entry);
                self.add_edge(copy.exit, copy.entry);
                open = copy.exit;
            }
            Some(high) => {
                for _ in low..high {
                    self.add_edge(open, e);
                    self.add_edge(open, copy.entry);
                    open = copy.exit;
                    copy = self.duplicate(template);
                }
            }
        }
        self.add_edge(open, e);
        Ok(Pipe::new(s, e))
    }

    /// Every node reachable from `from`, breadth first.
    pub fn connected_nodes(&self, from: NodeId) -> Vec<NodeId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::from([from]);
        while let Some(n) = queue.pop_front() {
            if std::mem::replace(&mut seen[n as usize], true) {
                continue;
            }
            order.push(n);
            queue.extend(self.edges(n).iter().copied());
        }
        order
    }
}

#[cfg(test)]
#[path = "tests/node.rs"]
mod tests;
