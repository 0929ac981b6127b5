//! The inter-transaction dependency graph used by dangerous-structure
//! detection.
//!
//! Represented as an edge set keyed by transaction id pairs with a kind
//! tag, never via object back-pointers — the graph is naturally cyclic
//! and Rust's ownership rules make back-pointers painful for no benefit
//! here.

use std::collections::{HashMap, HashSet};

use availdb_core::TxnId;

/// The kind of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Anti-dependency: `from` read a value that `to` (later, or
    /// concurrently) overwrites.
    Rw,
    /// Write-write: `from` committed a write to a variable that `to`
    /// also writes.
    Ww,
}

/// A single directed edge `from -> to` of a given kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Source transaction.
    pub from: TxnId,
    /// Destination transaction.
    pub to: TxnId,
    /// Edge kind.
    pub kind: EdgeKind,
}

/// The dependency graph over transaction ids.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: HashSet<Edge>,
    out: HashMap<TxnId, Vec<(TxnId, EdgeKind)>>,
}

impl DependencyGraph {
    /// An empty graph.
    pub fn new() -> Self {
        DependencyGraph::default()
    }

    /// Add an edge. Returns `true` if it was newly added (no-op if the
    /// identical edge already exists).
    pub fn add_edge(&mut self, from: TxnId, to: TxnId, kind: EdgeKind) -> bool {
        let edge = Edge { from: from.clone(), to: to.clone(), kind };
        if self.edges.insert(edge) {
            self.out.entry(from).or_default().push((to, kind));
            true
        } else {
            false
        }
    }

    /// Remove a specific edge, e.g. to roll back a provisional edge added
    /// during an aborted commit attempt.
    pub fn remove_edge(&mut self, from: &TxnId, to: &TxnId, kind: EdgeKind) {
        let edge = Edge { from: from.clone(), to: to.clone(), kind };
        if self.edges.remove(&edge) {
            if let Some(list) = self.out.get_mut(from) {
                list.retain(|(t, k)| !(t == to && *k == kind));
            }
        }
    }

    /// Whether committing transaction `start` would close a cycle
    /// containing at least one pair of consecutive `Rw` edges.
    ///
    /// `is_committed` restricts which intermediate nodes the walk may
    /// pass through: only `start` itself (about to commit) and
    /// already-committed transactions count towards a dangerous
    /// structure. A still-active or waiting transaction on the path
    /// might yet abort and break the cycle, so edges through it don't
    /// count until it, too, has committed.
    ///
    /// Explicit iterative stack-based walk (not recursive), bounded by
    /// the number of live transaction records, so a malformed or
    /// adversarial input stream cannot cause unbounded recursion.
    pub fn has_dangerous_cycle_through(&self, start: &TxnId, is_committed: impl Fn(&TxnId) -> bool) -> bool {
        let bound = self.out.len().max(1) * 4;

        // Frame: (node, predecessor edge kind, first edge kind taken from
        // start, whether a consecutive RW pair has been seen so far,
        // nodes visited on this path).
        struct Frame {
            node: TxnId,
            prev_kind: Option<EdgeKind>,
            first_kind: Option<EdgeKind>,
            found_pair: bool,
            visited: HashSet<TxnId>,
            steps: usize,
        }

        let mut stack = vec![Frame {
            node: start.clone(),
            prev_kind: None,
            first_kind: None,
            found_pair: false,
            visited: HashSet::from([start.clone()]),
            steps: 0,
        }];

        while let Some(frame) = stack.pop() {
            if frame.steps > bound {
                continue;
            }
            let Some(neighbors) = self.out.get(&frame.node) else {
                continue;
            };
            for (next, kind) in neighbors {
                let consecutive_rw =
                    frame.prev_kind == Some(EdgeKind::Rw) && *kind == EdgeKind::Rw;
                let new_found = frame.found_pair || consecutive_rw;
                let new_first = frame.first_kind.or(Some(*kind));

                if next == start {
                    // Cycle closes back to the committing transaction; a
                    // wrap-around pair (last edge into start, first edge
                    // out of start) also counts as consecutive.
                    let wrap_pair = *kind == EdgeKind::Rw && new_first == Some(EdgeKind::Rw);
                    if new_found || wrap_pair {
                        return true;
                    }
                    continue;
                }

                if frame.visited.contains(next) || !is_committed(next) {
                    continue;
                }

                let mut visited = frame.visited.clone();
                visited.insert(next.clone());
                stack.push(Frame {
                    node: next.clone(),
                    prev_kind: Some(*kind),
                    first_kind: new_first,
                    found_pair: new_found,
                    visited,
                    steps: frame.steps + 1,
                });
            }
        }
        false
    }
}
