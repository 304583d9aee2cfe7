//! Immutable foreign-key dependency graph.

use std::collections::{HashMap, HashSet};

use crate::planner::PlanError;
use crate::relation::RelationEdge;

/// A multiset of relation edges.
///
/// Every reduction returns a new graph; duplicate edges are kept and removed
/// one occurrence at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationGraph {
    edges: Vec<RelationEdge>,
}

impl RelationGraph {
    pub fn new(edges: Vec<RelationEdge>) -> Self {
        Self { edges }
    }

    pub fn edges(&self) -> &[RelationEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Tables that are still the target of at least one edge.
    pub fn referenced_tables(&self) -> HashSet<&str> {
        self.edges.iter().map(|e| e.target_table()).collect()
    }

    /// Drop every edge held by a table in `cleared`.
    pub fn without_leaf_sources(&self, cleared: &HashSet<&str>) -> Self {
        let edges = self
            .edges
            .iter()
            .filter(|e| !cleared.contains(e.source_table()))
            .cloned()
            .collect();
        Self { edges }
    }

    /// Drop exactly one occurrence of `edge`.
    pub fn without_edge(&self, edge: &RelationEdge) -> Result<Self, PlanError> {
        let idx = self
            .edges
            .iter()
            .position(|e| e == edge)
            .ok_or_else(|| PlanError::MissingEdge {
                source_table: edge.source_table().to_string(),
                source_column: edge.source_column().to_string(),
                target_table: edge.target_table().to_string(),
            })?;

        let mut edges = self.edges.clone();
        edges.remove(idx);
        Ok(Self { edges })
    }

    /// First nullable edge whose target can reach its source.
    pub fn find_nullable_cyclic_edge(&self) -> Option<&RelationEdge> {
        let adjacency = self.adjacency();
        self.edges
            .iter()
            .filter(|e| e.is_nullable())
            .find(|e| reaches(&adjacency, e.target_table(), e.source_table()))
    }

    /// source table -> target tables, in edge order.
    fn adjacency(&self) -> HashMap<&str, Vec<&str>> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &self.edges {
            adjacency
                .entry(edge.source_table())
                .or_default()
                .push(edge.target_table());
        }
        adjacency
    }
}

/// Iterative DFS from `from`; true when `to` is reachable.
fn reaches(adjacency: &HashMap<&str, Vec<&str>>, from: &str, to: &str) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack = vec![from];

    while let Some(table) = stack.pop() {
        if table == to {
            return true;
        }
        if !visited.insert(table) {
            continue;
        }
        if let Some(next) = adjacency.get(table) {
            stack.extend(next.iter().filter(|t| !visited.contains(*t)));
        }
    }

    false
}
