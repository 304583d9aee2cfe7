//! Wipe planning: reduce the dependency graph into an ordered command list.
//!
//! Each round clears every table nothing references any more. When a cycle
//! blocks every table, one nullable edge on the cycle is broken by nulling
//! its column. Planning is pure; nothing here touches a database.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::command::WipeCommand;
use crate::graph::RelationGraph;
use crate::relation::{Relation, RelationEdge};

/// Rounds allowed per table before planning is abandoned.
///
/// A round either clears a batch of leaf tables or nulls a single cyclic
/// column, so the bound also caps how many nullable columns can be broken.
/// A schema with more than `2 × |T|` nullable foreign keys inside cycles,
/// such as many parallel nullable links between two tables, fails with
/// [`PlanError::IterationLimit`] even though a plan exists.
pub const ROUNDS_PER_TABLE: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Unresolvable foreign key cycle without a nullable column among: {}", tables.join(", "))]
    UnresolvableCycle { tables: Vec<String> },
    #[error("Wipe planning did not finish within {limit} rounds")]
    IterationLimit { limit: usize },
    #[error("Relation {source_table}.{source_column} -> {target_table} is not in the graph")]
    MissingEdge {
        source_table: String,
        source_column: String,
        target_table: String,
    },
}

/// Plan a wipe of `tables` under the foreign keys in `relations`.
///
/// Duplicate table names are ignored. Relations that reference themselves or
/// touch a table outside `tables` do not constrain the order.
pub fn plan(tables: &[String], relations: &[Relation]) -> Result<Vec<WipeCommand>, PlanError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let tables: Vec<&str> = tables
        .iter()
        .map(String::as_str)
        .filter(|t| seen.insert(*t))
        .collect();

    let edges = relations
        .iter()
        .filter_map(|r| RelationEdge::from_relation(r, &seen))
        .collect();

    reduce(tables, RelationGraph::new(edges))
}

fn reduce(mut tables: Vec<&str>, graph: RelationGraph) -> Result<Vec<WipeCommand>, PlanError> {
    let limit = ROUNDS_PER_TABLE * tables.len();
    let mut graph = graph;
    let mut commands = Vec::new();

    for round in 0..limit.max(1) {
        let referenced = graph.referenced_tables();
        let (leaves, blocked): (Vec<&str>, Vec<&str>) =
            tables.iter().copied().partition(|t| !referenced.contains(*t));

        if !leaves.is_empty() || referenced.is_empty() {
            debug!(round, leaves = ?leaves, "clearing unreferenced tables");
            commands.extend(leaves.iter().map(|t| WipeCommand::clear_table(*t)));

            if referenced.is_empty() {
                return Ok(commands);
            }

            let cleared: HashSet<&str> = leaves.into_iter().collect();
            graph = graph.without_leaf_sources(&cleared);
            tables = blocked;
            continue;
        }

        let Some(edge) = graph.find_nullable_cyclic_edge().cloned() else {
            return Err(PlanError::UnresolvableCycle {
                tables: blocked.iter().map(|t| t.to_string()).collect(),
            });
        };

        debug!(
            round,
            table = edge.source_table(),
            column = edge.source_column(),
            references = edge.target_table(),
            "breaking cycle"
        );
        commands.push(WipeCommand::null_column(
            edge.source_table(),
            edge.source_column(),
        ));
        graph = graph.without_edge(&edge)?;
    }

    Err(PlanError::IterationLimit { limit })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tables: &[&str]) -> Vec<String> {
        tables.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_empty_schema() {
        assert!(plan(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_child_cleared_before_parent() {
        let relations = vec![Relation::new("a", "b", "a_id", false)];
        let commands = plan(&names(&["a", "b"]), &relations).unwrap();

        assert_eq!(
            commands,
            vec![WipeCommand::clear_table("b"), WipeCommand::clear_table("a")]
        );
    }

    #[test]
    fn test_self_reference_needs_no_null() {
        let relations = vec![Relation::new("a", "a", "parent_id", true)];
        let commands = plan(&names(&["a"]), &relations).unwrap();

        assert_eq!(commands, vec![WipeCommand::clear_table("a")]);
    }

    #[test]
    fn test_cycle_broken_by_nullable_column() {
        let relations = vec![
            Relation::new("c", "a", "ForeignId", true),
            Relation::new("a", "b", "a_id", false),
            Relation::new("b", "c", "b_id", false),
        ];
        let commands = plan(&names(&["a", "b", "c"]), &relations).unwrap();

        assert_eq!(
            commands,
            vec![
                WipeCommand::null_column("a", "ForeignId"),
                WipeCommand::clear_table("c"),
                WipeCommand::clear_table("b"),
                WipeCommand::clear_table("a"),
            ]
        );
    }

    #[test]
    fn test_cycle_without_nullable_column_fails() {
        let relations = vec![
            Relation::new("b", "a", "b_id", false),
            Relation::new("a", "b", "a_id", false),
        ];
        let err = plan(&names(&["a", "b"]), &relations).unwrap_err();

        assert_eq!(
            err,
            PlanError::UnresolvableCycle {
                tables: names(&["a", "b"])
            }
        );
    }

    #[test]
    fn test_leaves_cleared_in_table_order() {
        let relations = vec![
            Relation::new("root", "z", "root_id", false),
            Relation::new("root", "y", "root_id", false),
        ];
        let commands = plan(&names(&["z", "root", "y"]), &relations).unwrap();

        assert_eq!(
            commands,
            vec![
                WipeCommand::clear_table("z"),
                WipeCommand::clear_table("y"),
                WipeCommand::clear_table("root"),
            ]
        );
    }

    #[test]
    fn test_duplicate_tables_cleared_once() {
        let commands = plan(&names(&["a", "a"]), &[]).unwrap();
        assert_eq!(commands, vec![WipeCommand::clear_table("a")]);
    }

    #[test]
    fn test_relation_to_unknown_table_is_ignored() {
        let relations = vec![Relation::new("ghost", "a", "ghost_id", false)];
        let commands = plan(&names(&["a"]), &relations).unwrap();
        assert_eq!(commands, vec![WipeCommand::clear_table("a")]);
    }

    #[test]
    fn test_too_many_nullable_edges_trip_the_round_limit() {
        // Five parallel nullable edges from a need seven rounds; two tables allow six.
        let mut relations = Vec::new();
        for col in ["x1", "x2", "x3", "x4", "x5"] {
            relations.push(Relation::new("b", "a", col, true));
        }
        for col in ["y1", "y2", "y3", "y4", "y5"] {
            relations.push(Relation::new("a", "b", col, true));
        }

        let err = plan(&names(&["a", "b"]), &relations).unwrap_err();
        assert_eq!(err, PlanError::IterationLimit { limit: 6 });
    }
}
