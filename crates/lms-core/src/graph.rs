//! Guards for directed edges between courses.
//!
//! Prerequisite edges point from a course to the course it requires.
//! Relation edges point from a course to a related one and carry a type.
//! Both kinds reject self-loops and exact duplicates; prerequisites also
//! reject any edge that would close a cycle.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use uuid::Uuid;

/// Why a new edge between two courses was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Source and target are the same course
    #[error("a course cannot reference itself")]
    SelfReference,
    /// The exact edge already exists
    #[error("this link already exists")]
    Duplicate,
    /// The edge would close a prerequisite cycle
    #[error("adding this prerequisite would create a cycle: {}", render_path(.path))]
    Cycle {
        /// Closed path, starting and ending at the new edge's source
        path: Vec<Uuid>,
    },
}

fn render_path(path: &[Uuid]) -> String {
    path.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A directed link between two courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Course the link starts from
    pub source: Uuid,
    /// Course the link points to
    pub target: Uuid,
}

impl Edge {
    /// Edge from `source` to `target`
    pub const fn new(source: Uuid, target: Uuid) -> Self {
        Self { source, target }
    }
}

impl From<(Uuid, Uuid)> for Edge {
    fn from((source, target): (Uuid, Uuid)) -> Self {
        Self { source, target }
    }
}

/// Reject an edge from a course to itself.
pub fn check_self_reference(source: Uuid, target: Uuid) -> Result<(), GraphError> {
    if source == target {
        return Err(GraphError::SelfReference);
    }
    Ok(())
}

/// Self-loop and duplicate checks shared by every edge kind.
///
/// `existing` only needs to contain edges of the same kind (and, for typed
/// relations, the same type) as `candidate`.
pub fn check_new_edge(existing: &[Edge], candidate: Edge) -> Result<(), GraphError> {
    check_self_reference(candidate.source, candidate.target)?;

    if existing.contains(&candidate) {
        return Err(GraphError::Duplicate);
    }

    Ok(())
}

/// Reject `candidate` if its target can already reach its source.
///
/// `existing` must include every edge reachable from `candidate.target`; a
/// larger edge set is fine. On failure the error carries the closed path,
/// starting and ending at `candidate.source`.
pub fn check_acyclic(existing: &[Edge], candidate: Edge) -> Result<(), GraphError> {
    check_self_reference(candidate.source, candidate.target)?;

    match find_path(existing, candidate.target, candidate.source) {
        Some(path) => {
            let mut cycle = Vec::with_capacity(path.len() + 1);
            cycle.push(candidate.source);
            cycle.extend(path);
            Err(GraphError::Cycle { path: cycle })
        }
        None => Ok(()),
    }
}

/// Depth-first search for a path `from -> ... -> to` over `edges`.
pub fn find_path(edges: &[Edge], from: Uuid, to: Uuid) -> Option<Vec<Uuid>> {
    let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for edge in edges {
        adjacency.entry(edge.source).or_default().push(edge.target);
    }

    let mut visited = HashSet::new();
    let mut path = vec![from];
    // Each frame holds the node and the index of the next neighbour to try.
    let mut stack = vec![(from, 0usize)];
    visited.insert(from);

    while let Some(&(node, next)) = stack.last() {
        if node == to {
            return Some(path);
        }

        let neighbours = adjacency.get(&node).map(Vec::as_slice).unwrap_or_default();
        match neighbours.get(next).copied() {
            Some(neighbour) => {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                if visited.insert(neighbour) {
                    path.push(neighbour);
                    stack.push((neighbour, 0));
                }
            }
            None => {
                stack.pop();
                path.pop();
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<const N: usize>() -> [Uuid; N] {
        std::array::from_fn(|_| Uuid::new_v4())
    }

    #[test]
    fn test_self_reference_rejected() {
        let [a] = ids();
        assert_eq!(
            check_new_edge(&[], Edge::new(a, a)),
            Err(GraphError::SelfReference)
        );
        assert_eq!(
            check_acyclic(&[], Edge::new(a, a)),
            Err(GraphError::SelfReference)
        );
    }

    #[test]
    fn test_duplicate_rejected() {
        let [a, b] = ids();
        let existing = [Edge::new(a, b)];
        assert_eq!(
            check_new_edge(&existing, Edge::new(a, b)),
            Err(GraphError::Duplicate)
        );
        // The reverse direction is a different edge.
        assert_eq!(check_new_edge(&existing, Edge::new(b, a)), Ok(()));
    }

    #[test]
    fn test_direct_cycle_rejected() {
        let [a, b] = ids();
        let existing = [Edge::new(a, b)];
        assert_eq!(
            check_acyclic(&existing, Edge::new(b, a)),
            Err(GraphError::Cycle {
                path: vec![b, a, b]
            })
        );
    }

    #[test]
    fn test_transitive_cycle_rejected() {
        let [a, b, c, d] = ids();
        let existing = [Edge::new(a, b), Edge::new(b, c), Edge::new(c, d)];

        let err = check_acyclic(&existing, Edge::new(d, a)).unwrap_err();
        assert_eq!(
            err,
            GraphError::Cycle {
                path: vec![d, a, b, c, d]
            }
        );
        assert!(err.to_string().contains(&a.to_string()));
    }

    #[test]
    fn test_diamond_is_acyclic() {
        let [a, b, c, d] = ids();
        let existing = [Edge::new(a, b), Edge::new(a, c), Edge::new(b, d)];
        assert_eq!(check_acyclic(&existing, Edge::new(c, d)), Ok(()));
    }

    #[test]
    fn test_find_path_handles_existing_cycles() {
        let [a, b, c, x] = ids();
        let edges = [Edge::new(a, b), Edge::new(b, a), Edge::new(b, c)];
        assert_eq!(find_path(&edges, a, c), Some(vec![a, b, c]));
        assert_eq!(find_path(&edges, a, x), None);
    }

    #[test]
    fn test_find_path_to_self() {
        let [a] = ids();
        assert_eq!(find_path(&[], a, a), Some(vec![a]));
    }
}
