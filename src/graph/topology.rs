//! Resolves entity key references into index-based edges.
//!
//! Dependencies live in a directed graph map, peer connections in an
//! undirected one, so an A-B pair declared from both sides collapses into
//! a single edge.

use super::types::Entity;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::{DiGraphMap, UnGraphMap};
use std::collections::HashMap;

pub struct Topology {
    index: HashMap<String, usize>,
    dependencies: DiGraphMap<usize, ()>,
    connections: UnGraphMap<usize, ()>,
    dependency_edges: Vec<(usize, usize)>,
    connection_edges: Vec<(usize, usize)>,
    cycles: Vec<Vec<usize>>,
}

impl Topology {
    /// Build from an entity list whose keys are already unique.
    pub fn build(entities: &[Entity]) -> Self {
        let index: HashMap<String, usize> = entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key.clone(), i))
            .collect();

        let mut dependencies = DiGraphMap::new();
        let mut connections = UnGraphMap::new();
        for i in 0..entities.len() {
            dependencies.add_node(i);
            connections.add_node(i);
        }

        let mut dropped = 0usize;
        for (i, entity) in entities.iter().enumerate() {
            for key in &entity.depends_on {
                match index.get(key) {
                    Some(&j) if j != i => {
                        dependencies.add_edge(i, j, ());
                    }
                    _ => dropped += 1,
                }
            }
            for key in &entity.connected_to {
                match index.get(key) {
                    Some(&j) if j != i => {
                        connections.add_edge(i.min(j), i.max(j), ());
                    }
                    _ => dropped += 1,
                }
            }
        }
        if dropped > 0 {
            tracing::debug!("Dropped {} unresolvable edge references", dropped);
        }

        let mut dependency_edges: Vec<(usize, usize)> =
            dependencies.all_edges().map(|(a, b, _)| (a, b)).collect();
        dependency_edges.sort_unstable();

        let mut connection_edges: Vec<(usize, usize)> = connections
            .all_edges()
            .map(|(a, b, _)| (a.min(b), a.max(b)))
            .collect();
        connection_edges.sort_unstable();

        let mut cycles: Vec<Vec<usize>> = tarjan_scc(&dependencies)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|mut component| {
                component.sort_unstable();
                component
            })
            .collect();
        cycles.sort();
        for cycle in &cycles {
            let keys: Vec<&str> = cycle.iter().map(|&i| entities[i].key.as_str()).collect();
            tracing::warn!("Dependency cycle between {:?}; rendering every edge", keys);
        }

        Self {
            index,
            dependencies,
            connections,
            dependency_edges,
            connection_edges,
            cycles,
        }
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Directed (dependent, dependency) pairs
    pub fn dependency_edges(&self) -> &[(usize, usize)] {
        &self.dependency_edges
    }

    /// Unordered connection pairs, each stored as (lower, higher)
    pub fn connection_edges(&self) -> &[(usize, usize)] {
        &self.connection_edges
    }

    /// Resolved dependencies of `node`, in ascending index order
    pub fn dependencies_of(&self, node: usize) -> Vec<usize> {
        let mut deps: Vec<usize> = self.dependencies.neighbors(node).collect();
        deps.sort_unstable();
        deps
    }

    /// Resolved peers of `node` regardless of which side declared the link
    pub fn connections_of(&self, node: usize) -> Vec<usize> {
        let mut peers: Vec<usize> = self.connections.neighbors(node).collect();
        peers.sort_unstable();
        peers
    }

    /// Strongly-connected dependency groups with more than one member
    pub fn dependency_cycles(&self) -> &[Vec<usize>] {
        &self.cycles
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::build(&[])
    }
}
