//! Insertion-ordered weighted co-access graph.
//!
//! [`TraceGraph`] is the central data structure of the pipeline: an adjacency
//! map with per-vertex query-indicator vectors, generic over the vertex key
//! type (triple-pattern strings for the lookup stage, significant ids for the
//! dictionary stage).
//!
//! ## Ordering contract
//!
//! The METIS encoder and the partition-output decoders run as two independent
//! passes over the same graph, and line N of the partitioner's output must
//! correspond to the Nth vertex the encoder wrote. Every map in this module
//! is therefore an [`IndexMap`], which iterates in insertion order; nothing
//! here may rely on hash order.

use std::hash::Hash;

use indexmap::IndexMap;

use crate::errors::QdictError;

/// A weighted graph with per-vertex multi-dimensional query indicators.
///
/// Edges are stored as directed adjacency entries. In undirected mode (the
/// only mode the pipeline uses) every insertion writes both directions with
/// identical weight-update logic, so the structure stays exactly symmetric:
/// no step ever derives one direction from the other.
#[derive(Debug, Clone)]
pub struct TraceGraph<K> {
    adjacency: IndexMap<K, IndexMap<K, u64>>,
    query_marks: IndexMap<K, Vec<u8>>,
    query_count: usize,
    undirected: bool,
}

impl<K: Hash + Eq + Clone> TraceGraph<K> {
    /// Creates an empty graph whose indicator vectors have `query_count`
    /// slots.
    pub fn new(query_count: usize, undirected: bool) -> Self {
        Self {
            adjacency: IndexMap::new(),
            query_marks: IndexMap::new(),
            query_count,
            undirected,
        }
    }

    /// Creates an empty undirected graph.
    pub fn undirected(query_count: usize) -> Self {
        Self::new(query_count, true)
    }

    /// Registers `vertex` with an empty adjacency row and a zeroed indicator
    /// vector. Idempotent; an existing vertex is left untouched.
    ///
    /// Both internal maps always carry the same key set, so a vertex added
    /// here is visible to the encoder even if no edge ever touches it.
    pub fn add_vertex(&mut self, vertex: K) {
        if !self.adjacency.contains_key(&vertex) {
            self.adjacency.insert(vertex.clone(), IndexMap::new());
        }
        if !self.query_marks.contains_key(&vertex) {
            self.query_marks.insert(vertex, vec![0; self.query_count]);
        }
    }

    /// Inserts the edge `source↔dest` attributed to query `query_index`.
    ///
    /// When an edge already exists its weight is overwritten with `weight`,
    /// or summed with it when `accumulate` is set. Both endpoints get the
    /// indicator bit for `query_index` set to 1 (never incremented past 1).
    ///
    /// A self-loop (`source == dest`) registers the vertex and marks the
    /// query but stores no adjacency entry: a mirrored write would land in
    /// the same map slot, leaving the structure asymmetric and the edge
    /// count off by one, and METIS input has no representation for loops
    /// anyway.
    ///
    /// `query_index` must be below the configured query count; out-of-range
    /// indices come from malformed traces and fail rather than corrupting a
    /// neighboring indicator slot.
    pub fn add_edge(
        &mut self,
        source: K,
        dest: K,
        query_index: usize,
        weight: u64,
        accumulate: bool,
    ) -> Result<(), QdictError> {
        if query_index >= self.query_count {
            return Err(QdictError::QueryIndexOutOfRange {
                index: query_index,
                query_count: self.query_count,
            });
        }

        self.add_vertex(source.clone());
        self.add_vertex(dest.clone());

        if source != dest {
            self.put_half_edge(source.clone(), dest.clone(), weight, accumulate);
            if self.undirected {
                self.put_half_edge(dest.clone(), source.clone(), weight, accumulate);
            }
        }

        self.query_marks[&source][query_index] = 1;
        self.query_marks[&dest][query_index] = 1;
        Ok(())
    }

    fn put_half_edge(&mut self, from: K, to: K, weight: u64, accumulate: bool) {
        let row = self.adjacency.entry(from).or_default();
        let new_weight = match row.get(&to) {
            Some(existing) if accumulate => existing + weight,
            _ => weight,
        };
        row.insert(to, new_weight);
    }

    /// Number of edges: the sum of all directed adjacency entries, halved
    /// (integer division) in undirected mode.
    ///
    /// Callers rely on the structure being exactly symmetric in undirected
    /// mode, which holds because [`add_edge`](Self::add_edge) always writes
    /// both directions together.
    pub fn edge_count(&self) -> usize {
        let directed: usize = self.adjacency.values().map(IndexMap::len).sum();
        if self.undirected {
            directed / 2
        } else {
            directed
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Adjacency row of `vertex`, if present.
    pub fn edges_from(&self, vertex: &K) -> Option<&IndexMap<K, u64>> {
        self.adjacency.get(vertex)
    }

    /// Query-indicator vector of `vertex`, if present.
    pub fn query_marks_for(&self, vertex: &K) -> Option<&[u8]> {
        self.query_marks.get(vertex).map(Vec::as_slice)
    }

    /// Number of slots in each query-indicator vector.
    pub fn query_count(&self) -> usize {
        self.query_count
    }

    /// Iterates over `(vertex, adjacency row)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &IndexMap<K, u64>)> {
        self.adjacency.iter()
    }

    /// Assigns 1-based sequential numbers to vertices in the current
    /// iteration order.
    ///
    /// Recomputed fresh on every call, never cached: two calls over an
    /// unmodified graph yield identical mappings, and numbers already
    /// assigned never change when vertices are appended.
    pub fn vertex_number_map(&self) -> IndexMap<K, usize> {
        self.adjacency
            .keys()
            .enumerate()
            .map(|(i, key)| (key.clone(), i + 1))
            .collect()
    }
}
