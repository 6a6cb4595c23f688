//! Error types for the qdict pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building trace graphs, encoding METIS input,
/// or decoding partition assignments.
///
/// Every fatal condition surfaces as a variant here and is propagated up to
/// the CLI boundary, which decides the process exit code. Library code never
/// terminates the process itself.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum QdictError {
    /// A trace log line did not match `queryId source dest queryType`.
    ///
    /// Malformed lines are fatal: the batch runs over previously-validated
    /// logs, so a bad line means the wrong input was fed in.
    #[error("malformed trace line {line_no} in {file}: {reason}")]
    MalformedTrace {
        file: PathBuf,
        line_no: usize,
        reason: String,
    },

    /// A triple-pattern identifier did not match `TP(subject,predicate,object)`.
    #[error("malformed triple pattern identifier: {0}")]
    MalformedIdentifier(String),

    /// A rebased query index fell outside `[0, query_count)`.
    ///
    /// Writing past the end of a query-indicator vector would silently
    /// corrupt vertex weights, so this is checked on every edge insertion.
    #[error("query index {index} out of range (query count {query_count})")]
    QueryIndexOutOfRange { index: usize, query_count: usize },

    /// Ingestion produced a graph with no vertices.
    ///
    /// Distinct from a populated-but-edgeless graph; no downstream file may
    /// be produced in this case.
    #[error("no usable traces found, trace graph is empty")]
    EmptyGraph,

    /// The partitioner emitted fewer assignment lines than the graph has
    /// vertices.
    #[error("partition output has {got} assignments for {expected} vertices")]
    PartitionCountMismatch { expected: usize, got: usize },

    /// The partition-id-to-node remap derived from the node vertices is not
    /// a bijection, or a later vertex referenced an unknown partition id.
    #[error("partition remap violation: {0}")]
    PartitionRemap(String),

    /// The external partitioner process failed to start or exited non-zero.
    #[error("partitioner failed: {0}")]
    Partitioner(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
