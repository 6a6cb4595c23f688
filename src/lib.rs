//! # qdict - Query-Trace Dictionary Creator
//!
//! qdict prepares inputs for, and interprets outputs from, a METIS-style
//! multi-constraint graph partitioner, in order to distribute query-trace
//! data across a fixed number of processing nodes.
//!
//! ## Architecture
//!
//! The pipeline is strictly sequential: ingest → encode → partition
//! (external) → decode → write.
//!
//! - **tp**: Triple-pattern identifier extraction (significant id, natural node)
//! - **graph**: Insertion-ordered weighted co-access graph
//! - **ingest**: Trace-file ingestion in lookup and dictionary modes
//! - **metis**: Partitioner input encoding and external invocation
//! - **decode**: Lookup-table and dictionary decoders for partition output
//! - **output**: Mapping writers with collision-safe paths
//! - **pipeline**: Stage orchestration
//!
//! ## Ordering contract
//!
//! The METIS input is written, and the partition output read back, over the
//! same graph in its insertion order. Line N of the partitioner's output
//! corresponds to the Nth vertex the encoder produced; every map in this
//! crate preserves insertion order to keep those two passes aligned.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qdict::config::Config;
//!
//! let cfg = Config::load(std::path::Path::new("run.json"))?;
//! qdict::pipeline::run(&cfg)?;
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod decode;
pub mod errors;
pub mod graph;
pub mod ingest;
pub mod metis;
pub mod output;
pub mod pipeline;
pub mod tp;

pub use config::{Config, ShortfallPolicy};
pub use errors::QdictError;
pub use graph::TraceGraph;
