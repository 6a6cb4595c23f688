//! Trace-file ingestion.
//!
//! Streams query-trace log lines into a [`TraceGraph`], in one of two modes:
//!
//! - **lookup mode** keys vertices by the raw triple-pattern string and adds
//!   node-affinity edges towards each pattern's natural node, so the
//!   partitioner is biased towards leaving patterns where hashing would put
//!   them anyway;
//! - **dictionary mode** keys vertices by significant id and only records
//!   co-access edges that cross a significant-id boundary.
//!
//! Trace lines have the shape `queryId source dest queryType`; the trailing
//! query type is ignored. Malformed lines are fatal rather than skipped: the
//! batch runs over previously-validated logs, so a bad line means the wrong
//! input was fed in.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use crate::config::Config;
use crate::errors::QdictError;
use crate::graph::TraceGraph;
use crate::tp;

/// Counters reported by an ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Trace lines that contributed edges to the graph.
    pub used: u64,
    /// Trace lines discarded as self-referential (dictionary mode only).
    pub ignored: u64,
}

/// One parsed trace record; the query id is already rebased to `[0, query_count)`.
struct TraceRecord<'a> {
    query_index: usize,
    source: &'a str,
    dest: &'a str,
}

fn parse_trace_line<'a>(
    line: &'a str,
    file: &Path,
    line_no: usize,
    query_id_min: i64,
    query_count: usize,
) -> Result<TraceRecord<'a>, QdictError> {
    let malformed = |reason: String| QdictError::MalformedTrace {
        file: file.to_path_buf(),
        line_no,
        reason,
    };

    let mut fields = line.split_whitespace();
    let (Some(query), Some(source), Some(dest)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(malformed(format!("expected at least 3 fields, got {line:?}")));
    };

    let query_id: i64 = query
        .parse()
        .map_err(|_| malformed(format!("non-integer query id {query:?}")))?;

    let rebased = query_id - query_id_min;
    if rebased < 0 || rebased as u64 >= query_count as u64 {
        return Err(malformed(format!(
            "query id {query_id} rebased to {rebased}, outside [0, {query_count})"
        )));
    }

    Ok(TraceRecord {
        query_index: rebased as usize,
        source,
        dest,
    })
}

/// Builds the string-keyed lookup graph from `trace_files`.
///
/// The `node_count` synthetic node vertices are registered first, keyed by
/// their decimal index string, which guarantees they occupy the first
/// `node_count` positions in iteration order — the lookup decoder depends on
/// exactly that layout.
pub fn build_lookup_graph(
    trace_files: &[PathBuf],
    cfg: &Config,
) -> Result<(TraceGraph<String>, IngestStats), QdictError> {
    info!("processing query trace files (lookup mode)");
    let started = Instant::now();

    let mut graph: TraceGraph<String> = TraceGraph::undirected(cfg.query_count);
    let mut stats = IngestStats::default();

    for node in 0..cfg.node_count {
        graph.add_vertex(node.to_string());
    }

    for path in trace_files {
        debug!(file = %path.display(), "reading trace file");
        let reader = BufReader::new(File::open(path)?);

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let rec =
                parse_trace_line(&line, path, idx + 1, cfg.query_id_min, cfg.query_count)?;

            // Co-access edge, weights summed across repeated observations.
            graph.add_edge(
                rec.source.to_string(),
                rec.dest.to_string(),
                rec.query_index,
                cfg.trace_weight,
                true,
            )?;

            // Affinity edges keep a fixed weight no matter how often the
            // pattern shows up.
            let source_node = tp::natural_node(rec.source, cfg.node_count)?;
            graph.add_edge(
                rec.source.to_string(),
                source_node.to_string(),
                rec.query_index,
                cfg.node_affinity_weight,
                false,
            )?;
            let dest_node = tp::natural_node(rec.dest, cfg.node_count)?;
            graph.add_edge(
                rec.dest.to_string(),
                dest_node.to_string(),
                rec.query_index,
                cfg.node_affinity_weight,
                false,
            )?;

            stats.used += 1;
        }
    }

    info!(
        used = stats.used,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "trace ingestion finished"
    );

    if graph.is_empty() {
        return Err(QdictError::EmptyGraph);
    }
    Ok((graph, stats))
}

/// Builds the significant-id-keyed dictionary graph from `trace_files`.
///
/// Lines whose source and destination share the same significant id carry no
/// information for partitioning and are discarded, counted separately in
/// [`IngestStats::ignored`].
pub fn build_dict_graph(
    trace_files: &[PathBuf],
    cfg: &Config,
) -> Result<(TraceGraph<i64>, IngestStats), QdictError> {
    info!("processing query trace files (dictionary mode)");
    let started = Instant::now();

    let mut graph: TraceGraph<i64> = TraceGraph::undirected(cfg.query_count);
    let mut stats = IngestStats::default();

    for path in trace_files {
        debug!(file = %path.display(), "reading trace file");
        let reader = BufReader::new(File::open(path)?);

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let rec =
                parse_trace_line(&line, path, idx + 1, cfg.query_id_min, cfg.query_count)?;

            let source = tp::significant_id(rec.source)?;
            let dest = tp::significant_id(rec.dest)?;

            if source == dest {
                stats.ignored += 1;
                continue;
            }
            graph.add_edge(source, dest, rec.query_index, cfg.trace_weight, true)?;
            stats.used += 1;
        }
    }

    info!(
        used = stats.used,
        ignored = stats.ignored,
        total = stats.used + stats.ignored,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "trace ingestion finished"
    );

    if graph.is_empty() {
        return Err(QdictError::EmptyGraph);
    }
    Ok((graph, stats))
}
