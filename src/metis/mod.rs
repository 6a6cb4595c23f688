//! METIS input encoding and external partitioner invocation.
//!
//! The encoder serializes a [`TraceGraph`] snapshot into the text format
//! consumed by a multi-constraint METIS partitioner:
//!
//! ```text
//! V E 011 K
//! w_1 .. w_K n_1 ew_1 n_2 ew_2 ...     (one line per vertex)
//! ```
//!
//! `011` is the fixed format selector (no vertex sizes, has vertex weights,
//! has edge weights) and `K` is the number of weight values per vertex line.
//! Vertices are written in the graph's iteration order; the decoders in
//! [`crate::decode`] later rely on line N of the partitioner's output
//! matching the Nth vertex written here, so encoding must not reorder
//! anything.

use std::fs::File;
use std::hash::Hash;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use indexmap::IndexMap;
use tracing::info;

use crate::errors::QdictError;
use crate::graph::TraceGraph;
use crate::output;

/// File extension of partitioner input files.
pub const METIS_EXT: &str = "metis";

/// Format selector: no vertex sizes, vertex weights, edge weights.
const METIS_FMT: &str = "011";

/// Writes the lookup-mode METIS input for `graph`.
///
/// Each vertex line carries `1 + query_count` weight values. The first
/// `node_count` vertices are the synthetic node vertices; they get weight
/// `1` followed by zeros, anchoring them with a fixed unit size independent
/// of query indicators. All later vertices get `0` followed by their
/// query-indicator vector.
pub fn write_lookup_input<W: Write>(
    graph: &TraceGraph<String>,
    node_count: u32,
    writer: &mut W,
) -> Result<(), QdictError> {
    let query_count = graph.query_count();
    let numbers = graph.vertex_number_map();

    writeln!(
        writer,
        "{} {} {METIS_FMT} {}",
        graph.vertex_count(),
        graph.edge_count(),
        1 + query_count
    )?;

    for (i, (vertex, edges)) in graph.iter().enumerate() {
        let mut line: Vec<String> = Vec::with_capacity(1 + query_count + 2 * edges.len());

        if (i as u64) < u64::from(node_count) {
            line.push("1".to_string());
            line.extend(std::iter::repeat_with(|| "0".to_string()).take(query_count));
        } else {
            line.push("0".to_string());
            push_query_marks(graph, vertex, &mut line);
        }

        push_edges(edges, &numbers, &mut line);
        // Line = vertex: the file ends after the last vertex line, with no
        // trailing newline.
        if i > 0 {
            writeln!(writer)?;
        }
        write!(writer, "{}", line.join(" "))?;
    }
    Ok(())
}

/// Writes the dictionary-mode METIS input for `graph`.
///
/// Each vertex line carries exactly `query_count` weight values, the
/// vertex's query-indicator vector; there is no anchor value and no special
/// casing of leading vertices.
pub fn write_dict_input<W: Write>(
    graph: &TraceGraph<i64>,
    writer: &mut W,
) -> Result<(), QdictError> {
    let query_count = graph.query_count();
    let numbers = graph.vertex_number_map();

    writeln!(
        writer,
        "{} {} {METIS_FMT} {query_count}",
        graph.vertex_count(),
        graph.edge_count()
    )?;

    for (i, (vertex, edges)) in graph.iter().enumerate() {
        let mut line: Vec<String> = Vec::with_capacity(query_count + 2 * edges.len());
        push_query_marks(graph, vertex, &mut line);
        push_edges(edges, &numbers, &mut line);
        // Line = vertex: no newline after the last vertex line.
        if i > 0 {
            writeln!(writer)?;
        }
        write!(writer, "{}", line.join(" "))?;
    }
    Ok(())
}

fn push_query_marks<K: Hash + Eq + Clone>(
    graph: &TraceGraph<K>,
    vertex: &K,
    line: &mut Vec<String>,
) {
    // add_vertex keeps the mark map in sync with adjacency, but a missing
    // entry still encodes as all-zero marks rather than a crash.
    match graph.query_marks_for(vertex) {
        Some(marks) => line.extend(marks.iter().map(u8::to_string)),
        None => {
            line.extend(std::iter::repeat_with(|| "0".to_string()).take(graph.query_count()));
        }
    }
}

fn push_edges<K: Hash + Eq + Clone>(
    edges: &IndexMap<K, u64>,
    numbers: &IndexMap<K, usize>,
    line: &mut Vec<String>,
) {
    for (neighbor, weight) in edges {
        line.push(numbers[neighbor].to_string());
        line.push(weight.to_string());
    }
}

/// Writes `graph` through `write` into `<out_dir>/<name>.metis`, suffixing
/// the file name with a timestamp if it already exists.
pub fn create_input_file<F>(out_dir: &Path, name: &str, write: F) -> Result<PathBuf, QdictError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), QdictError>,
{
    info!("creating METIS input file");
    let started = Instant::now();

    let path = output::resolve_output_path(out_dir, &format!("{name}.{METIS_EXT}"))?;
    let mut writer = BufWriter::new(File::create(&path)?);
    write(&mut writer)?;
    writer.flush()?;

    info!(
        file = %path.display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "METIS input file written"
    );
    Ok(path)
}

/// Runs the external partitioner on `input_file`, waiting synchronously for
/// completion (no timeout; the job is a one-shot batch).
///
/// Returns the path of the partition-assignment file the partitioner leaves
/// next to its input: `<input_file>.part.<node_count>`.
pub fn run_partitioner(
    binary: &Path,
    input_file: &Path,
    node_count: u32,
) -> Result<PathBuf, QdictError> {
    info!(binary = %binary.display(), input = %input_file.display(), "running partitioner");
    let started = Instant::now();

    let status = Command::new(binary)
        .arg(input_file)
        .arg(node_count.to_string())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| QdictError::Partitioner(format!("{}: {e}", binary.display())))?;

    if !status.success() {
        return Err(QdictError::Partitioner(format!(
            "{} exited with {status}",
            binary.display()
        )));
    }

    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "partitioner finished"
    );
    Ok(partition_output_path(input_file, node_count))
}

/// Path of the assignment file the partitioner produces for `input_file`.
pub fn partition_output_path(input_file: &Path, node_count: u32) -> PathBuf {
    let mut name = input_file.as_os_str().to_os_string();
    name.push(format!(".part.{node_count}"));
    PathBuf::from(name)
}

/// Reads a partition-assignment file: one integer partition id per line, in
/// the same order as the encoded input vertices.
pub fn read_assignments(path: &Path) -> Result<Vec<u32>, QdictError> {
    let reader = BufReader::new(File::open(path)?);
    let mut assignments = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let id = trimmed.parse::<u32>().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("non-integer partition id {trimmed:?} in {}", path.display()),
            )
        })?;
        assignments.push(id);
    }
    Ok(assignments)
}
