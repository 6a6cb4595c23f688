//! Partition-output decoders.
//!
//! The external partitioner emits one partition id per line, in exactly the
//! vertex order the encoder wrote. Both decoders here walk the original
//! graph in that same iteration order and pair each vertex with its
//! positional assignment:
//!
//! - the **lookup-table decoder** emits only the identifiers whose assigned
//!   node differs from their natural node;
//! - the **dictionary decoder** re-indexes a legacy dictionary into
//!   composite ids that encode partition and intra-partition order.
//!
//! A partition output shorter than the vertex count is a
//! [`QdictError::PartitionCountMismatch`] by default; the legacy
//! warn-and-continue behavior stays available through
//! [`ShortfallPolicy::Warn`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::config::ShortfallPolicy;
use crate::errors::QdictError;
use crate::graph::TraceGraph;
use crate::tp;

fn check_coverage(
    vertex_count: usize,
    assignment_count: usize,
    policy: ShortfallPolicy,
) -> Result<(), QdictError> {
    if assignment_count >= vertex_count {
        return Ok(());
    }
    match policy {
        ShortfallPolicy::Fail => Err(QdictError::PartitionCountMismatch {
            expected: vertex_count,
            got: assignment_count,
        }),
        ShortfallPolicy::Warn => {
            warn!(
                expected = vertex_count,
                got = assignment_count,
                "graph has more vertices than partition output, trailing vertices not decoded"
            );
            Ok(())
        }
    }
}

/// Decodes the lookup stage: identifiers relocated away from their natural
/// node.
///
/// The first `node_count` assignment entries belong to the pre-registered
/// node vertices and define the remap from raw partition id to natural node
/// number (partition ids are arbitrary labels, not guaranteed to equal the
/// node index). The remap must be a bijection over the `node_count`
/// partitions; a duplicate partition id among the node vertices, or a later
/// vertex carrying an id the remap does not know, is a
/// [`QdictError::PartitionRemap`].
pub fn decode_lookup_table(
    graph: &TraceGraph<String>,
    assignments: &[u32],
    node_count: u32,
    policy: ShortfallPolicy,
) -> Result<IndexMap<String, u32>, QdictError> {
    info!("creating lookup table");
    check_coverage(graph.vertex_count(), assignments.len(), policy)?;

    let mut remap: IndexMap<u32, u32> = IndexMap::new();
    let mut table: IndexMap<String, u32> = IndexMap::new();

    for (i, ((vertex, _), &partition)) in graph.iter().zip(assignments.iter()).enumerate() {
        if (i as u64) < u64::from(node_count) {
            let node: u32 = vertex.parse().map_err(|_| {
                QdictError::PartitionRemap(format!(
                    "vertex {i} should be a node vertex, found key {vertex:?}"
                ))
            })?;
            if remap.insert(partition, node).is_some() {
                return Err(QdictError::PartitionRemap(format!(
                    "partition id {partition} assigned to more than one node vertex"
                )));
            }
        } else {
            let natural = tp::natural_node(vertex, node_count)?;
            let assigned = *remap.get(&partition).ok_or_else(|| {
                QdictError::PartitionRemap(format!(
                    "identifier {vertex:?} got partition id {partition}, which no node vertex received"
                ))
            })?;
            if assigned != natural {
                table.insert(vertex.clone(), assigned);
            }
        }
    }

    info!(entries = table.len(), "lookup table created");
    Ok(table)
}

/// The two parallel outputs of the dictionary decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryMaps {
    /// Legacy identifier string to new composite id.
    pub dictionary: IndexMap<String, u64>,
    /// Legacy integer index to the same new id, for re-indexing encoded data.
    pub id_map: IndexMap<i64, u64>,
}

/// Decodes the dictionary stage: re-indexes `legacy` into composite ids.
///
/// For each vertex in iteration order with partition id `p`: partition 0 is
/// remapped to `node_count` so nodes are numbered `1..=node_count`, and the
/// new id is `seq[p] * node_count + node` with `seq[p]` a per-partition
/// running counter. Vertices whose significant id falls outside the legacy
/// list are skipped and consume no sequence slot.
pub fn decode_dictionary(
    graph: &TraceGraph<i64>,
    assignments: &[u32],
    legacy: &[String],
    node_count: u32,
    policy: ShortfallPolicy,
) -> Result<DictionaryMaps, QdictError> {
    info!("creating dictionary");
    check_coverage(graph.vertex_count(), assignments.len(), policy)?;

    let mut seq = vec![0u64; node_count as usize];
    let mut maps = DictionaryMaps::default();

    for ((vertex, _), &partition) in graph.iter().zip(assignments.iter()) {
        if partition >= node_count {
            return Err(QdictError::PartitionRemap(format!(
                "partition id {partition} out of range for {node_count} nodes"
            )));
        }

        let legacy_index = *vertex;
        let Ok(idx) = usize::try_from(legacy_index) else {
            continue;
        };
        let Some(legacy_key) = legacy.get(idx) else {
            continue;
        };

        let node = if partition == 0 {
            u64::from(node_count)
        } else {
            u64::from(partition)
        };
        let new_id = seq[partition as usize] * u64::from(node_count) + node;

        maps.dictionary.insert(legacy_key.clone(), new_id);
        maps.id_map.insert(legacy_index, new_id);
        seq[partition as usize] += 1;
    }

    info!(entries = maps.dictionary.len(), "dictionary created");
    Ok(maps)
}

/// Loads a legacy dictionary: one identifier string per line, where the
/// 0-based line index names the legacy integer id.
pub fn load_legacy_dictionary(path: &Path) -> Result<Vec<String>, QdictError> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        entries.push(line?);
    }
    Ok(entries)
}
