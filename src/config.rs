//! Run configuration.
//!
//! All tunables of a pipeline run live in [`Config`], deserialized from a
//! JSON file by the CLI. Library code only ever sees the validated struct;
//! where the values come from is the binary's concern.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::QdictError;

/// What to do when the partitioner output has fewer assignment lines than
/// the graph has vertices.
///
/// The legacy pipeline only warned and left the remaining vertices
/// unprocessed; that is almost certainly a defect, so failing is the
/// default and the old behavior is opt-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortfallPolicy {
    /// Abort with [`QdictError::PartitionCountMismatch`].
    #[default]
    Fail,
    /// Log a warning and decode only the covered vertex prefix.
    Warn,
}

/// Parameters of one pipeline run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Dataset name; selects the trace subdirectory and output file names.
    pub dataset: String,
    /// Lowest query id occurring in the traces; ids are rebased by this.
    pub query_id_min: i64,
    /// Number of distinct queries, and length of every indicator vector.
    pub query_count: usize,
    /// Number of processing nodes to partition over.
    #[serde(default = "default_node_count")]
    pub node_count: u32,
    /// Directory containing `<dataset>/<node_count>_nodes/` trace files.
    #[serde(default)]
    pub traces_path: PathBuf,
    /// Directory containing the legacy dictionary `normal-dict_<dataset>`.
    #[serde(default)]
    pub dict_path: PathBuf,
    /// Directory receiving METIS files, tables, dictionaries and id maps.
    #[serde(default)]
    pub out_path: PathBuf,
    /// Weight of a co-access edge per observation.
    #[serde(default = "default_trace_weight")]
    pub trace_weight: u64,
    /// Fixed weight of an identifier-to-natural-node affinity edge.
    #[serde(default = "default_node_affinity_weight")]
    pub node_affinity_weight: u64,
    /// Path of the external METIS binary.
    #[serde(default = "default_metis_binary")]
    pub metis_binary: PathBuf,
    /// Behavior when partition output is shorter than the vertex count.
    #[serde(default)]
    pub on_partition_shortfall: ShortfallPolicy,
}

fn default_node_count() -> u32 {
    4
}

fn default_trace_weight() -> u64 {
    1000
}

fn default_node_affinity_weight() -> u64 {
    100
}

fn default_metis_binary() -> PathBuf {
    PathBuf::from("gpmetis")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: String::new(),
            query_id_min: 0,
            query_count: 0,
            node_count: default_node_count(),
            traces_path: PathBuf::new(),
            dict_path: PathBuf::new(),
            out_path: PathBuf::new(),
            trace_weight: default_trace_weight(),
            node_affinity_weight: default_node_affinity_weight(),
            metis_binary: default_metis_binary(),
            on_partition_shortfall: ShortfallPolicy::default(),
        }
    }
}

impl Config {
    /// Loads and validates a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, QdictError> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&raw)
            .map_err(|e| QdictError::Config(format!("{}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks value ranges that the rest of the pipeline depends on.
    pub fn validate(&self) -> Result<(), QdictError> {
        if self.dataset.is_empty() {
            return Err(QdictError::Config("dataset must not be empty".into()));
        }
        if self.query_id_min < 0 {
            return Err(QdictError::Config(format!(
                "query_id_min must be >= 0, got {}",
                self.query_id_min
            )));
        }
        if self.query_count == 0 {
            return Err(QdictError::Config("query_count must be >= 1".into()));
        }
        if self.node_count == 0 {
            return Err(QdictError::Config("node_count must be >= 1".into()));
        }
        Ok(())
    }

    /// Directory holding the trace files of this run.
    pub fn trace_dir(&self) -> PathBuf {
        self.traces_path
            .join(&self.dataset)
            .join(format!("{}_nodes", self.node_count))
    }

    /// Path of the legacy dictionary to re-index.
    pub fn legacy_dict_path(&self) -> PathBuf {
        self.dict_path.join(format!("normal-dict_{}", self.dataset))
    }
}
