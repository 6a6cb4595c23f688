//! Stage orchestration.
//!
//! Wires the components into the two sequential stages of a run:
//!
//! 1. **Lookup stage** — string-keyed trace graph → METIS input →
//!    partitioner → lookup table of relocated identifiers.
//! 2. **Dictionary stage** — significant-id trace graph → METIS input →
//!    partitioner → re-indexed dictionary plus old/new id map.
//!
//! Each stage owns its graph exclusively and discards it when done; any
//! error aborts the run before downstream files are produced. The
//! intermediate METIS files are deleted after a stage succeeds.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::config::Config;
use crate::errors::QdictError;
use crate::{decode, ingest, metis, output};

/// Lists the trace files for this run, sorted by file name so vertex
/// insertion order does not depend on directory enumeration order.
fn list_trace_files(cfg: &Config) -> Result<Vec<PathBuf>, QdictError> {
    let dir = cfg.trace_dir();
    info!(dir = %dir.display(), "listing trace files");

    let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

fn lookup_stage(cfg: &Config, trace_files: &[PathBuf]) -> Result<(), QdictError> {
    info!("= creating lookup table =");

    let (graph, _stats) = ingest::build_lookup_graph(trace_files, cfg)?;

    let metis_name = format!("qt-metis_{}_table_{}", cfg.dataset, cfg.node_count);
    let input_file = metis::create_input_file(&cfg.out_path, &metis_name, |w| {
        metis::write_lookup_input(&graph, cfg.node_count, w)
    })?;

    let part_file = metis::run_partitioner(&cfg.metis_binary, &input_file, cfg.node_count)?;
    let assignments = metis::read_assignments(&part_file)?;

    let table = decode::decode_lookup_table(
        &graph,
        &assignments,
        cfg.node_count,
        cfg.on_partition_shortfall,
    )?;

    let table_name = format!("qt-table_{}_{}", cfg.dataset, cfg.node_count);
    let table_path =
        output::write_mapping(table.iter(), &cfg.out_path.join("tables"), &table_name)?;
    info!(file = %table_path.display(), "lookup table created");

    output::remove_temp_file(&input_file);
    output::remove_temp_file(&part_file);
    Ok(())
}

fn dictionary_stage(cfg: &Config, trace_files: &[PathBuf]) -> Result<(), QdictError> {
    info!("= creating dictionary =");

    let (graph, _stats) = ingest::build_dict_graph(trace_files, cfg)?;

    let metis_name = format!("qt-metis_{}_dict_{}", cfg.dataset, cfg.node_count);
    let input_file = metis::create_input_file(&cfg.out_path, &metis_name, |w| {
        metis::write_dict_input(&graph, w)
    })?;

    let part_file = metis::run_partitioner(&cfg.metis_binary, &input_file, cfg.node_count)?;
    let assignments = metis::read_assignments(&part_file)?;

    let legacy = decode::load_legacy_dictionary(&cfg.legacy_dict_path())?;
    let maps = decode::decode_dictionary(
        &graph,
        &assignments,
        &legacy,
        cfg.node_count,
        cfg.on_partition_shortfall,
    )?;

    let dict_name = format!("qt-dict_{}_{}", cfg.dataset, cfg.node_count);
    let dict_path =
        output::write_mapping(maps.dictionary.iter(), &cfg.out_path.join("dicts"), &dict_name)?;
    info!(file = %dict_path.display(), "dictionary created");

    let id_map_name = format!("qt-idMap_{}_{}", cfg.dataset, cfg.node_count);
    let id_map_path = output::write_mapping(maps.id_map.iter(), &cfg.out_path, &id_map_name)?;
    info!(file = %id_map_path.display(), "id map created");

    output::remove_temp_file(&input_file);
    output::remove_temp_file(&part_file);
    Ok(())
}

/// Runs the full pipeline: lookup stage, then dictionary stage.
pub fn run(cfg: &Config) -> Result<(), QdictError> {
    cfg.validate()?;
    let trace_files = list_trace_files(cfg)?;

    lookup_stage(cfg, &trace_files)?;
    dictionary_stage(cfg, &trace_files)?;

    info!("== done ==");
    Ok(())
}
