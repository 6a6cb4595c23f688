//! Mapping writers and collision-safe output paths.
//!
//! Every final artifact of the pipeline (lookup table, dictionary, old/new
//! id map) is a plain text file of `key -> value` lines written in the
//! mapping's insertion order. Existing files are never overwritten; a
//! colliding name gets a millisecond-timestamp suffix instead, matching the
//! legacy tool's behavior.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::errors::QdictError;

/// Resolves `<dir>/<name>`, appending `_<unix-millis>` to the file stem
/// when the path already exists, so a colliding `x.metis` becomes
/// `x_<millis>.metis` and keeps its extension. Creates `dir` if needed.
pub fn resolve_output_path(dir: &Path, name: &str) -> Result<PathBuf, QdictError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    if !path.exists() {
        return Ok(path);
    }

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let fallback_name = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{millis}.{ext}"),
        _ => format!("{name}_{millis}"),
    };
    let fallback = dir.join(fallback_name);
    warn!(
        existing = %path.display(),
        using = %fallback.display(),
        "output file already exists, adding timestamp to new filename"
    );
    Ok(fallback)
}

/// Writes `entries` as `key -> value` lines into `<dir>/<name>`, in
/// iteration order. Returns the path actually written.
pub fn write_mapping<K, V, I>(entries: I, dir: &Path, name: &str) -> Result<PathBuf, QdictError>
where
    K: Display,
    V: Display,
    I: IntoIterator<Item = (K, V)>,
{
    let path = resolve_output_path(dir, name)?;
    let mut writer = BufWriter::new(File::create(&path)?);
    for (key, value) in entries {
        writeln!(writer, "{key} -> {value}")?;
    }
    writer.flush()?;

    info!(file = %path.display(), "mapping written");
    Ok(path)
}

/// Best-effort removal of an intermediate file; failure is logged, not
/// propagated, since the final artifacts are already on disk.
pub fn remove_temp_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(file = %path.display(), error = %e, "could not remove temporary file");
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    #[test]
    fn write_mapping_emits_arrow_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut map: IndexMap<String, u32> = IndexMap::new();
        map.insert("TP(3,0,0)".into(), 2);
        map.insert("TP(5,0,0)".into(), 0);

        let path = write_mapping(map.iter(), dir.path(), "table").unwrap();
        let written = fs::read_to_string(path).unwrap();
        assert_eq!(written, "TP(3,0,0) -> 2\nTP(5,0,0) -> 0\n");
    }

    #[test]
    fn colliding_name_gets_timestamp_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_mapping([("a", 1)], dir.path(), "dict").unwrap();
        let second = write_mapping([("a", 2)], dir.path(), "dict").unwrap();

        assert_eq!(first, dir.path().join("dict"));
        assert_ne!(first, second);
        assert!(second
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("dict_"));
        // Original content untouched.
        assert_eq!(fs::read_to_string(first).unwrap(), "a -> 1\n");
    }

    #[test]
    fn colliding_name_with_extension_keeps_the_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.metis"), "").unwrap();

        let fallback = resolve_output_path(dir.path(), "x.metis").unwrap();
        let name = fallback.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("x_"), "got {name}");
        assert!(name.ends_with(".metis"), "got {name}");
    }

    #[test]
    fn resolve_output_path_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("tables");
        let path = resolve_output_path(&nested, "t").unwrap();
        assert_eq!(path, nested.join("t"));
        assert!(nested.is_dir());
    }
}
