//! Structured side-store for drawn artifacts.
//!
//! One JSON object per line:
//!
//! ```text
//! {"seq":0,"page":1,"panel":2,"name":"hVop","kind":"hist1d","artifact":{...}}
//! ```
//!
//! The file is opened (truncated) when the report opens and flushed when it closes.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::Artifact;
use crate::error::AppError;

#[derive(Serialize)]
struct RecordRef<'a> {
    seq: usize,
    page: usize,
    panel: usize,
    name: &'a str,
    kind: &'a str,
    artifact: &'a Artifact,
}

/// A record read back from a store file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredArtifact {
    pub seq: usize,
    pub page: usize,
    pub panel: usize,
    pub name: String,
    pub kind: String,
    pub artifact: Artifact,
}

pub struct ObjectStore {
    path: PathBuf,
    writer: BufWriter<File>,
    count: usize,
}

impl ObjectStore {
    pub fn create(path: &Path) -> Result<Self, AppError> {
        let file = File::create(path)
            .map_err(|e| AppError::config(format!("Failed to create store '{}': {e}", path.display())))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            count: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Append one artifact, tagged with the page and panel it was drawn on.
    pub fn write(&mut self, page: usize, panel: usize, artifact: &Artifact) -> Result<(), AppError> {
        let record = RecordRef {
            seq: self.count,
            page,
            panel,
            name: artifact.name(),
            kind: artifact.kind_label(),
            artifact,
        };
        serde_json::to_writer(&mut self.writer, &record)
            .map_err(|e| AppError::io(format!("Failed to serialise '{}': {e}", artifact.name())))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", self.path.display())))?;
        self.count += 1;
        Ok(())
    }

    /// Flush and return the number of records written.
    pub fn close(mut self) -> Result<usize, AppError> {
        self.writer
            .flush()
            .map_err(|e| AppError::io(format!("Failed to flush '{}': {e}", self.path.display())))?;
        Ok(self.count)
    }
}

/// Read every record of a store file.
pub fn load_records(path: &Path) -> Result<Vec<StoredArtifact>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open store '{}': {e}", path.display())))?;
    let mut out = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| AppError::io(format!("Failed to read '{}': {e}", path.display())))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: StoredArtifact = serde_json::from_str(&line)
            .map_err(|e| AppError::io(format!("{}:{}: invalid record: {e}", path.display(), i + 1)))?;
        out.push(record);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Graph, Histogram1D};

    #[test]
    fn records_are_numbered_and_reloadable() {
        let dir = std::env::temp_dir().join("sipm_report_store_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("objects.jsonl");

        let mut store = ObjectStore::create(&path).unwrap();
        let mut h = Histogram1D::new("hVop", "Vop;V;count", 10, 50.0, 60.0).unwrap();
        h.fill(55.2);
        store.write(1, 1, &h.into()).unwrap();
        let g = Graph::from_points("board1", "Board 1", vec![(50.0, 0.0), (51.0, 0.1)]);
        store.write(1, 2, &g.into()).unwrap();
        assert_eq!(store.close().unwrap(), 2);

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].seq, 0);
        assert_eq!(records[0].kind, "hist1d");
        assert_eq!(records[1].name, "board1");
        assert_eq!(records[1].panel, 2);
        match &records[0].artifact {
            Artifact::Hist1D(h) => assert_eq!(h.entries, 1),
            other => panic!("unexpected artifact {other:?}"),
        }
    }
}
