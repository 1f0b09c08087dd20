use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use cookbook_core::{Catalog, CatalogError, TemplateRecord};
use cookbook_logging::{cookbook_debug, cookbook_info};
use serde::Deserialize;
use tempfile::NamedTempFile;
use thiserror::Error;

pub const CATALOG_FILENAME: &str = "templates.json";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("catalog {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("catalog {path} is invalid: {error}")]
    Invalid { path: PathBuf, error: CatalogError },
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Writes `{dir}/{filename}` through a temp file in the same directory, then renames it
/// over the target. Readers see either the old file or the complete new one.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        self.write_with(filename, |out| out.write_all(content.as_bytes()))
    }

    /// Streams content into the temp file. If `fill` fails, the temp file is
    /// removed and the target is left untouched.
    pub fn write_with<F>(&self, filename: &str, fill: F) -> Result<PathBuf, PersistError>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            fill(&mut out)?;
            out.flush()?;
        }
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        cookbook_debug!("wrote {}", target.display());
        Ok(target)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCatalog {
    Flat(Vec<TemplateRecord>),
    Wrapped { templates: Vec<TemplateRecord> },
}

/// The durable `templates.json` snapshot.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    writer: AtomicFileWriter,
    filename: String,
}

impl CatalogStore {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(output_dir),
            filename: CATALOG_FILENAME.to_string(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.writer.dir().join(&self.filename)
    }

    /// Loads the snapshot. A missing file is an empty catalog.
    pub fn load(&self) -> Result<Catalog, PersistError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                cookbook_info!("no catalog at {}, starting empty", path.display());
                return Ok(Catalog::new());
            }
            Err(err) => return Err(PersistError::Io(err)),
        };
        load_catalog_str(&content, &path)
    }

    pub fn save(&self, catalog: &Catalog) -> Result<PathBuf, PersistError> {
        let records = catalog.records();
        let path = self.writer.write_with(&self.filename, |out| {
            serde_json::to_writer_pretty(&mut *out, records).map_err(io::Error::other)?;
            out.write_all(b"\n")
        })?;
        cookbook_info!("saved {} templates to {}", records.len(), path.display());
        Ok(path)
    }
}

/// Parses a snapshot: a flat array, or the older `{"templates": [...]}` wrapper.
pub fn load_catalog_str(content: &str, path: &Path) -> Result<Catalog, PersistError> {
    let stored: StoredCatalog =
        serde_json::from_str(content).map_err(|err| PersistError::Corrupt {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    let records = match stored {
        StoredCatalog::Flat(records) | StoredCatalog::Wrapped { templates: records } => records,
    };
    Catalog::from_records(records).map_err(|error| PersistError::Invalid {
        path: path.to_path_buf(),
        error,
    })
}
