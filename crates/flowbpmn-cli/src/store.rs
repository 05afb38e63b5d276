//! File storage for generated BPMN documents.
//!
//! [`ProcessStore`] keeps `.bpmn` files inside one base directory. File
//! names are sanitized to `[A-Za-z0-9_-]` and every resolved path is checked
//! to stay inside the base directory.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use log::{debug, info};
use thiserror::Error;

use flowbpmn::ConversionError;

const EXTENSION: &str = "bpmn";

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Path escapes the storage directory: {0}")]
    OutsideBase(PathBuf),

    #[error("File already exists: {0} (use --overwrite to replace it)")]
    AlreadyExists(PathBuf),

    #[error("No stored process named {0}")]
    NotFound(String),
}

impl From<StoreError> for ConversionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(err) => ConversionError::Io(err),
            other => ConversionError::Io(io::Error::other(other.to_string())),
        }
    }
}

/// Options for [`ProcessStore::save`].
#[derive(Debug, Clone)]
pub struct SaveOptions {
    filename: String,
    overwrite: bool,
}

impl SaveOptions {
    /// Save under an explicit file name.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            overwrite: false,
        }
    }

    /// Save as `<process name>_<unix seconds>`.
    pub fn timestamped(process_name: &str) -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        Self::new(format!("{process_name}_{seconds}"))
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Stored file name for `name`, with a `.bpmn` extension.
fn file_name(name: &str) -> String {
    let stem = name.strip_suffix(".bpmn").unwrap_or(name);
    format!("{}.{EXTENSION}", sanitize(stem))
}

/// Directory of saved BPMN documents.
#[derive(Debug, Clone)]
pub struct ProcessStore {
    base_dir: PathBuf,
}

impl ProcessStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Write `xml` to the store and return the path written.
    ///
    /// The base directory is created on demand.
    ///
    /// # Errors
    ///
    /// Fails when the path would leave the base directory, when the file
    /// exists and overwriting was not requested, or on I/O errors.
    pub fn save(&self, xml: &str, options: &SaveOptions) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.base_dir)?;
        let path = self.resolve(&options.filename)?;

        if path.exists() && !options.overwrite {
            return Err(StoreError::AlreadyExists(path));
        }

        fs::write(&path, xml)?;
        info!(path = path.display().to_string(), bytes = xml.len(); "Saved process");
        Ok(path)
    }

    /// Read a stored document by name, with or without the extension.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no such file exists.
    pub fn load(&self, name: &str) -> Result<String, StoreError> {
        if !self.base_dir.exists() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        let path = self.resolve(name)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        debug!(path = path.display().to_string(); "Loading process");
        Ok(fs::read_to_string(path)?)
    }

    /// Names of stored documents without extension, sorted.
    ///
    /// # Errors
    ///
    /// Returns I/O errors from reading the directory. A missing directory
    /// lists as empty.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = fs::read_dir(&self.base_dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some(EXTENSION)
            })
            .filter_map(|path| Some(path.file_stem()?.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Path of `name` inside the base directory, which must already exist.
    fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        let base = self.base_dir.canonicalize()?;
        let path = base.join(file_name(name));

        match path.parent() {
            Some(parent) if parent == base => Ok(path),
            _ => Err(StoreError::OutsideBase(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Order Intake"), "Order_Intake");
        assert_eq!(sanitize("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize("ok-name_1"), "ok-name_1");
        assert_eq!(file_name("report.bpmn"), "report.bpmn");
        assert_eq!(file_name("a.b"), "a_b.bpmn");
    }

    #[test]
    fn test_save_load_and_list() {
        let dir = tempdir().unwrap();
        let store = ProcessStore::new(dir.path().join("processes"));

        let path = store.save("<xml/>", &SaveOptions::new("Order Intake")).unwrap();

        assert_eq!(path.file_name().unwrap(), "Order_Intake.bpmn");
        assert_eq!(store.load("Order_Intake").unwrap(), "<xml/>");
        assert_eq!(store.load("Order_Intake.bpmn").unwrap(), "<xml/>");
        assert_eq!(store.list().unwrap(), vec!["Order_Intake"]);
    }

    #[test]
    fn test_existing_file_needs_overwrite() {
        let dir = tempdir().unwrap();
        let store = ProcessStore::new(dir.path());

        store.save("first", &SaveOptions::new("p")).unwrap();
        let err = store.save("second", &SaveOptions::new("p")).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(store.load("p").unwrap(), "first");

        store
            .save("second", &SaveOptions::new("p").with_overwrite(true))
            .unwrap();
        assert_eq!(store.load("p").unwrap(), "second");
    }

    #[test]
    fn test_traversal_stays_inside_base() {
        let dir = tempdir().unwrap();
        let store = ProcessStore::new(dir.path().join("inner"));

        let path = store.save("x", &SaveOptions::new("../escape")).unwrap();

        assert_eq!(path.parent().unwrap(), store.base_dir().canonicalize().unwrap());
        assert!(!dir.path().join("escape.bpmn").exists());
    }

    #[test]
    fn test_missing_process() {
        let dir = tempdir().unwrap();
        let store = ProcessStore::new(dir.path());
        assert!(matches!(store.load("nope"), Err(StoreError::NotFound(_))));
        assert!(ProcessStore::new(dir.path().join("absent")).list().unwrap().is_empty());
    }

    #[test]
    fn test_timestamped_name() {
        let options = SaveOptions::timestamped("Order");
        let (name, seconds) = options.filename.split_once('_').unwrap();
        assert_eq!(name, "Order");
        assert!(seconds.parse::<u64>().is_ok());
    }
}
