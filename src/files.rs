use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::errors::DdlError;
use crate::models::schema::Database;

/// Supplies the schema documents to load.
pub trait FileSource {
    fn list_files(&self) -> Result<Vec<PathBuf>, DdlError>;
}

/// Every file with a given extension directly inside one directory, sorted by path.
#[derive(Debug, Clone)]
pub struct DirectoryFileSource {
    dir: PathBuf,
    extension: String,
}

impl DirectoryFileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: "json".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

impl FileSource for DirectoryFileSource {
    fn list_files(&self) -> Result<Vec<PathBuf>, DdlError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let matches = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(self.extension.as_str()))
                .unwrap_or(false);
            if path.is_file() && matches {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Parses one JSON schema document and validates it.
pub fn load_database(path: &Path) -> Result<Database, DdlError> {
    debug!("Loading schema document {}", path.display());
    let content = fs::read_to_string(path)?;
    let database: Database = serde_json::from_str(&content)?;
    database.validate()?;
    Ok(database)
}

pub fn load_databases(source: &dyn FileSource) -> Result<Vec<Database>, DdlError> {
    source
        .list_files()?
        .iter()
        .map(|path| load_database(path))
        .collect()
}
