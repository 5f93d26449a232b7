use std::{
    fs::File,
    io::{Cursor, Read},
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

///
/// ResourceError
///

#[derive(Debug, ThisError)]
pub enum ResourceError {
    #[error("resource {name} is unavailable: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

///
/// Resource
/// A named, re-readable source of model definition bytes. Each `open`
/// yields a fresh reader; the adapter reads it once per successful model
/// construction and never mutates it.
///

pub trait Resource: Send + Sync {
    fn name(&self) -> &str;

    fn open(&self) -> Result<Box<dyn Read + Send>, ResourceError>;
}

///
/// FileResource
///

#[derive(Clone, Debug)]
pub struct FileResource {
    path: PathBuf,
    name: String,
}

impl FileResource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();

        Self { path, name }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Resource for FileResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Box<dyn Read + Send>, ResourceError> {
        let file = File::open(&self.path).map_err(|source| ResourceError::Io {
            name: self.name.clone(),
            source,
        })?;

        Ok(Box::new(file))
    }
}

///
/// EmbeddedResource
/// Bytes compiled into the binary under a stable name. Generated units
/// bind one of these via `include_bytes!`, the analogue of a
/// bundle-relative resource path.
///

#[derive(Clone, Copy, Debug)]
pub struct EmbeddedResource {
    name: &'static str,
    bytes: &'static [u8],
}

impl EmbeddedResource {
    #[must_use]
    pub const fn new(name: &'static str, bytes: &'static [u8]) -> Self {
        Self { name, bytes }
    }

    #[must_use]
    pub const fn bytes(&self) -> &'static [u8] {
        self.bytes
    }
}

impl Resource for EmbeddedResource {
    fn name(&self) -> &str {
        self.name
    }

    fn open(&self) -> Result<Box<dyn Read + Send>, ResourceError> {
        Ok(Box::new(Cursor::new(self.bytes)))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_resource_opens_repeatedly() {
        let resource = EmbeddedResource::new("/model.json", b"{}");

        for _ in 0..2 {
            let mut buf = Vec::new();
            resource.open().unwrap().read_to_end(&mut buf).unwrap();
            assert_eq!(buf, b"{}");
        }
        assert_eq!(resource.name(), "/model.json");
    }

    #[test]
    fn file_resource_reports_missing_path() {
        let resource = FileResource::new("/nonexistent/model.json");
        let err = resource.open().err().unwrap();

        assert!(matches!(err, ResourceError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/model.json"));
    }
}
