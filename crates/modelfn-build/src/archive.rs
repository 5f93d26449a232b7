use crate::compile::ArchiveEntry;
use std::{io::Write, path::Path};
use thiserror::Error as ThisError;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// The adapter contract a deployed unit implements; service descriptors
/// map this name to the concrete generated type.
pub const SERVICE_CONTRACT: &str = "modelfn.EvaluatorFn";

///
/// ArchiveError
///

#[derive(Debug, ThisError)]
pub enum ArchiveError {
    #[error("archive {path} could not be written: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("archive entry {name} could not be written: {source}")]
    Entry {
        name: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("archive {path} could not be persisted: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The service-discovery descriptor: one line naming the sole concrete
/// implementation of the adapter contract, at the conventional location a
/// loader scans without explicit registration code.
#[must_use]
pub fn service_descriptor_entry(impl_name: &str) -> ArchiveEntry {
    ArchiveEntry {
        name: format!("META-INF/services/{SERVICE_CONTRACT}"),
        bytes: format!("{impl_name}\n").into_bytes(),
    }
}

/// Write all entries into a single zip at `path`, overwriting an existing
/// file. The archive is assembled in a sibling temp file and renamed into
/// place on success, so a failed build never leaves a partial artifact.
pub fn write_archive(path: &Path, entries: &[ArchiveEntry]) -> Result<(), ArchiveError> {
    let display = path.display().to_string();

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staging = tempfile::NamedTempFile::new_in(parent).map_err(|source| ArchiveError::Io {
        path: display.clone(),
        source,
    })?;

    {
        let mut writer = ZipWriter::new(staging.as_file_mut());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in entries {
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|source| ArchiveError::Entry {
                    name: entry.name.clone(),
                    source,
                })?;
            writer
                .write_all(&entry.bytes)
                .map_err(|source| ArchiveError::Io {
                    path: display.clone(),
                    source,
                })?;
        }

        writer.finish().map_err(|source| ArchiveError::Entry {
            name: display.clone(),
            source,
        })?;
    }

    staging
        .persist(path)
        .map_err(|err| ArchiveError::Persist {
            path: display,
            source: err.error,
        })?;

    Ok(())
}

///
/// TESTS
///
