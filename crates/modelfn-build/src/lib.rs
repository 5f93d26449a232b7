//! Artifact synthesis: bind a generated adapter type to one model file,
//! compile it through the opaque compiler capability, and package compiled
//! entries, generated source, model bytes, and the service-discovery
//! descriptor into a single deployable archive.

pub mod archive;
pub mod compile;
pub mod unit;


use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

pub use archive::{ArchiveError, SERVICE_CONTRACT, service_descriptor_entry, write_archive};
pub use compile::{ArchiveEntry, CompileError, CompiledArtifact, Compiler, RustcCompiler};
pub use unit::GeneratedUnit;

///
/// BuildError
/// Any step failing aborts the whole build; no partial archive survives.
///

#[derive(Debug, ThisError)]
pub enum BuildError {
    #[error("target type name {name:?} is not a valid identifier")]
    InvalidTypeName { name: String },

    #[error("model file {path:?} has no usable base name")]
    InvalidModelPath { path: PathBuf },

    #[error("model file {path:?} could not be read: {source}")]
    ModelRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Synthesize the deployable unit for one model: generated adapter type,
/// compiled entries, embedded model resource (under its base file name),
/// and service descriptor, packaged into a single archive at
/// `archive_path`.
pub fn build(
    target_name: &str,
    model_file: &Path,
    archive_path: &Path,
    compiler: &dyn Compiler,
) -> Result<PathBuf, BuildError> {
    let model_bytes = fs::read(model_file).map_err(|source| BuildError::ModelRead {
        path: model_file.to_path_buf(),
        source,
    })?;

    let unit = GeneratedUnit::bind(target_name, model_file)?;

    let artifact = compiler.compile(&unit, &model_bytes)?;

    let mut entries = artifact.entries;
    entries.push(ArchiveEntry {
        name: format!("src/{}.rs", unit.module_name()),
        bytes: unit.source().as_bytes().to_vec(),
    });
    entries.push(ArchiveEntry {
        name: unit.model_base_name().to_string(),
        bytes: model_bytes,
    });
    entries.push(service_descriptor_entry(unit.type_name()));

    write_archive(archive_path, &entries)?;

    Ok(archive_path.to_path_buf())
}
