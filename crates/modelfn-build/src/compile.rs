use crate::unit::GeneratedUnit;
use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};
use thiserror::Error as ThisError;

///
/// CompileError
///

#[derive(Debug, ThisError)]
pub enum CompileError {
    #[error("compiler workspace could not be prepared: {source}")]
    Workspace {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("rustc exited with {status}:\n{stderr}")]
    Rustc { status: String, stderr: String },

    #[error("compiled artifact missing at {path:?}")]
    MissingArtifact { path: PathBuf },
}

///
/// ArchiveEntry
/// One named byte blob destined for the deployable archive.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

///
/// CompiledArtifact
///

#[derive(Clone, Debug)]
pub struct CompiledArtifact {
    pub entries: Vec<ArchiveEntry>,
}

///
/// Compiler
/// Opaque compilation capability: turn a generated unit (plus the model
/// bytes its `include_bytes!` binding resolves against) into archive-ready
/// compiled entries.
///

pub trait Compiler {
    fn compile(
        &self,
        unit: &GeneratedUnit,
        model_bytes: &[u8],
    ) -> Result<CompiledArtifact, CompileError>;
}

///
/// RustcCompiler
/// Shells out to `rustc`, producing a dynamic library. Extern crate
/// locations are injected by the caller; nothing is discovered.
///

#[derive(Clone, Debug)]
pub struct RustcCompiler {
    rustc: PathBuf,
    externs: Vec<(String, PathBuf)>,
    search_paths: Vec<PathBuf>,
}

impl RustcCompiler {
    #[must_use]
    pub fn new() -> Self {
        let rustc = std::env::var_os("RUSTC").map_or_else(|| PathBuf::from("rustc"), PathBuf::from);

        Self {
            rustc,
            externs: Vec::new(),
            search_paths: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_extern(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.externs.push((name.into(), path.into()));
        self
    }

    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }
}

impl Default for RustcCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler for RustcCompiler {
    fn compile(
        &self,
        unit: &GeneratedUnit,
        model_bytes: &[u8],
    ) -> Result<CompiledArtifact, CompileError> {
        let workspace = tempfile::tempdir().map_err(|source| CompileError::Workspace { source })?;

        let source_path = workspace.path().join(format!("{}.rs", unit.module_name()));
        write_file(&source_path, unit.source().as_bytes())?;

        // the model sits next to the source so the include_bytes! binding
        // resolves during compilation
        write_file(&workspace.path().join(unit.model_base_name()), model_bytes)?;

        let lib_name = format!(
            "lib{}.{}",
            unit.module_name(),
            std::env::consts::DLL_EXTENSION
        );
        let out_path = workspace.path().join(&lib_name);

        let mut command = Command::new(&self.rustc);
        command
            .arg("--edition=2024")
            .arg("--crate-type=cdylib")
            .arg("--crate-name")
            .arg(unit.module_name())
            .arg(&source_path)
            .arg("-o")
            .arg(&out_path);

        for (name, path) in &self.externs {
            command
                .arg("--extern")
                .arg(format!("{name}={}", path.display()));
        }
        for path in &self.search_paths {
            command.arg("-L").arg(path);
        }

        let output = command.output().map_err(|source| CompileError::Launch {
            command: self.rustc.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(CompileError::Rustc {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let bytes = fs::read(&out_path).map_err(|_| CompileError::MissingArtifact {
            path: out_path.clone(),
        })?;

        Ok(CompiledArtifact {
            entries: vec![ArchiveEntry {
                name: format!("lib/{lib_name}"),
                bytes,
            }],
        })
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CompileError> {
    fs::write(path, bytes).map_err(|source| CompileError::Workspace { source })
}

///
/// TESTS
///
