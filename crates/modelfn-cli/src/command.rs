use modelfn::build::{Compiler, RustcCompiler, build};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Build a deployable unit, swallowing every failure into a log entry and
/// a `None`. This is the one deliberately lossy boundary; everything
/// beneath it signals failure explicitly.
pub fn evaluate(class_name: &str, model_file: &Path, archive_file: &Path) -> Option<PathBuf> {
    let compiler = compiler_from_env();

    evaluate_with(class_name, model_file, archive_file, &compiler)
}

pub fn evaluate_with(
    class_name: &str,
    model_file: &Path,
    archive_file: &Path,
    compiler: &dyn Compiler,
) -> Option<PathBuf> {
    match build(class_name, model_file, archive_file, compiler) {
        Ok(path) => {
            let path = std::path::absolute(&path).unwrap_or(path);
            info!(archive = %path.display(), "built deployable unit {class_name}");

            Some(path)
        }
        Err(err) => {
            error!("failed to build {class_name}: {err}");

            None
        }
    }
}

/// Extern crate locations come from the environment, never discovery:
/// `MODELFN_EXTERNS` holds comma-separated `name=path` pairs and
/// `MODELFN_SEARCH_PATHS` comma-separated `-L` directories.
fn compiler_from_env() -> RustcCompiler {
    let mut compiler = RustcCompiler::new();

    if let Ok(externs) = std::env::var("MODELFN_EXTERNS") {
        for (name, path) in parse_externs(&externs) {
            compiler = compiler.with_extern(name, path);
        }
    }

    if let Ok(paths) = std::env::var("MODELFN_SEARCH_PATHS") {
        for path in paths.split(',').filter(|path| !path.is_empty()) {
            compiler = compiler.with_search_path(path);
        }
    }

    compiler
}

fn parse_externs(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, path) = pair.split_once('=')?;
            if name.is_empty() || path.is_empty() {
                return None;
            }

            Some((name.to_string(), path.to_string()))
        })
        .collect()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use modelfn::build::{ArchiveEntry, CompileError, CompiledArtifact, GeneratedUnit};

    struct MarkerCompiler;

    impl Compiler for MarkerCompiler {
        fn compile(
            &self,
            unit: &GeneratedUnit,
            _: &[u8],
        ) -> Result<CompiledArtifact, CompileError> {
            Ok(CompiledArtifact {
                entries: vec![ArchiveEntry {
                    name: format!("lib/lib{}.so", unit.module_name()),
                    bytes: Vec::new(),
                }],
            })
        }
    }

    #[test]
    fn success_returns_the_absolute_archive_path() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.json");
        std::fs::write(&model, b"{}").unwrap();
        let archive = dir.path().join("foo.zip");

        let path = evaluate_with("Foo", &model, &archive, &MarkerCompiler).unwrap();

        assert!(path.is_absolute());
        assert!(path.ends_with("foo.zip"));
        assert!(archive.exists());
    }

    #[test]
    fn failure_is_swallowed_into_none() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("foo.zip");

        let result = evaluate_with(
            "Foo",
            &dir.path().join("absent.json"),
            &archive,
            &MarkerCompiler,
        );

        assert!(result.is_none());
        assert!(!archive.exists());
    }

    #[test]
    fn extern_pairs_parse_and_skip_malformed_entries() {
        let externs = parse_externs("modelfn_core=/tmp/a.rlib,broken,=/tmp/b,modelfn_schema=/tmp/c.rlib");

        assert_eq!(
            externs,
            [
                ("modelfn_core".to_string(), "/tmp/a.rlib".to_string()),
                ("modelfn_schema".to_string(), "/tmp/c.rlib".to_string()),
            ]
        );
    }
}
