//! Compatibility checking - one call from a JSON schema and a model to a report.
//!
//! Also checks single files or whole directories of `.json` schemas.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::document::SchemaDocument;
use crate::error::{CheckError, LoadError};
use crate::loader::load_schema;
use crate::model::ModelId;
use crate::registry::ConstraintRegistry;
use crate::rules::ResolvedConstraints;
use crate::traverse::traverse;
use crate::types::{SchemaDraft, ValidationIssue};

/// Outcome of checking one schema for one model.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub provider: String,
    pub model_id: String,
    pub compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_draft: Option<SchemaDraft>,
    pub issues: Vec<ValidationIssue>,
}

impl CheckReport {
    fn new(constraints: &ResolvedConstraints, issues: Vec<ValidationIssue>) -> Self {
        Self {
            provider: constraints.provider.clone(),
            model_id: constraints.model_id.clone(),
            compatible: issues.is_empty(),
            preferred_draft: constraints.rules.preferred_draft,
            issues,
        }
    }

    /// Turn a report with issues into an error, for fail-fast callers.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Incompatible` carrying every issue.
    pub fn into_result(self) -> Result<Self, CheckError> {
        if self.compatible {
            Ok(self)
        } else {
            Err(CheckError::Incompatible {
                issues: self.issues,
            })
        }
    }
}

/// Check a JSON schema against the rules registered for `model`.
pub fn check(schema: &Value, model: &ModelId, registry: &ConstraintRegistry) -> CheckReport {
    let constraints = registry.resolve(model);
    let doc = SchemaDocument::from_value(schema);
    check_document(&doc, &constraints)
}

/// Check an already-built document against resolved constraints.
pub fn check_document(doc: &SchemaDocument, constraints: &ResolvedConstraints) -> CheckReport {
    CheckReport::new(constraints, traverse(doc, constraints))
}

/// Make sure `schema` compiles as a JSON Schema before checking it.
///
/// # Errors
///
/// Returns `CheckError::InvalidSchema` if the document is not a usable schema.
pub fn ensure_compiles(schema: &Value) -> Result<(), CheckError> {
    jsonschema::validator_for(schema)
        .map(|_| ())
        .map_err(|e| CheckError::InvalidSchema {
            message: e.to_string(),
        })
}

/// Status of one checked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Incompatible,
    Error,
}

/// Result of checking a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Exit code of the error, set when `status` is `Error`.
    #[serde(skip)]
    pub exit_code: Option<i32>,
}

impl FileResult {
    fn failed(file: PathBuf, error: CheckError) -> Self {
        Self {
            file,
            status: FileStatus::Error,
            issues: Vec::new(),
            error: Some(error.to_string()),
            exit_code: Some(error.exit_code()),
        }
    }
}

/// Result of checking a file or directory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub path: PathBuf,
    pub provider: String,
    pub model_id: String,
    pub files_checked: usize,
    pub compatible: usize,
    pub incompatible: usize,
    pub errors: usize,
    pub results: Vec<FileResult>,
}

impl BatchReport {
    /// Returns true if every file loaded and was compatible.
    pub fn is_ok(&self) -> bool {
        self.incompatible == 0 && self.errors == 0
    }

    /// Process exit code: the most severe file error (3 for IO, 2 for
    /// invalid input), else 1 if any file is incompatible, else 0.
    pub fn exit_code(&self) -> i32 {
        match self.results.iter().filter_map(|r| r.exit_code).max() {
            Some(code) => code,
            None if self.incompatible > 0 => 1,
            None => 0,
        }
    }
}

/// Options for [`check_path`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    /// Reject documents that do not compile as JSON Schema.
    pub compile_check: bool,
}

/// Check one `.json` file or every `.json` file under a directory.
///
/// Files are resolved once against the same model and reported sorted by path.
/// A missing path or unreadable directory is reported as an error result.
pub fn check_path(
    path: &Path,
    model: &ModelId,
    registry: &ConstraintRegistry,
    options: CheckOptions,
) -> BatchReport {
    let constraints = registry.resolve(model);
    let (files, unreadable) = collect_schema_files(path);

    let mut results: Vec<FileResult> = files
        .iter()
        .map(|file| check_file(file, path, &constraints, options))
        .collect();
    results.extend(
        unreadable
            .into_iter()
            .map(|(dir, error)| FileResult::failed(display_path(&dir, path), error.into())),
    );
    results.sort_by(|a, b| a.file.cmp(&b.file));

    let count = |status: FileStatus| results.iter().filter(|r| r.status == status).count();

    BatchReport {
        path: path.to_path_buf(),
        provider: constraints.provider.clone(),
        model_id: constraints.model_id.clone(),
        files_checked: results.len(),
        compatible: count(FileStatus::Ok),
        incompatible: count(FileStatus::Incompatible),
        errors: count(FileStatus::Error),
        results,
    }
}

fn display_path(file: &Path, base_path: &Path) -> PathBuf {
    let display = file.strip_prefix(base_path).unwrap_or(file);
    if display.as_os_str().is_empty() {
        file.file_name().map(PathBuf::from).unwrap_or_else(|| file.to_path_buf())
    } else {
        display.to_path_buf()
    }
}

fn check_file(
    file: &Path,
    base_path: &Path,
    constraints: &ResolvedConstraints,
    options: CheckOptions,
) -> FileResult {
    let display = display_path(file, base_path);

    let loaded = load_schema(file).map_err(CheckError::from).and_then(|schema| {
        if options.compile_check {
            ensure_compiles(&schema)?;
        }
        Ok(schema)
    });

    match loaded {
        Ok(schema) => {
            let report = check_document(&SchemaDocument::from_value(&schema), constraints);
            FileResult {
                file: display,
                status: if report.compatible {
                    FileStatus::Ok
                } else {
                    FileStatus::Incompatible
                },
                issues: report.issues,
                error: None,
                exit_code: None,
            }
        }
        Err(e) => FileResult::failed(display, e),
    }
}

/// Collect all .json files in a path (file or directory), plus the
/// paths that could not be listed.
fn collect_schema_files(path: &Path) -> (Vec<PathBuf>, Vec<(PathBuf, LoadError)>) {
    let mut files = Vec::new();
    let mut unreadable = Vec::new();

    if !path.exists() {
        unreadable.push((
            path.to_path_buf(),
            LoadError::FileNotFound {
                path: path.to_path_buf(),
            },
        ));
    } else if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        collect_files_recursive(path, &mut files, &mut unreadable);
        files.sort();
    }
    (files, unreadable)
}

fn collect_files_recursive(
    dir: &Path,
    files: &mut Vec<PathBuf>,
    unreadable: &mut Vec<(PathBuf, LoadError)>,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) => {
            unreadable.push((
                dir.to_path_buf(),
                LoadError::ReadError {
                    path: dir.to_path_buf(),
                    source,
                },
            ));
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files, unreadable);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}
