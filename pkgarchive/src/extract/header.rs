//! Default metadata extractor.
//!
//! Reads the conventional package headers:
//!
//! - **Single files** carry a summary line and `;; Key: value` comment headers:
//!
//!   ```text
//!   ;;; foo.el --- Foo mode  -*- lexical-binding: t -*-
//!   ;; Version: 1.2
//!   ;; Package-Requires: ((bar "0.3") (baz "1"))
//!   ```
//!
//! - **Tar archives** contain a `<name>-<version>/<name>-pkg.el` file holding
//!   a `define-package` form:
//!
//!   ```text
//!   (define-package "foo" "1.2" "Foo mode" '((bar "0.3")))
//!   ```

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use super::{ExtractionError, ExtractionResult, MetadataExtractor};
use crate::package::{PackageDescriptor, PackageKind, Requirement, Version};
use crate::scanner::Candidate;
use crate::sexp::{self, Sexp};

/// Header that ends the commentary section of a single file.
const CODE_MARKER: &str = ";;; Code:";

/// Extractor for single-file and tar packages.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderExtractor;

impl HeaderExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    fn extract_single(&self, candidate: &Candidate) -> ExtractionResult<PackageDescriptor> {
        let path = &candidate.path;
        let content = fs::read_to_string(path).map_err(|e| ExtractionError::Read {
            path: path.clone(),
            source: e,
        })?;

        let summary = parse_summary_line(&candidate.name, &content).ok_or_else(|| {
            ExtractionError::MissingHeader {
                path: path.clone(),
                header: "summary line",
            }
        })?;

        let version = match header_value(&content, "Package-Version")
            .or_else(|| header_value(&content, "Version"))
        {
            Some(value) => parse_version(path, &value)?,
            None => candidate.version.clone(),
        };

        let requirements = match header_value(&content, "Package-Requires") {
            Some(value) => parse_requirements(path, &value)?,
            None => Vec::new(),
        };

        Ok(
            PackageDescriptor::new(candidate.name.clone(), version, PackageKind::Single)
                .with_summary(summary)
                .with_requirements(requirements),
        )
    }

    fn extract_archive(&self, candidate: &Candidate) -> ExtractionResult<PackageDescriptor> {
        let path = &candidate.path;
        let expected = format!("{}-pkg.el", candidate.name);
        let content = read_archive_member(path, &expected)?;

        let forms = sexp::parse_all(&content).map_err(|_| ExtractionError::MissingHeader {
            path: path.clone(),
            header: "well-formed define-package form",
        })?;

        let args = forms
            .iter()
            .filter_map(|form| form.as_list())
            .find(|items| items.first().and_then(Sexp::as_symbol) == Some("define-package"))
            .map(|items| &items[1..])
            .ok_or_else(|| ExtractionError::MissingHeader {
                path: path.clone(),
                header: "define-package form",
            })?;

        let name = args.first().and_then(Sexp::as_str).ok_or_else(|| {
            ExtractionError::MissingHeader {
                path: path.clone(),
                header: "package name",
            }
        })?;
        if name != candidate.name {
            return Err(ExtractionError::NameMismatch {
                path: path.clone(),
                expected: candidate.name.clone(),
                found: name.to_string(),
            });
        }

        let version = args.get(1).and_then(Sexp::as_str).ok_or_else(|| {
            ExtractionError::MissingHeader {
                path: path.clone(),
                header: "package version",
            }
        })?;
        let version = parse_version(path, version)?;

        let summary = args.get(2).and_then(Sexp::as_str).unwrap_or_default();

        let requirements = match args.get(3) {
            Some(form) => requirements_from_form(path, form.unquote())?,
            None => Vec::new(),
        };

        Ok(
            PackageDescriptor::new(name, version, PackageKind::Archive)
                .with_summary(summary)
                .with_requirements(requirements),
        )
    }
}

impl MetadataExtractor for HeaderExtractor {
    fn extract(&self, candidate: &Candidate) -> ExtractionResult<PackageDescriptor> {
        match candidate.format {
            PackageKind::Single => self.extract_single(candidate),
            PackageKind::Archive => self.extract_archive(candidate),
        }
    }
}

/// Read the first tar member whose file name is `file_name`.
fn read_archive_member(path: &Path, file_name: &str) -> ExtractionResult<String> {
    let read_err = |e| ExtractionError::Read {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::open(path).map_err(read_err)?;
    let mut archive = tar::Archive::new(file);

    for entry in archive.entries().map_err(read_err)? {
        let mut entry = entry.map_err(read_err)?;
        let matches = entry
            .path()
            .map_err(read_err)?
            .file_name()
            .is_some_and(|n| n == file_name);
        if matches {
            let mut content = String::new();
            entry.read_to_string(&mut content).map_err(read_err)?;
            return Ok(content);
        }
    }

    Err(ExtractionError::MissingPackageFile {
        path: path.to_path_buf(),
        expected: file_name.to_string(),
    })
}

/// Parse the summary from a `;;; <name>.el --- <summary>` first line.
fn parse_summary_line(name: &str, content: &str) -> Option<String> {
    let first = content.lines().next()?;
    let rest = first.strip_prefix(";;;")?.trim_start();
    let rest = rest.strip_prefix(name)?.strip_prefix(".el")?;
    let (_, summary) = rest.split_once("---")?;

    // Drop a trailing file-local variables cookie.
    let summary = match summary.find("-*-") {
        Some(pos) => &summary[..pos],
        None => summary,
    };
    Some(summary.trim().to_string())
}

/// Find a `;; Key: value` header before the code section.
///
/// Keys match case-insensitively; the first occurrence wins.
fn header_value(content: &str, key: &str) -> Option<String> {
    for line in content.lines() {
        if line.starts_with(CODE_MARKER) {
            break;
        }
        let Some(body) = line.strip_prefix(";;") else {
            continue;
        };
        let body = body.trim_start_matches(';').trim();
        if let Some((k, v)) = body.split_once(':') {
            if k.trim().eq_ignore_ascii_case(key) {
                return Some(v.trim().to_string());
            }
        }
    }
    None
}

fn parse_version(path: &Path, value: &str) -> ExtractionResult<Version> {
    value.parse().map_err(|_| ExtractionError::InvalidVersion {
        path: path.to_path_buf(),
        value: value.to_string(),
    })
}

fn parse_requirements(path: &Path, value: &str) -> ExtractionResult<Vec<Requirement>> {
    let form = sexp::parse(value).map_err(|e| ExtractionError::InvalidRequirements {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    requirements_from_form(path, form.unquote())
}

/// Convert `((dep "1.0") (other))` into requirements.
///
/// A dependency without a version requires any version (`0`).
fn requirements_from_form(path: &Path, form: &Sexp) -> ExtractionResult<Vec<Requirement>> {
    let invalid = |reason: String| ExtractionError::InvalidRequirements {
        path: path.to_path_buf(),
        reason,
    };

    let items = form
        .as_list()
        .ok_or_else(|| invalid(format!("expected a list, found {}", form)))?;

    items
        .iter()
        .map(|item| {
            let parts = item
                .as_list()
                .ok_or_else(|| invalid(format!("expected (name \"version\"), found {}", item)))?;
            let name = parts
                .first()
                .and_then(Sexp::as_symbol)
                .ok_or_else(|| invalid(format!("missing dependency name in {}", item)))?;
            let version = match parts.get(1) {
                Some(Sexp::Str(v)) => parse_version(path, v)?,
                Some(other) => {
                    return Err(invalid(format!("version must be a string, found {}", other)))
                }
                None => Version::from_slice(&[0]),
            };
            Ok(Requirement::new(name, version))
        })
        .collect()
}
