//! Archive contents encoding.
//!
//! Snapshots carry the index in the archive contents format clients expect:
//!
//! ```text
//! (1
//!  (bar . [(0 3) nil "Bar things" tar])
//!  (foo . [(1 2) ((bar (0 3))) "Foo mode" single]))
//! ```
//!
//! The leading integer is the format version. Each entry pairs a package
//! name with a vector of `[version requirements summary kind]`. Extra
//! trailing vector elements written by other tools are ignored on read.

use thiserror::Error;

use super::ArchiveIndex;
use crate::package::{is_valid_name, PackageDescriptor, PackageKind, Requirement, Version};
use crate::sexp::{self, Sexp, SexpError};

/// The only archive contents format version this crate reads and writes.
pub const FORMAT_VERSION: u64 = 1;

/// Result type for contents encoding.
pub type ContentsResult<T> = Result<T, ContentsError>;

/// Errors produced when decoding archive contents.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentsError {
    /// The text is not a valid s-expression.
    #[error("malformed contents: {0}")]
    Syntax(#[from] SexpError),

    /// The format version is missing or not supported.
    #[error("unsupported contents format: {0}")]
    UnsupportedFormat(String),

    /// An entry does not have the expected shape.
    #[error("invalid entry '{}': {reason}", .name.as_deref().unwrap_or("?"))]
    InvalidEntry {
        name: Option<String>,
        reason: String,
    },
}

impl ContentsError {
    fn entry(name: Option<&str>, reason: impl Into<String>) -> Self {
        ContentsError::InvalidEntry {
            name: name.map(str::to_string),
            reason: reason.into(),
        }
    }
}

fn version_sexp(version: &Version) -> Sexp {
    Sexp::List(version.components().iter().map(|&c| Sexp::Integer(c)).collect())
}

fn requirements_sexp(requirements: &[Requirement]) -> Sexp {
    Sexp::List(
        requirements
            .iter()
            .map(|req| Sexp::List(vec![Sexp::symbol(&req.name), version_sexp(&req.version)]))
            .collect(),
    )
}

/// Check that `descriptor` survives an encode and decode unchanged.
///
/// The package name and every requirement name must be usable package
/// names; see [`is_valid_name`].
pub fn validate_entry(descriptor: &PackageDescriptor) -> ContentsResult<()> {
    if !is_valid_name(&descriptor.name) {
        return Err(ContentsError::entry(
            Some(&descriptor.name),
            "package name cannot be written to archive contents",
        ));
    }
    if let Some(req) = descriptor.requirements.iter().find(|r| !is_valid_name(&r.name)) {
        return Err(ContentsError::entry(
            Some(&descriptor.name),
            format!("requirement name '{}' cannot be written to archive contents", req.name),
        ));
    }
    Ok(())
}

/// Encode one descriptor as an `(name . [...])` entry.
pub fn encode_entry(descriptor: &PackageDescriptor) -> Sexp {
    Sexp::pair(
        Sexp::symbol(&descriptor.name),
        Sexp::Vector(vec![
            version_sexp(&descriptor.version),
            requirements_sexp(&descriptor.requirements),
            Sexp::string(&descriptor.summary),
            Sexp::symbol(descriptor.kind.wire_name()),
        ]),
    )
}

/// Encode an index into archive contents text.
///
/// Entries are written in name order, one per line, so equal indexes always
/// encode to identical bytes.
pub fn encode(index: &ArchiveIndex) -> String {
    let mut out = format!("({}", FORMAT_VERSION);
    for descriptor in index {
        out.push_str("\n ");
        out.push_str(&encode_entry(descriptor).to_string());
    }
    out.push_str(")\n");
    out
}

fn decode_version(form: &Sexp, name: Option<&str>) -> ContentsResult<Version> {
    let items = form
        .as_list()
        .ok_or_else(|| ContentsError::entry(name, format!("version is not a list: {}", form)))?;
    let components = items
        .iter()
        .map(|c| {
            c.as_integer().ok_or_else(|| {
                ContentsError::entry(name, format!("version component is not an integer: {}", c))
            })
        })
        .collect::<ContentsResult<Vec<_>>>()?;
    Version::new(components).map_err(|e| ContentsError::entry(name, e.to_string()))
}

fn decode_requirements(form: &Sexp, name: Option<&str>) -> ContentsResult<Vec<Requirement>> {
    let items = form.as_list().ok_or_else(|| {
        ContentsError::entry(name, format!("requirements are not a list: {}", form))
    })?;

    items
        .iter()
        .map(|item| {
            let parts = item
                .as_list()
                .filter(|parts| parts.len() == 2)
                .ok_or_else(|| ContentsError::entry(name, format!("bad requirement: {}", item)))?;
            let dep = parts[0].as_symbol().ok_or_else(|| {
                ContentsError::entry(name, format!("requirement name is not a symbol: {}", item))
            })?;
            Ok(Requirement::new(dep, decode_version(&parts[1], name)?))
        })
        .collect()
}

/// Decode one `(name . [...])` entry.
pub fn decode_entry(form: &Sexp) -> ContentsResult<PackageDescriptor> {
    let (car, cdr) = form
        .as_pair()
        .ok_or_else(|| ContentsError::entry(None, format!("expected (name . [...]): {}", form)))?;

    let name = car
        .as_symbol()
        .filter(|n| is_valid_name(n))
        .ok_or_else(|| ContentsError::entry(None, format!("bad package name: {}", car)))?;
    let fields = cdr
        .as_vector()
        .filter(|fields| fields.len() >= 4)
        .ok_or_else(|| ContentsError::entry(Some(name), "expected a vector of at least 4 fields"))?;

    let version = decode_version(&fields[0], Some(name))?;
    let requirements = decode_requirements(&fields[1], Some(name))?;
    let summary = fields[2]
        .as_str()
        .ok_or_else(|| ContentsError::entry(Some(name), "summary is not a string"))?;
    let kind = fields[3]
        .as_symbol()
        .and_then(PackageKind::from_wire_name)
        .ok_or_else(|| ContentsError::entry(Some(name), format!("unknown kind: {}", fields[3])))?;

    Ok(PackageDescriptor::new(name, version, kind)
        .with_summary(summary)
        .with_requirements(requirements))
}

/// Parse a single serialized entry, as sent with a publish request.
pub fn parse_entry(text: &str) -> ContentsResult<PackageDescriptor> {
    decode_entry(&sexp::parse(text)?)
}

/// Decode archive contents text into an index.
///
/// A name appearing twice keeps its last entry.
pub fn decode(text: &str) -> ContentsResult<ArchiveIndex> {
    let form = sexp::parse(text)?;
    let items = form
        .as_list()
        .ok_or_else(|| ContentsError::UnsupportedFormat("contents are not a list".to_string()))?;

    match items.first().and_then(Sexp::as_integer) {
        Some(FORMAT_VERSION) => {}
        Some(other) => return Err(ContentsError::UnsupportedFormat(format!("version {}", other))),
        None => {
            return Err(ContentsError::UnsupportedFormat(
                "missing format version".to_string(),
            ))
        }
    }

    let mut index = ArchiveIndex::new();
    for entry in &items[1..] {
        index.upsert(decode_entry(entry)?);
    }
    Ok(index)
}
