//! Package identity types and store naming.
//!
//! # Overview
//!
//! - **Version**: integer-component versions with zero-padded comparison
//! - **PackageKind**: single file or tar archive, detected from the extension
//! - **PackageDescriptor**: the metadata extracted from one package file
//! - **Naming**: the `<name>/<version>/<name>-<version>.<ext>` store layout
//!
//! # Type Hierarchy
//!
//! ```text
//! PackageDescriptor
//! ├── name: String
//! ├── version: Version
//! ├── requirements: Vec<Requirement>
//! │                 └── (name: String, version: Version)
//! ├── summary: String
//! └── kind: PackageKind (Single | Archive)
//! ```

mod descriptor;
mod naming;
mod version;

pub use descriptor::{PackageDescriptor, PackageKind, Requirement};
pub use naming::{
    is_hidden, is_valid_name, package_filename, package_path, package_relative_path,
    parse_package_filename, INDEX_FILENAME,
};
pub use version::{Version, VersionError};
