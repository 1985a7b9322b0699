//! Metabundle engine
//!
//! Flattens per-module symbolic metadata of a library into a single bundle:
//! - `schema`: the metadata IR
//! - `host`: sources of per-module metadata
//! - `bundler`: export resolution, canonicalization, value conversion and private naming
//! - `options`: flat-module index entry point
//! - `error`: error types
//!
//! # Example
//!
//! ```rust,ignore
//! use metabundle_engine::{DirectoryHost, MetadataBundler};
//!
//! let host = DirectoryHost::new("dist/lib");
//! let bundle = MetadataBundler::new("public_api", "@scope/lib", &host).get_metadata_bundle()?;
//! println!("{}", bundle.to_json(true)?);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bundler;
pub mod error;
pub mod host;
pub mod options;
pub mod schema;

pub use bundler::{MetadataBundle, MetadataBundler, PrivateMetadata};
pub use error::{BundleError, BundleResult, ConfigError, IndexError};
pub use host::{DirectoryHost, MemoryHost, MetadataHost, MetadataStore};
pub use options::{create_bundle_index, BundleConfig, BundleIndex, Diagnostic, FlatModuleOptions};
pub use schema::{MetadataValue, ModuleMetadata, Reference, SymbolicNode, METADATA_VERSION};
