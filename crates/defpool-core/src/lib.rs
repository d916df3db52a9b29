//! # defpool-core
//!
//! An in-memory registry of protobuf definitions.
//!
//! This crate provides:
//! - Transactional loading of `FileDescriptorProto`s into one namespace
//! - Lookup of messages, enums, enum values, services, extensions and files
//! - Extension resolution by qualified name and by field number
//! - Dependency-ordered loading of bundled descriptor sets
//!
//! ## Architecture
//!
//! - [`pool`]: the [`DefPool`] and its lookups
//! - [`loader`]: loading a [`DescriptorBundle`] with its dependencies
//! - [`def`]: the definition objects
//! - [`symtab`]: the qualified-name symbol table
//! - [`layout`]: compiled message and extension layouts
//! - [`extreg`]: the extension registry
//! - [`error`]: error types and handling
//!
//! ## Example
//!
//! ```
//! use defpool_core::DefPool;
//! use prost_types::{DescriptorProto, FileDescriptorProto};
//!
//! let file = FileDescriptorProto {
//!     name: Some("a.proto".to_string()),
//!     package: Some("pkg".to_string()),
//!     message_type: vec![DescriptorProto {
//!         name: Some("Foo".to_string()),
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//!
//! let mut pool = DefPool::new();
//! pool.add_file(&file)?;
//!
//! let foo = pool.find_message_by_name("pkg.Foo").unwrap();
//! assert_eq!(pool.file(foo.file).name, "a.proto");
//! # Ok::<(), defpool_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

mod arena;
mod builder;
pub mod def;
pub mod error;
pub mod extreg;
mod ids;
pub mod layout;
pub mod loader;
pub mod pool;
pub mod symtab;

// Re-export primary types for convenience
pub use def::{
    Def, DefKind, EnumDef, EnumValueDef, FieldDef, FieldType, FileDef, Label, Member, MessageDef,
    MethodDef, OneofDef, ServiceDef, Syntax, TypeRef,
};
pub use error::{Error, Result};
pub use extreg::ExtensionRegistry;
pub use ids::{EnumId, EnumValueId, ExtensionId, FieldId, FileId, LayoutId, MessageId, ServiceId};
pub use layout::{ExtensionLayout, FieldLayout, FileLayout, MessageLayout, WireType};
pub use loader::{BundledFile, DescriptorBundle, LoaderConfig};
pub use pool::{DefPool, PoolConfig};
pub use symtab::SymbolTable;

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum valid protobuf field number (2^29 - 1)
pub const MAX_FIELD_NUMBER: i32 = 536_870_911;
