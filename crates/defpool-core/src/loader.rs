//! Loading a bundled set of interdependent descriptor files.
//!
//! A [`DescriptorBundle`] is the list of serialized descriptors an
//! application ships with, each carrying the names of the files it
//! imports. [`DefPool::load_bundled`] loads one of them together with its
//! dependency closure, dependencies first, skipping anything the pool
//! already has. Diamond-shaped graphs therefore load each file once.
//!
//! Bundled descriptors are expected to be well formed. A failure here is
//! a packaging bug rather than bad input, so it is logged and reported as
//! `false` instead of an error to recover from.

use crate::error::{Error, Result};
use crate::layout::FileLayout;
use crate::pool::DefPool;
use bytes::Bytes;
use prost::Message;
use prost_types::FileDescriptorProto;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, error};

/// One serialized descriptor in a bundle
#[derive(Debug, Clone)]
pub struct BundledFile {
    /// File name; must match the name inside the descriptor
    pub name: String,
    /// Names of the files this one imports
    pub dependencies: Vec<String>,
    /// Serialized `FileDescriptorProto`
    pub descriptor: Bytes,
    /// Precomputed layouts, if available
    pub layout: Option<FileLayout>,
}

impl BundledFile {
    /// Creates a bundled file without precomputed layouts
    pub fn new(
        name: impl Into<String>,
        dependencies: impl IntoIterator<Item = impl Into<String>>,
        descriptor: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            descriptor: descriptor.into(),
            layout: None,
        }
    }

    /// Attaches precomputed layouts
    pub fn with_layout(mut self, layout: FileLayout) -> Self {
        self.layout = Some(layout);
        self
    }
}

/// A set of bundled descriptors addressable by file name
#[derive(Debug, Clone, Default)]
pub struct DescriptorBundle {
    files: Vec<BundledFile>,
    by_name: FxHashMap<String, usize>,
}

impl DescriptorBundle {
    /// Creates an empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file. Returns false, leaving the bundle unchanged, if a file
    /// of that name is already bundled.
    pub fn push(&mut self, file: BundledFile) -> bool {
        if self.by_name.contains_key(&file.name) {
            return false;
        }
        self.by_name.insert(file.name.clone(), self.files.len());
        self.files.push(file);
        true
    }

    /// Finds a bundled file by name
    pub fn get(&self, name: &str) -> Option<&BundledFile> {
        self.by_name.get(name).map(|&index| &self.files[index])
    }

    /// Iterates over bundled files in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &BundledFile> + '_ {
        self.files.iter()
    }

    /// Number of bundled files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if the bundle is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FromIterator<BundledFile> for DescriptorBundle {
    fn from_iter<I: IntoIterator<Item = BundledFile>>(iter: I) -> Self {
        let mut bundle = Self::new();
        for file in iter {
            bundle.push(file);
        }
        bundle
    }
}

/// Options for loading bundles
#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    /// Ignore bundled layouts and derive them from the descriptors
    pub rebuild_layouts: bool,
}

impl LoaderConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether bundled layouts are ignored
    pub fn rebuild_layouts(mut self, rebuild: bool) -> Self {
        self.rebuild_layouts = rebuild;
        self
    }
}

impl DefPool {
    /// Loads `name` and its dependency closure from `bundle`.
    ///
    /// Returns false if any file of the closure fails to load. The cause
    /// is logged at error level; callers should treat this as fatal.
    pub fn load_bundled(&mut self, bundle: &DescriptorBundle, name: &str) -> bool {
        self.load_bundled_with_config(bundle, name, &LoaderConfig::default())
    }

    /// Like [`load_bundled`](Self::load_bundled) with explicit options
    pub fn load_bundled_with_config(
        &mut self,
        bundle: &DescriptorBundle,
        name: &str,
        config: &LoaderConfig,
    ) -> bool {
        let mut in_progress = FxHashSet::default();
        match self.load_closure(bundle, name, config, &mut in_progress) {
            Ok(()) => true,
            Err(err) => {
                error!(
                    file = name,
                    "error loading bundled descriptor (this should never happen): {err}"
                );
                false
            }
        }
    }

    fn load_closure<'b>(
        &mut self,
        bundle: &'b DescriptorBundle,
        name: &'b str,
        config: &LoaderConfig,
        in_progress: &mut FxHashSet<&'b str>,
    ) -> Result<()> {
        if self.find_file_by_name(name).is_some() {
            return Ok(());
        }

        let bundled = bundle
            .get(name)
            .ok_or_else(|| Error::bundle_load(name, "file is not part of the bundle"))?;
        if !in_progress.insert(&bundled.name) {
            return Err(Error::bundle_load(name, "dependency cycle"));
        }

        for dependency in &bundled.dependencies {
            self.load_closure(bundle, dependency, config, in_progress)?;
        }

        let decoded = FileDescriptorProto::decode(bundled.descriptor.clone());
        self.record_bytes_loaded(bundled.descriptor.len());
        let proto = decoded.map_err(|err| {
            Error::bundle_load(name, format!("failed to parse bundled descriptor: {err}"))
        })?;
        if proto.name() != name {
            return Err(Error::bundle_load(
                name,
                format!("descriptor declares file name '{}'", proto.name()),
            ));
        }

        let layout = if config.rebuild_layouts {
            None
        } else {
            bundled.layout.as_ref()
        };
        self.add_file_with_layout(&proto, layout)
            .map_err(|err| Error::bundle_load(name, err.to_string()))?;
        debug!(file = name, bytes = bundled.descriptor.len(), "loaded bundled file");

        in_progress.remove(name);
        Ok(())
    }
}
