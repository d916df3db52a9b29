//! defpool - Load protobuf descriptor sets into a definition pool
//!
//! This tool reads serialized `FileDescriptorSet`s, loads every file they
//! contain into one pool (dependencies first) and answers symbol queries
//! against it.

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use clap::{Args, Parser};
use defpool_core::{BundledFile, Def, DefPool, DescriptorBundle, Error, Member};
use prost::Message;
use prost_types::FileDescriptorSet;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// File extensions treated as serialized descriptor sets
const DESCRIPTOR_SET_EXTENSIONS: &[&str] = &["pb", "desc", "protoset", "binpb"];

/// Load protobuf descriptor sets into a definition pool and query symbols
#[derive(Parser, Debug)]
#[command(name = "defpool")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Qualified symbol to look up (repeatable)
    #[arg(long, value_name = "SYMBOL")]
    find: Vec<String>,

    /// Print every loaded file and its symbols
    #[arg(long)]
    list: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Serialized FileDescriptorSet to load (repeatable)
    #[arg(short, long = "set", value_name = "FILE")]
    sets: Vec<PathBuf>,

    /// Directory to search for descriptor sets
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Collects descriptor files from several sets into one bundle
#[derive(Default)]
struct BundleCollector {
    bundle: DescriptorBundle,
    /// Maps file name -> content hash of the bundled variant
    seen: HashMap<String, String>,
    stats: CollectorStats,
}

#[derive(Default)]
struct CollectorStats {
    total_found: usize,
    duplicates_skipped: usize,
    conflicts_dropped: usize,
}

impl BundleCollector {
    fn new() -> Self {
        Self::default()
    }

    /// Compute a short hash of the content (first 8 chars of blake3)
    fn content_hash(content: &[u8]) -> String {
        let hash = blake3::hash(content);
        hash.to_hex()[..8].to_string()
    }

    /// Adds every file of a serialized descriptor set
    fn add_set(&mut self, source: &Path, data: &[u8]) -> Result<()> {
        let set = FileDescriptorSet::decode(data)
            .with_context(|| format!("Failed to decode descriptor set: {}", source.display()))?;
        debug!("Found {} file(s) in {}", set.file.len(), source.display());

        for file in set.file {
            let name = file.name().to_string();
            let encoded = Bytes::from(file.encode_to_vec());
            self.add_file(source, BundledFile::new(name, file.dependency, encoded));
        }
        Ok(())
    }

    /// Bundles a file unless a file of the same name already is
    fn add_file(&mut self, source: &Path, file: BundledFile) {
        self.stats.total_found += 1;
        let content_hash = Self::content_hash(&file.descriptor);

        match self.seen.get(&file.name) {
            Some(existing) if *existing == content_hash => {
                trace!("Skipping duplicate: {} (hash: {})", file.name, content_hash);
                self.stats.duplicates_skipped += 1;
            }
            Some(existing) => {
                warn!(
                    "Conflicting definitions of {} (kept {}, dropped {} from {})",
                    file.name,
                    existing,
                    content_hash,
                    source.display()
                );
                self.stats.conflicts_dropped += 1;
            }
            None => {
                self.seen.insert(file.name.clone(), content_hash);
                self.bundle.push(file);
            }
        }
    }

    fn into_bundle(self) -> DescriptorBundle {
        info!(
            "Collected {} file(s): {} found, {} duplicates skipped, {} conflicts dropped",
            self.bundle.len(),
            self.stats.total_found,
            self.stats.duplicates_skipped,
            self.stats.conflicts_dropped
        );
        self.bundle
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let mut collector = BundleCollector::new();
    if let Some(ref directory) = cli.input.directory {
        collect_directory(directory, &mut collector)?;
    } else {
        for set in &cli.input.sets {
            collect_set(set, &mut collector)?;
        }
    }
    let bundle = collector.into_bundle();

    let pool = load_pool(&bundle)?;

    if cli.list {
        print!("{}", list_pool(&pool));
    }
    for symbol in &cli.find {
        match describe_symbol(&pool, symbol) {
            Some(description) => println!("{description}"),
            None => println!("{symbol}: not found"),
        }
    }

    Ok(())
}

/// Read one descriptor set file into the collector
fn collect_set(path: &Path, collector: &mut BundleCollector) -> Result<()> {
    if !path.is_file() {
        bail!("Input path is not a file: {}", path.display());
    }
    trace!("Reading {}", path.display());
    let data = fs::read(path).map_err(|e| Error::file_read(path, e))?;
    collector.add_set(path, &data)
}

/// Collect every descriptor set found under a directory
fn collect_directory(directory: &Path, collector: &mut BundleCollector) -> Result<()> {
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());
    let mut sets_read = 0;

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || !is_descriptor_set(path) {
            continue;
        }

        if let Err(e) = collect_set(path, collector) {
            // Log error but continue with other files
            warn!("Error processing {}: {:#}", path.display(), e);
            continue;
        }
        sets_read += 1;
    }

    info!("Read {} descriptor set(s)", sets_read);
    Ok(())
}

fn is_descriptor_set(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    !hidden && extension.is_some_and(|ext| DESCRIPTOR_SET_EXTENSIONS.contains(&ext.as_str()))
}

/// Load every bundled file and its dependencies
fn load_pool(bundle: &DescriptorBundle) -> Result<DefPool> {
    let mut pool = DefPool::new();
    let mut failed = Vec::new();

    for file in bundle.iter() {
        if !pool.load_bundled(bundle, &file.name) {
            failed.push(file.name.as_str());
        }
    }

    info!(
        "Loaded {} file(s), {} symbol(s), {} extension(s), {} bytes",
        pool.file_count(),
        pool.symbols().len(),
        pool.extension_registry().len(),
        pool.bytes_loaded()
    );

    if !failed.is_empty() {
        bail!("Failed to load {}", failed.join(", "));
    }
    Ok(pool)
}

/// Describe a symbol as `name: kind (file)`
fn describe_symbol(pool: &DefPool, symbol: &str) -> Option<String> {
    let file = pool.find_file_containing_symbol(symbol)?;
    let kind = match pool.symbols().lookup_any(symbol) {
        Some(Def::Message(id)) if pool.is_message_set_item(pool.message(id)) => {
            "message (message-set item)"
        }
        Some(def) => def.kind().as_str(),
        None => match pool.find_member(symbol)? {
            Member::Field(_) => "field",
            Member::Oneof(_) => "oneof",
        },
    };
    Some(format!("{symbol}: {kind} ({})", file.name))
}

/// Render every loaded file with its symbols, sorted by name
fn list_pool(pool: &DefPool) -> String {
    let mut by_file: HashMap<&str, Vec<(&str, &'static str)>> = HashMap::new();
    for (name, def) in pool.symbols().iter() {
        if let Some(file) = pool.find_file_containing_symbol(name) {
            by_file
                .entry(file.name.as_str())
                .or_default()
                .push((name, def.kind().as_str()));
        }
    }

    let mut out = String::new();
    for file in pool.files() {
        out.push_str(&file.name);
        out.push('\n');
        let mut symbols = by_file.remove(file.name.as_str()).unwrap_or_default();
        symbols.sort_unstable();
        for (name, kind) in symbols {
            out.push_str(&format!("  {name} ({kind})\n"));
        }
    }
    out
}
