//! The definition pool.
//!
//! [`DefPool`] owns every definition ever loaded into it together with
//! three indexes over them:
//!
//! - the symbol table, qualified name to [`Def`]
//! - the file table, file name to [`FileId`]
//! - the extension index, [`ExtensionId`] to the extension's [`FieldId`]
//!
//! plus the [`ExtensionRegistry`] that maps (message layout, number) to an
//! extension identity.
//!
//! ## Loading
//!
//! [`DefPool::add_file`] is transactional. Definitions are built into a
//! work arena, symbols are bound as they are declared, and only once the
//! whole file has been built is the work arena fused into the pool and
//! the file made visible in the file table. If any step fails, every
//! symbol owned by the file is removed again and the work arena is
//! dropped, leaving the pool exactly as it was.
//!
//! ## Concurrency
//!
//! The pool is populated through `&mut self` and read through `&self`.
//! Readers that need to run alongside a writer must share it behind a
//! lock of their choosing.

use crate::arena::{ArenaView, DefArena, WorkArena};
use crate::builder::FileBuilder;
use crate::def::{
    Def, DefKind, EnumDef, EnumValueDef, FieldDef, FieldType, FileDef, Label, Member,
    MessageDef, ServiceDef, TypeRef,
};
use crate::error::{Error, Result};
use crate::extreg::ExtensionRegistry;
use crate::ids::{EnumId, EnumValueId, ExtensionId, FieldId, FileId, LayoutId, MessageId, ServiceId};
use crate::layout::{ExtensionLayout, FileLayout, MessageLayout};
use crate::symtab::SymbolTable;
use prost::Message;
use prost_types::FileDescriptorProto;
use rustc_hash::FxHashMap;
use tracing::debug;

#[cfg(test)]
mod tests;

/// Initial sizing of a pool's tables
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Symbols to reserve room for up front
    pub symbol_capacity: usize,
    /// Files to reserve room for up front
    pub file_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            symbol_capacity: 32,
            file_capacity: 4,
        }
    }
}

impl PoolConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial symbol table capacity
    pub fn symbol_capacity(mut self, capacity: usize) -> Self {
        self.symbol_capacity = capacity;
        self
    }

    /// Sets the initial file table capacity
    pub fn file_capacity(mut self, capacity: usize) -> Self {
        self.file_capacity = capacity;
        self
    }
}

/// In-memory registry of protobuf definitions
#[derive(Debug)]
pub struct DefPool {
    arena: DefArena,
    symbols: SymbolTable,
    files: FxHashMap<Box<str>, FileId>,
    extensions: FxHashMap<ExtensionId, FieldId>,
    registry: ExtensionRegistry,
    bytes_loaded: usize,
}

impl Default for DefPool {
    fn default() -> Self {
        Self::new()
    }
}

impl DefPool {
    /// Creates an empty pool
    pub fn new() -> Self {
        Self {
            arena: DefArena::new(),
            symbols: SymbolTable::new(),
            files: FxHashMap::default(),
            extensions: FxHashMap::default(),
            registry: ExtensionRegistry::new(),
            bytes_loaded: 0,
        }
    }

    /// Creates an empty pool with preallocated tables, failing with
    /// [`Error::OutOfMemory`] if they cannot be allocated
    pub fn try_with_config(config: PoolConfig) -> Result<Self> {
        let symbols =
            SymbolTable::try_with_capacity(config.symbol_capacity).ok_or(Error::OutOfMemory)?;
        let mut files = FxHashMap::default();
        files
            .try_reserve(config.file_capacity)
            .map_err(|_| Error::OutOfMemory)?;
        Ok(Self {
            symbols,
            files,
            ..Self::new()
        })
    }

    /// Adds a decoded file, deriving layouts from its definitions
    pub fn add_file(&mut self, proto: &FileDescriptorProto) -> Result<&FileDef> {
        self.add_file_with_layout(proto, None)
    }

    /// Decodes and adds a serialized `FileDescriptorProto`.
    ///
    /// The input counts toward [`bytes_loaded`](Self::bytes_loaded) even
    /// if it fails to decode.
    pub fn add_file_bytes(&mut self, bytes: &[u8]) -> Result<&FileDef> {
        self.bytes_loaded += bytes.len();
        let proto = FileDescriptorProto::decode(bytes)?;
        self.add_file(&proto)
    }

    /// Adds a decoded file, optionally using precomputed layouts.
    ///
    /// Fails with [`Error::DuplicateFile`] without touching the pool if a
    /// file of the same name is already loaded. Any other failure rolls
    /// back every symbol the file had bound.
    pub fn add_file_with_layout(
        &mut self,
        proto: &FileDescriptorProto,
        layout: Option<&FileLayout>,
    ) -> Result<&FileDef> {
        let name = proto.name();
        if self.files.contains_key(name) {
            return Err(Error::duplicate_file(name));
        }

        let mut builder = FileBuilder::new(
            &self.arena,
            &mut self.symbols,
            &self.files,
            &self.registry,
            layout,
            name,
        );
        let file = builder.file_id();
        let built = builder.build(proto);
        let work = builder.into_work();

        if let Err(err) = built.and_then(|_| self.reserve_commit(&work)) {
            let removed = self.remove_file_symbols(file, &work);
            debug!(file = name, removed, error = %err, "rolled back file");
            return Err(err);
        }

        self.commit(name, file, work);
        debug!(file = name, symbols = self.symbols.len(), "added file");
        Ok(self.arena.file(file))
    }

    /// Reserves every table a commit grows, so that
    /// [`commit`](Self::commit) itself cannot fail halfway
    fn reserve_commit(&mut self, work: &WorkArena) -> Result<()> {
        let new_extensions = work
            .staged_fields()
            .iter()
            .filter(|field| field.extension.is_some())
            .count();
        self.arena.reserve_for(work)?;
        let reserved = self.files.try_reserve(1).is_ok()
            && self.extensions.try_reserve(new_extensions).is_ok()
            && self.registry.try_reserve(new_extensions);
        if reserved {
            Ok(())
        } else {
            Err(Error::OutOfMemory)
        }
    }

    /// Publishes a fully built file: its definitions join the permanent
    /// arena, its name the file table, its extensions the registry and
    /// the extension index.
    fn commit(&mut self, name: &str, file: FileId, work: WorkArena) {
        let staged: Vec<(ExtensionId, FieldId, ExtensionLayout)> = work
            .staged_fields()
            .iter()
            .filter_map(|field| {
                let extension = field.extension?;
                let layout = *work.extension_layout(extension)?;
                Some((extension, field.id, layout))
            })
            .collect();

        self.arena.fuse(work);
        self.files.insert(name.into(), file);
        for (extension, field, layout) in staged {
            let added = self.registry.add(layout.extendee, layout.field.number, extension);
            assert!(added, "extension number was free when the file was built");
            self.extensions.insert(extension, field);
        }
    }

    /// Removes every symbol owned by `file`, a file under construction
    /// in `work`. Returns how many symbols were removed.
    ///
    /// This scans the whole symbol table.
    fn remove_file_symbols(&mut self, file: FileId, work: &WorkArena) -> usize {
        let view = ArenaView::new(&self.arena, work);
        self.symbols.retain(|_, def| view.owning_file(def) != file)
    }

    /// Total size of the serialized descriptors decoded by this pool
    pub fn bytes_loaded(&self) -> usize {
        self.bytes_loaded
    }

    pub(crate) fn record_bytes_loaded(&mut self, bytes: usize) {
        self.bytes_loaded += bytes;
    }

    /// The symbol table
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The extension registry
    pub fn extension_registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// All loaded files, in load order
    pub fn files(&self) -> impl Iterator<Item = &FileDef> + '_ {
        self.arena.files().iter()
    }

    /// Number of loaded files
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Returns the file for `id`
    pub fn file(&self, id: FileId) -> &FileDef {
        self.arena.file(id)
    }

    /// Returns the message for `id`
    pub fn message(&self, id: MessageId) -> &MessageDef {
        self.arena.message(id)
    }

    /// Returns the enum for `id`
    pub fn enum_def(&self, id: EnumId) -> &EnumDef {
        self.arena.enum_def(id)
    }

    /// Returns the enum value for `id`
    pub fn enum_value(&self, id: EnumValueId) -> &EnumValueDef {
        self.arena.enum_value(id)
    }

    /// Returns the service for `id`
    pub fn service(&self, id: ServiceId) -> &ServiceDef {
        self.arena.service(id)
    }

    /// Returns the field or extension for `id`
    pub fn field(&self, id: FieldId) -> &FieldDef {
        self.arena.field(id)
    }

    /// Returns the compiled layout for `id`
    pub fn layout(&self, id: LayoutId) -> &MessageLayout {
        self.arena.layout(id)
    }

    /// Returns the compiled layout of an extension
    pub fn extension_layout(&self, id: ExtensionId) -> &ExtensionLayout {
        self.arena.extension_layout(id)
    }

    /// Finds a message by qualified name
    pub fn find_message_by_name(&self, name: &str) -> Option<&MessageDef> {
        self.symbols
            .lookup(name, DefKind::Message)
            .and_then(Def::as_message)
            .map(|id| self.message(id))
    }

    /// Finds an enum by qualified name
    pub fn find_enum_by_name(&self, name: &str) -> Option<&EnumDef> {
        self.symbols
            .lookup(name, DefKind::Enum)
            .and_then(Def::as_enum)
            .map(|id| self.enum_def(id))
    }

    /// Finds an enum value by qualified name (`pkg.RED`, not `pkg.Color.RED`)
    pub fn find_enum_value_by_name(&self, name: &str) -> Option<&EnumValueDef> {
        self.symbols
            .lookup(name, DefKind::EnumValue)
            .and_then(Def::as_enum_value)
            .map(|id| self.enum_value(id))
    }

    /// Finds a service by qualified name
    pub fn find_service_by_name(&self, name: &str) -> Option<&ServiceDef> {
        self.symbols
            .lookup(name, DefKind::Service)
            .and_then(Def::as_service)
            .map(|id| self.service(id))
    }

    /// Finds a loaded file by name
    pub fn find_file_by_name(&self, name: &str) -> Option<&FileDef> {
        self.files.get(name).map(|&id| self.file(id))
    }

    /// Finds an extension by qualified name.
    ///
    /// A name that resolves to a message-set item (a message whose only
    /// nested extension extends a message-set container with the message
    /// itself) yields that nested extension. Code written against the
    /// legacy message-set convention names extensions by their message
    /// type, so this is intended.
    pub fn find_extension_by_name(&self, name: &str) -> Option<&FieldDef> {
        match self.symbols.lookup_any(name)? {
            Def::Extension(id) => Some(self.field(id)),
            Def::Message(id) => {
                let message = self.message(id);
                if self.is_message_set_item(message) {
                    message.nested_extensions.first().map(|&id| self.field(id))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Finds the extension with field number `number` on `message`
    pub fn find_extension_by_number(&self, message: &MessageDef, number: i32) -> Option<&FieldDef> {
        let extension = self.registry.get(message.layout, number)?;
        Some(self.find_extension_by_id(extension))
    }

    /// Maps an extension identity to its definition
    ///
    /// # Panics
    ///
    /// Panics if `extension` is not indexed; every identity handed out by
    /// the registry is.
    pub fn find_extension_by_id(&self, extension: ExtensionId) -> &FieldDef {
        let field = self
            .extensions
            .get(&extension)
            .unwrap_or_else(|| panic!("{extension:?} is registered but not indexed"));
        self.field(*field)
    }

    /// Finds the file declaring `name`.
    ///
    /// Besides indexed symbols this also accepts the qualified name of a
    /// plain field or oneof (`pkg.Foo.bar`), which is found through its
    /// message.
    pub fn find_file_containing_symbol(&self, name: &str) -> Option<&FileDef> {
        if let Some(def) = self.symbols.lookup_any(name) {
            let file = match def {
                Def::Message(id) => self.message(id).file,
                Def::Enum(id) => self.enum_def(id).file,
                Def::EnumValue(id) => self.enum_def(self.enum_value(id).parent).file,
                Def::Service(id) => self.service(id).file,
                Def::Extension(id) => self.field(id).file,
            };
            return Some(self.file(file));
        }

        let (parent, member) = name.rsplit_once('.')?;
        let parent = self.find_message_by_name(parent)?;
        parent
            .find_member_by_name(member)
            .map(|_| self.file(parent.file))
    }

    /// Returns true if `message` is a legacy message-set item
    pub fn is_message_set_item(&self, message: &MessageDef) -> bool {
        let [extension] = message.nested_extensions.as_slice() else {
            return false;
        };
        let field = self.field(*extension);
        field.label == Label::Optional
            && field.field_type == FieldType::Message
            && field.type_ref == Some(TypeRef::Message(message.id))
            && field
                .containing_type
                .is_some_and(|container| self.message(container).message_set_wire_format)
    }

    /// All extensions of `message`, ordered by id.
    ///
    /// Scans every indexed extension.
    pub fn all_extensions(&self, message: &MessageDef) -> Vec<&FieldDef> {
        let mut found = Vec::with_capacity(self.extension_count(message));
        found.extend(
            self.extensions
                .values()
                .map(|&id| self.field(id))
                .filter(|field| field.containing_type == Some(message.id)),
        );
        found.sort_by_key(|field| field.id);
        found
    }

    /// Number of extensions of `message`.
    ///
    /// Scans every indexed extension.
    pub fn extension_count(&self, message: &MessageDef) -> usize {
        self.extensions
            .values()
            .filter(|&&id| self.field(id).containing_type == Some(message.id))
            .count()
    }

    /// Returns the member of a message named `pkg.Msg.member`
    pub fn find_member(&self, name: &str) -> Option<Member> {
        let (parent, member) = name.rsplit_once('.')?;
        self.find_message_by_name(parent)?.find_member_by_name(member)
    }
}
