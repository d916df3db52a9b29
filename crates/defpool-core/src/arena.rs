//! Typed definition storage.
//!
//! [`DefArena`] owns every definition of a pool, one vector per kind. A
//! build transaction writes into a [`WorkArena`] that continues the id
//! sequence of the permanent arena from an [`ArenaMark`]. Committing a
//! file fuses the work arena into the permanent one; dropping it instead
//! discards everything the build allocated.

use crate::def::{Def, EnumDef, EnumValueDef, FieldDef, FileDef, MessageDef, ServiceDef};
use crate::error::{Error, Result};
use crate::ids::{
    EnumId, EnumValueId, ExtensionId, FieldId, FileId, LayoutId, MessageId, ServiceId,
};
use crate::layout::{ExtensionLayout, MessageLayout};

/// Lengths of every vector in an arena at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ArenaMark {
    files: usize,
    messages: usize,
    enums: usize,
    enum_values: usize,
    services: usize,
    fields: usize,
    layouts: usize,
    extension_layouts: usize,
}

/// Owner of all definitions in a pool
#[derive(Debug, Default)]
pub(crate) struct DefArena {
    files: Vec<FileDef>,
    messages: Vec<MessageDef>,
    enums: Vec<EnumDef>,
    enum_values: Vec<EnumValueDef>,
    services: Vec<ServiceDef>,
    fields: Vec<FieldDef>,
    layouts: Vec<MessageLayout>,
    extension_layouts: Vec<ExtensionLayout>,
}

macro_rules! arena_getters {
    ($($vec:ident: $get:ident($id:ty) -> $def:ty;)*) => {
        $(
            /// Returns the definition for `id`
            ///
            /// # Panics
            ///
            /// Panics if `id` was not handed out by this arena.
            pub(crate) fn $get(&self, id: $id) -> &$def {
                &self.$vec[id.index()]
            }
        )*
    };
}

impl DefArena {
    /// Creates an empty arena
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records the current length of every vector
    pub(crate) fn mark(&self) -> ArenaMark {
        ArenaMark {
            files: self.files.len(),
            messages: self.messages.len(),
            enums: self.enums.len(),
            enum_values: self.enum_values.len(),
            services: self.services.len(),
            fields: self.fields.len(),
            layouts: self.layouts.len(),
            extension_layouts: self.extension_layouts.len(),
        }
    }

    arena_getters! {
        files: file(FileId) -> FileDef;
        messages: message(MessageId) -> MessageDef;
        enums: enum_def(EnumId) -> EnumDef;
        enum_values: enum_value(EnumValueId) -> EnumValueDef;
        services: service(ServiceId) -> ServiceDef;
        fields: field(FieldId) -> FieldDef;
        layouts: layout(LayoutId) -> MessageLayout;
        extension_layouts: extension_layout(ExtensionId) -> ExtensionLayout;
    }

    /// All files in load order
    pub(crate) fn files(&self) -> &[FileDef] {
        &self.files
    }

    /// Reserves room for everything staged in `work`, so that
    /// [`fuse`](Self::fuse) cannot fail
    pub(crate) fn reserve_for(&mut self, work: &WorkArena) -> Result<()> {
        let staged = &work.arena;
        self.files.try_reserve(staged.files.len()).map_err(|_| Error::OutOfMemory)?;
        self.messages.try_reserve(staged.messages.len()).map_err(|_| Error::OutOfMemory)?;
        self.enums.try_reserve(staged.enums.len()).map_err(|_| Error::OutOfMemory)?;
        self.enum_values
            .try_reserve(staged.enum_values.len())
            .map_err(|_| Error::OutOfMemory)?;
        self.services.try_reserve(staged.services.len()).map_err(|_| Error::OutOfMemory)?;
        self.fields.try_reserve(staged.fields.len()).map_err(|_| Error::OutOfMemory)?;
        self.layouts.try_reserve(staged.layouts.len()).map_err(|_| Error::OutOfMemory)?;
        self.extension_layouts
            .try_reserve(staged.extension_layouts.len())
            .map_err(|_| Error::OutOfMemory)
    }

    /// Appends a work arena, giving its definitions the arena's lifetime
    ///
    /// # Panics
    ///
    /// Panics if `work` was not opened at this arena's current mark.
    pub(crate) fn fuse(&mut self, work: WorkArena) {
        assert_eq!(work.base, self.mark(), "work arena does not continue this arena");
        let staged = work.arena;
        self.files.extend(staged.files);
        self.messages.extend(staged.messages);
        self.enums.extend(staged.enums);
        self.enum_values.extend(staged.enum_values);
        self.services.extend(staged.services);
        self.fields.extend(staged.fields);
        self.layouts.extend(staged.layouts);
        self.extension_layouts.extend(staged.extension_layouts);
    }
}

/// Destination of one file's definitions while it is being built
#[derive(Debug)]
pub(crate) struct WorkArena {
    base: ArenaMark,
    arena: DefArena,
}

macro_rules! work_alloc {
    ($($vec:ident: $alloc:ident($id:ident) -> $def:ty;)*) => {
        $(
            pub(crate) fn $alloc(&mut self, make: impl FnOnce($id) -> $def) -> Result<$id> {
                let vec = &mut self.arena.$vec;
                vec.try_reserve(1).map_err(|_| Error::OutOfMemory)?;
                let id = $id::from_index(self.base.$vec + vec.len());
                vec.push(make(id));
                Ok(id)
            }
        )*
    };
}

macro_rules! work_get {
    ($($vec:ident: $get:ident($id:ty) -> $def:ty;)*) => {
        $(
            pub(crate) fn $get(&self, id: $id) -> Option<&$def> {
                id.index()
                    .checked_sub(self.base.$vec)
                    .and_then(|index| self.arena.$vec.get(index))
            }
        )*
    };
}

macro_rules! work_get_mut {
    ($($vec:ident: $get_mut:ident($id:ty) -> $def:ty;)*) => {
        $(
            pub(crate) fn $get_mut(&mut self, id: $id) -> Option<&mut $def> {
                id.index()
                    .checked_sub(self.base.$vec)
                    .and_then(|index| self.arena.$vec.get_mut(index))
            }
        )*
    };
}

impl WorkArena {
    /// Opens a work arena continuing from `base`
    pub(crate) fn new(base: ArenaMark) -> Self {
        Self {
            base,
            arena: DefArena::default(),
        }
    }

    /// Id the file under construction will receive
    pub(crate) fn next_file_id(&self) -> FileId {
        FileId::from_index(self.base.files + self.arena.files.len())
    }

    work_alloc! {
        files: alloc_file(FileId) -> FileDef;
        messages: alloc_message(MessageId) -> MessageDef;
        enums: alloc_enum(EnumId) -> EnumDef;
        enum_values: alloc_enum_value(EnumValueId) -> EnumValueDef;
        services: alloc_service(ServiceId) -> ServiceDef;
        fields: alloc_field(FieldId) -> FieldDef;
        layouts: alloc_layout(LayoutId) -> MessageLayout;
        extension_layouts: alloc_extension_layout(ExtensionId) -> ExtensionLayout;
    }

    work_get! {
        messages: message(MessageId) -> MessageDef;
        enums: enum_def(EnumId) -> EnumDef;
        enum_values: enum_value(EnumValueId) -> EnumValueDef;
        services: service(ServiceId) -> ServiceDef;
        fields: field(FieldId) -> FieldDef;
        extension_layouts: extension_layout(ExtensionId) -> ExtensionLayout;
    }

    work_get_mut! {
        messages: message_mut(MessageId) -> MessageDef;
        enums: enum_def_mut(EnumId) -> EnumDef;
        services: service_mut(ServiceId) -> ServiceDef;
        fields: field_mut(FieldId) -> FieldDef;
        layouts: layout_mut(LayoutId) -> MessageLayout;
    }

    /// Staged fields, for publishing extensions on commit
    pub(crate) fn staged_fields(&self) -> &[FieldDef] {
        &self.arena.fields
    }
}

/// Read access spanning the permanent arena and an open work arena
#[derive(Clone, Copy)]
pub(crate) struct ArenaView<'a> {
    permanent: &'a DefArena,
    work: &'a WorkArena,
}

macro_rules! view_getters {
    ($($get:ident($id:ty) -> $def:ty;)*) => {
        $(
            pub(crate) fn $get(&self, id: $id) -> &'a $def {
                match self.work.$get(id) {
                    Some(def) => def,
                    None => self.permanent.$get(id),
                }
            }
        )*
    };
}

impl<'a> ArenaView<'a> {
    pub(crate) fn new(permanent: &'a DefArena, work: &'a WorkArena) -> Self {
        Self { permanent, work }
    }

    view_getters! {
        message(MessageId) -> MessageDef;
        enum_def(EnumId) -> EnumDef;
        enum_value(EnumValueId) -> EnumValueDef;
        service(ServiceId) -> ServiceDef;
        field(FieldId) -> FieldDef;
    }

    /// File a symbol-table entry belongs to
    pub(crate) fn owning_file(&self, def: Def) -> FileId {
        match def {
            Def::Message(id) => self.message(id).file,
            Def::Enum(id) => self.enum_def(id).file,
            Def::EnumValue(id) => self.enum_def(self.enum_value(id).parent).file,
            Def::Service(id) => self.service(id).file,
            Def::Extension(id) => self.field(id).file,
        }
    }
}
