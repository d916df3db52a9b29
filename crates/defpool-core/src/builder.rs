//! Turns one `FileDescriptorProto` into definitions.
//!
//! A build runs in three phases over the descriptor tree:
//!
//! 1. declare: allocate every message, enum, enum value, service and
//!    field in the work arena and bind each named definition in the
//!    symbol table
//! 2. resolve: look up field types, extendees and method types now that
//!    every symbol of the file is visible
//! 3. lay out: attach a compiled layout to every message and extension
//!
//! Any failure returns early with `?`. The symbols bound so far stay in
//! the table; removing them is the caller's job (see
//! [`DefPool::add_file`](crate::DefPool::add_file)).

use crate::arena::{ArenaView, DefArena, WorkArena};
use crate::def::{
    Def, EnumDef, EnumValueDef, FieldDef, FieldType, FileDef, Label, Member, MessageDef,
    MethodDef, OneofDef, ServiceDef, Syntax, TypeRef,
};
use crate::error::{Error, Result};
use crate::extreg::ExtensionRegistry;
use crate::ids::{EnumId, FieldId, FileId, LayoutId, MessageId, ServiceId};
use crate::layout::{is_packable, ExtensionLayout, FieldLayout, FileLayout, MessageLayout};
use crate::symtab::SymbolTable;
use crate::MAX_FIELD_NUMBER;
use prost_types::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    ServiceDescriptorProto,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

/// Throwaway state of one build, dropped whatever the outcome
#[derive(Default)]
struct Scratch<'d> {
    fields: Vec<PendingField<'d>>,
    services: Vec<PendingService<'d>>,
    messages: Vec<MessageId>,
    extensions: Vec<FieldId>,
}

struct PendingField<'d> {
    id: FieldId,
    scope: String,
    proto: &'d FieldDescriptorProto,
}

struct PendingService<'d> {
    id: ServiceId,
    scope: String,
    proto: &'d ServiceDescriptorProto,
}

/// Builds the definitions of a single file into a work arena
pub(crate) struct FileBuilder<'p> {
    permanent: &'p DefArena,
    symbols: &'p mut SymbolTable,
    files: &'p FxHashMap<Box<str>, FileId>,
    registry: &'p ExtensionRegistry,
    layout: Option<&'p FileLayout>,
    work: WorkArena,
    file: FileId,
    file_name: String,
    syntax: Syntax,
}

impl<'p> FileBuilder<'p> {
    pub(crate) fn new(
        permanent: &'p DefArena,
        symbols: &'p mut SymbolTable,
        files: &'p FxHashMap<Box<str>, FileId>,
        registry: &'p ExtensionRegistry,
        layout: Option<&'p FileLayout>,
        file_name: &str,
    ) -> Self {
        let work = WorkArena::new(permanent.mark());
        let file = work.next_file_id();
        Self {
            permanent,
            symbols,
            files,
            registry,
            layout,
            work,
            file,
            file_name: file_name.to_string(),
            syntax: Syntax::Proto2,
        }
    }

    /// Id the file will have once committed
    pub(crate) fn file_id(&self) -> FileId {
        self.file
    }

    /// Releases the work arena, ending the builder's borrow of the pool
    pub(crate) fn into_work(self) -> WorkArena {
        self.work
    }

    fn err(&self, details: impl Into<String>) -> Error {
        Error::invalid_descriptor(&self.file_name, details)
    }

    pub(crate) fn build(&mut self, proto: &FileDescriptorProto) -> Result<FileId> {
        if self.file_name.is_empty() {
            return Err(self.err("missing file name"));
        }

        let package = proto.package();
        if !package.is_empty() {
            for part in package.split('.') {
                self.check_identifier(part, "package")?;
            }
        }

        self.syntax = Syntax::try_from(proto.syntax())
            .map_err(|_| self.err(format!("unsupported syntax '{}'", proto.syntax())))?;

        let dependencies = proto
            .dependency
            .iter()
            .map(|dep| {
                self.files.get(dep.as_str()).copied().ok_or_else(|| {
                    self.err(format!("depends on file '{dep}', but it has not been loaded"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let public_dependencies =
            self.select_dependencies(&dependencies, &proto.public_dependency, "public")?;
        let weak_dependencies =
            self.select_dependencies(&dependencies, &proto.weak_dependency, "weak")?;

        let mut scratch = Scratch::default();

        let messages = proto
            .message_type
            .iter()
            .map(|message| self.declare_message(&mut scratch, message, package, None))
            .collect::<Result<Vec<_>>>()?;
        let enums = proto
            .enum_type
            .iter()
            .map(|enum_type| self.declare_enum(enum_type, package, None))
            .collect::<Result<Vec<_>>>()?;
        let extensions = proto
            .extension
            .iter()
            .map(|extension| self.declare_extension(&mut scratch, extension, package, None))
            .collect::<Result<Vec<_>>>()?;
        let services = proto
            .service
            .iter()
            .map(|service| self.declare_service(&mut scratch, service, package))
            .collect::<Result<Vec<_>>>()?;

        self.resolve_fields(&scratch)?;
        self.resolve_services(&scratch)?;
        self.lay_out(&scratch)?;

        let name = self.file_name.clone();
        let syntax = self.syntax;
        let id = self.work.alloc_file(|id| FileDef {
            id,
            name,
            package: package.to_string(),
            syntax,
            dependencies,
            public_dependencies,
            weak_dependencies,
            messages,
            enums,
            services,
            extensions,
        })?;
        if id != self.file {
            return Err(Error::internal("file id changed during build"));
        }
        Ok(id)
    }

    fn select_dependencies(
        &self,
        dependencies: &[FileId],
        indexes: &[i32],
        what: &str,
    ) -> Result<Vec<FileId>> {
        indexes
            .iter()
            .map(|&index| {
                usize::try_from(index)
                    .ok()
                    .and_then(|index| dependencies.get(index).copied())
                    .ok_or_else(|| {
                        self.err(format!("{what} dependency index {index} out of range"))
                    })
            })
            .collect()
    }

    fn check_identifier(&self, name: &str, what: &str) -> Result<()> {
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(self.err(format!("invalid {what} name '{name}'")))
        }
    }

    fn register(&mut self, name: &str, def: Def) -> Result<()> {
        if self.symbols.contains(name) {
            return Err(self.err(format!("duplicate symbol '{name}'")));
        }
        if !self.symbols.insert(name, def) {
            return Err(Error::OutOfMemory);
        }
        trace!(symbol = name, kind = def.kind().as_str(), "registered symbol");
        Ok(())
    }

    fn declare_message<'d>(
        &mut self,
        scratch: &mut Scratch<'d>,
        proto: &'d DescriptorProto,
        scope: &str,
        parent: Option<MessageId>,
    ) -> Result<MessageId> {
        let name = proto.name();
        self.check_identifier(name, "message")?;
        let full_name = join(scope, name);

        let options = proto.options.as_ref();
        let map_entry = options.and_then(|o| o.map_entry).unwrap_or(false);
        let message_set_wire_format = options
            .and_then(|o| o.message_set_wire_format)
            .unwrap_or(false);

        // Message sets may declare `extensions 4 to max`, stored as i32::MAX.
        let range_limit = if message_set_wire_format {
            i32::MAX
        } else {
            MAX_FIELD_NUMBER + 1
        };
        let extension_ranges = proto
            .extension_range
            .iter()
            .map(|range| {
                let (start, end) = (range.start(), range.end());
                if start < 1 || end <= start || end > range_limit {
                    Err(self.err(format!(
                        "invalid extension range {start} to {end} in message '{full_name}'"
                    )))
                } else {
                    Ok(start..end)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let layout = self.work.alloc_layout(|_| MessageLayout::default())?;
        let file = self.file;
        let id = self.work.alloc_message(|id| MessageDef {
            id,
            name: name.to_string(),
            full_name: full_name.clone(),
            file,
            containing_type: parent,
            fields: Vec::new(),
            oneofs: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            nested_extensions: Vec::new(),
            extension_ranges,
            map_entry,
            message_set_wire_format,
            layout,
            members: FxHashMap::default(),
        })?;
        self.register(&full_name, Def::Message(id))?;
        scratch.messages.push(id);

        let mut members = FxHashMap::default();
        let mut oneofs = Vec::with_capacity(proto.oneof_decl.len());
        for (index, oneof) in proto.oneof_decl.iter().enumerate() {
            let oneof_name = oneof.name();
            self.check_identifier(oneof_name, "oneof")?;
            if members
                .insert(oneof_name.to_string(), Member::Oneof(index))
                .is_some()
            {
                return Err(self.err(format!(
                    "duplicate oneof name '{oneof_name}' in message '{full_name}'"
                )));
            }
            oneofs.push(OneofDef {
                name: oneof_name.to_string(),
                full_name: join(&full_name, oneof_name),
                fields: Vec::new(),
                synthetic: false,
            });
        }

        let mut numbers = FxHashSet::default();
        let mut fields = Vec::with_capacity(proto.field.len());
        for field in &proto.field {
            let field_id = self.declare_field(scratch, field, &full_name, id, oneofs.len())?;
            if members
                .insert(field.name().to_string(), Member::Field(field_id))
                .is_some()
            {
                return Err(self.err(format!(
                    "duplicate field name '{}' in message '{full_name}'",
                    field.name()
                )));
            }
            if !numbers.insert(field.number()) {
                return Err(self.err(format!(
                    "duplicate field number {} in message '{full_name}'",
                    field.number()
                )));
            }
            if let Some(oneof) = field.oneof_index.and_then(|i| oneofs.get_mut(i as usize)) {
                oneof.fields.push(field_id);
                oneof.synthetic |= field.proto3_optional();
            }
            fields.push(field_id);
        }
        if let Some(empty) = oneofs.iter().find(|oneof| oneof.fields.is_empty()) {
            return Err(self.err(format!(
                "oneof '{}' must have at least one field",
                empty.full_name
            )));
        }

        let nested_messages = proto
            .nested_type
            .iter()
            .map(|nested| self.declare_message(scratch, nested, &full_name, Some(id)))
            .collect::<Result<Vec<_>>>()?;
        let nested_enums = proto
            .enum_type
            .iter()
            .map(|enum_type| self.declare_enum(enum_type, &full_name, Some(id)))
            .collect::<Result<Vec<_>>>()?;
        let nested_extensions = proto
            .extension
            .iter()
            .map(|extension| self.declare_extension(scratch, extension, &full_name, Some(id)))
            .collect::<Result<Vec<_>>>()?;

        let message = self
            .work
            .message_mut(id)
            .ok_or_else(|| Error::internal("message missing from work arena"))?;
        message.fields = fields;
        message.oneofs = oneofs;
        message.nested_messages = nested_messages;
        message.nested_enums = nested_enums;
        message.nested_extensions = nested_extensions;
        message.members = members;
        Ok(id)
    }

    fn declare_field<'d>(
        &mut self,
        scratch: &mut Scratch<'d>,
        proto: &'d FieldDescriptorProto,
        scope: &str,
        parent: MessageId,
        oneof_count: usize,
    ) -> Result<FieldId> {
        let name = proto.name();
        self.check_identifier(name, "field")?;
        let full_name = join(scope, name);
        self.check_number(proto.number(), &full_name)?;

        if let Some(index) = proto.oneof_index {
            if index < 0 || index as usize >= oneof_count {
                return Err(self.err(format!(
                    "oneof index {index} out of range for field '{full_name}'"
                )));
            }
        }
        if !proto.extendee().is_empty() {
            return Err(self.err(format!(
                "field '{full_name}' names an extendee but is not an extension"
            )));
        }

        self.alloc_field(scratch, proto, scope, full_name, Some(parent), None)
    }

    fn declare_extension<'d>(
        &mut self,
        scratch: &mut Scratch<'d>,
        proto: &'d FieldDescriptorProto,
        scope: &str,
        extension_scope: Option<MessageId>,
    ) -> Result<FieldId> {
        let name = proto.name();
        self.check_identifier(name, "extension")?;
        let full_name = join(scope, name);
        self.check_number(proto.number(), &full_name)?;

        if proto.extendee().is_empty() {
            return Err(self.err(format!("extension '{full_name}' has no extendee")));
        }
        if proto.oneof_index.is_some() {
            return Err(self.err(format!("extension '{full_name}' cannot be part of a oneof")));
        }

        let id = self.alloc_field(scratch, proto, scope, full_name.clone(), None, extension_scope)?;
        self.register(&full_name, Def::Extension(id))?;
        scratch.extensions.push(id);
        Ok(id)
    }

    fn check_number(&self, number: i32, full_name: &str) -> Result<()> {
        if (1..=MAX_FIELD_NUMBER).contains(&number) {
            Ok(())
        } else {
            Err(self.err(format!("invalid field number {number} for field '{full_name}'")))
        }
    }

    fn alloc_field<'d>(
        &mut self,
        scratch: &mut Scratch<'d>,
        proto: &'d FieldDescriptorProto,
        scope: &str,
        full_name: String,
        containing_type: Option<MessageId>,
        extension_scope: Option<MessageId>,
    ) -> Result<FieldId> {
        let label = match proto.label {
            Some(raw) => Label::try_from(raw)
                .map_err(|_| self.err(format!("invalid label {raw} for field '{full_name}'")))?,
            None => Label::Optional,
        };
        let declared = match proto.r#type {
            Some(raw) => Some(
                FieldType::try_from(raw)
                    .map_err(|_| self.err(format!("invalid type {raw} for field '{full_name}'")))?,
            ),
            None => None,
        };
        if declared.is_none() && proto.type_name().is_empty() {
            return Err(self.err(format!("field '{full_name}' has no type")));
        }
        if self.syntax == Syntax::Proto3 && proto.default_value.is_some() {
            return Err(self.err(format!(
                "field '{full_name}' has an explicit default, which proto3 does not allow"
            )));
        }

        let name = proto.name().to_string();
        let json_name = proto
            .json_name
            .clone()
            .unwrap_or_else(|| to_lower_camel_case(&name));
        let file = self.file;
        let id = self.work.alloc_field(|id| FieldDef {
            id,
            name,
            full_name,
            file,
            number: proto.number(),
            label,
            // Refined once type names are resolved.
            field_type: declared.unwrap_or(FieldType::Message),
            type_ref: None,
            json_name,
            default_value: proto.default_value.clone(),
            containing_type,
            extension_scope,
            oneof: proto.oneof_index.map(|index| index as usize),
            packed: false,
            proto3_optional: proto.proto3_optional(),
            extension: None,
        })?;

        scratch.fields.push(PendingField {
            id,
            scope: scope.to_string(),
            proto,
        });
        Ok(id)
    }

    fn declare_enum(
        &mut self,
        proto: &EnumDescriptorProto,
        scope: &str,
        parent: Option<MessageId>,
    ) -> Result<EnumId> {
        let name = proto.name();
        self.check_identifier(name, "enum")?;
        let full_name = join(scope, name);

        let Some(first) = proto.value.first() else {
            return Err(self.err(format!("enum '{full_name}' must contain at least one value")));
        };
        if self.syntax == Syntax::Proto3 && first.number() != 0 {
            return Err(self.err(format!(
                "for proto3, the first value of enum '{full_name}' must be zero"
            )));
        }
        let allow_alias = proto
            .options
            .as_ref()
            .and_then(|o| o.allow_alias)
            .unwrap_or(false);

        let file = self.file;
        let closed = self.syntax == Syntax::Proto2;
        let id = self.work.alloc_enum(|id| EnumDef {
            id,
            name: name.to_string(),
            full_name: full_name.clone(),
            file,
            containing_type: parent,
            values: Vec::new(),
            closed,
        })?;
        self.register(&full_name, Def::Enum(id))?;

        let mut numbers = FxHashSet::default();
        let mut values = Vec::with_capacity(proto.value.len());
        for value in &proto.value {
            let value_name = value.name();
            self.check_identifier(value_name, "enum value")?;
            if !numbers.insert(value.number()) && !allow_alias {
                return Err(self.err(format!(
                    "duplicate number {} in enum '{full_name}' without allow_alias",
                    value.number()
                )));
            }
            // Values live beside their enum, not inside it.
            let value_full_name = join(scope, value_name);
            let value_id = self.work.alloc_enum_value(|value_id| EnumValueDef {
                id: value_id,
                name: value_name.to_string(),
                full_name: value_full_name.clone(),
                number: value.number(),
                parent: id,
            })?;
            self.register(&value_full_name, Def::EnumValue(value_id))?;
            values.push(value_id);
        }

        self.work
            .enum_def_mut(id)
            .ok_or_else(|| Error::internal("enum missing from work arena"))?
            .values = values;
        Ok(id)
    }

    fn declare_service<'d>(
        &mut self,
        scratch: &mut Scratch<'d>,
        proto: &'d ServiceDescriptorProto,
        scope: &str,
    ) -> Result<ServiceId> {
        let name = proto.name();
        self.check_identifier(name, "service")?;
        let full_name = join(scope, name);

        let file = self.file;
        let id = self.work.alloc_service(|id| ServiceDef {
            id,
            name: name.to_string(),
            full_name: full_name.clone(),
            file,
            methods: Vec::new(),
        })?;
        self.register(&full_name, Def::Service(id))?;
        scratch.services.push(PendingService {
            id,
            scope: scope.to_string(),
            proto,
        });
        Ok(id)
    }

    /// Resolves `name` as seen from `scope`, searching outward.
    ///
    /// `.a.B` is absolute. `a.B` from scope `x.y` tries `x.y.a.B`, `x.a.B`,
    /// then `a.B`.
    fn resolve_name(&self, scope: &str, name: &str) -> Option<Def> {
        if let Some(absolute) = name.strip_prefix('.') {
            return self.symbols.lookup_any(absolute);
        }
        let mut scope = scope;
        loop {
            if let Some(def) = self.symbols.lookup_any(&join(scope, name)) {
                return Some(def);
            }
            if scope.is_empty() {
                return None;
            }
            scope = scope.rfind('.').map_or("", |dot| &scope[..dot]);
        }
    }

    fn resolve_message(&self, scope: &str, name: &str, what: &str) -> Result<MessageId> {
        match self.resolve_name(scope, name) {
            Some(Def::Message(id)) => Ok(id),
            Some(other) => Err(self.err(format!(
                "{what} '{name}' is a {}, not a message",
                other.kind().as_str()
            ))),
            None => Err(self.err(format!("couldn't resolve name '{name}'"))),
        }
    }

    fn resolve_fields(&mut self, scratch: &Scratch<'_>) -> Result<()> {
        for pending in &scratch.fields {
            let proto = pending.proto;
            let view = ArenaView::new(self.permanent, &self.work);
            let full_name = &view.field(pending.id).full_name;

            let extendee = if proto.extendee().is_empty() {
                None
            } else {
                let extendee = self.resolve_message(&pending.scope, proto.extendee(), "extendee")?;
                let message = view.message(extendee);
                if !message.is_extension_number(proto.number()) {
                    return Err(self.err(format!(
                        "field number {} in extension '{full_name}' has no extension range \
                         in message '{}'",
                        proto.number(),
                        message.full_name
                    )));
                }
                Some(extendee)
            };

            let (field_type, type_ref) = self.resolve_field_type(pending, full_name)?;

            if let (Some(TypeRef::Enum(enum_id)), Some(default)) =
                (type_ref, proto.default_value.as_deref())
            {
                let enum_def = view.enum_def(enum_id);
                let known = enum_def
                    .values
                    .iter()
                    .any(|&value| view.enum_value(value).name == default);
                if !known {
                    return Err(self.err(format!(
                        "default value '{default}' of field '{full_name}' is not a value \
                         of enum '{}'",
                        enum_def.full_name
                    )));
                }
            }

            let label = proto.label();
            let packed = label == Label::Repeated
                && is_packable(field_type)
                && proto
                    .options
                    .as_ref()
                    .and_then(|o| o.packed)
                    .unwrap_or(self.syntax == Syntax::Proto3);

            let field = self
                .work
                .field_mut(pending.id)
                .ok_or_else(|| Error::internal("field missing from work arena"))?;
            field.field_type = field_type;
            field.type_ref = type_ref;
            field.packed = packed;
            if extendee.is_some() {
                field.containing_type = extendee;
            }
        }
        Ok(())
    }

    fn resolve_field_type(
        &self,
        pending: &PendingField<'_>,
        full_name: &str,
    ) -> Result<(FieldType, Option<TypeRef>)> {
        let proto = pending.proto;
        let declared = proto.r#type.and_then(|raw| FieldType::try_from(raw).ok());
        let type_name = proto.type_name();

        if type_name.is_empty() {
            return match declared {
                Some(FieldType::Message | FieldType::Group | FieldType::Enum) => Err(
                    self.err(format!("field '{full_name}' is missing a type name")),
                ),
                Some(scalar) => Ok((scalar, None)),
                None => Err(self.err(format!("field '{full_name}' has no type"))),
            };
        }

        let def = self
            .resolve_name(&pending.scope, type_name)
            .ok_or_else(|| self.err(format!("couldn't resolve name '{type_name}'")))?;
        match (declared, def) {
            (None | Some(FieldType::Message), Def::Message(id)) => {
                Ok((FieldType::Message, Some(TypeRef::Message(id))))
            }
            (Some(FieldType::Group), Def::Message(id)) => {
                Ok((FieldType::Group, Some(TypeRef::Message(id))))
            }
            (None | Some(FieldType::Enum), Def::Enum(id)) => {
                Ok((FieldType::Enum, Some(TypeRef::Enum(id))))
            }
            (_, other) => Err(self.err(format!(
                "type '{type_name}' of field '{full_name}' is a {}, which does not match \
                 its declared type",
                other.kind().as_str()
            ))),
        }
    }

    fn resolve_services(&mut self, scratch: &Scratch<'_>) -> Result<()> {
        for pending in &scratch.services {
            let view = ArenaView::new(self.permanent, &self.work);
            let service_name = &view.service(pending.id).full_name;
            let mut methods: Vec<MethodDef> = Vec::with_capacity(pending.proto.method.len());
            for method in &pending.proto.method {
                let name = method.name();
                self.check_identifier(name, "method")?;
                if methods.iter().any(|existing| existing.name == name) {
                    return Err(self.err(format!(
                        "duplicate method '{name}' in service '{service_name}'"
                    )));
                }
                methods.push(MethodDef {
                    name: name.to_string(),
                    full_name: join(service_name, name),
                    input_type: self.resolve_message(
                        &pending.scope,
                        method.input_type(),
                        "input type",
                    )?,
                    output_type: self.resolve_message(
                        &pending.scope,
                        method.output_type(),
                        "output type",
                    )?,
                    client_streaming: method.client_streaming(),
                    server_streaming: method.server_streaming(),
                });
            }
            self.work
                .service_mut(pending.id)
                .ok_or_else(|| Error::internal("service missing from work arena"))?
                .methods = methods;
        }
        Ok(())
    }

    fn lay_out(&mut self, scratch: &Scratch<'_>) -> Result<()> {
        if let Some(provided) = self.layout {
            if provided.messages.len() != scratch.messages.len() {
                return Err(self.err(format!(
                    "mismatched layout: descriptor declares {} messages, layout has {}",
                    scratch.messages.len(),
                    provided.messages.len()
                )));
            }
            if provided.extensions.len() != scratch.extensions.len() {
                return Err(self.err(format!(
                    "mismatched layout: descriptor declares {} extensions, layout has {}",
                    scratch.extensions.len(),
                    provided.extensions.len()
                )));
            }
        }

        for (index, &id) in scratch.messages.iter().enumerate() {
            let view = ArenaView::new(self.permanent, &self.work);
            let message = view.message(id);
            let computed = match self.layout {
                Some(provided) => {
                    let numbers: Vec<i32> =
                        message.fields.iter().map(|&f| view.field(f).number).collect();
                    let layout = &provided.messages[index];
                    if !layout.matches_numbers(&numbers) {
                        return Err(self.err(format!(
                            "mismatched layout for message '{}'",
                            message.full_name
                        )));
                    }
                    layout.clone()
                }
                None => MessageLayout::new(
                    message
                        .fields
                        .iter()
                        .map(|&f| FieldLayout::for_field(view.field(f)))
                        .collect(),
                    !message.extension_ranges.is_empty(),
                    message.message_set_wire_format,
                ),
            };
            let layout_id = message.layout;
            *self.staged_layout_mut(layout_id)? = computed;
        }

        let mut taken = FxHashSet::default();
        for (index, &id) in scratch.extensions.iter().enumerate() {
            let view = ArenaView::new(self.permanent, &self.work);
            let field = view.field(id);
            let extendee = field
                .containing_type
                .ok_or_else(|| Error::internal("extension laid out before its extendee"))?;
            let extendee = view.message(extendee);

            let field_layout = match self.layout {
                Some(provided) => {
                    let layout = provided.extensions[index];
                    if layout.number != field.number {
                        return Err(self.err(format!(
                            "mismatched layout for extension '{}'",
                            field.full_name
                        )));
                    }
                    layout
                }
                None => FieldLayout::for_field(field),
            };

            let key = (extendee.layout, field.number);
            if self.registry.contains(key.0, key.1) || !taken.insert(key) {
                return Err(self.err(format!(
                    "duplicate extension number {} on message '{}' (extension '{}')",
                    field.number, extendee.full_name, field.full_name
                )));
            }

            let extension = self.work.alloc_extension_layout(|_| ExtensionLayout {
                extendee: key.0,
                field: field_layout,
            })?;
            self.work
                .field_mut(id)
                .ok_or_else(|| Error::internal("extension missing from work arena"))?
                .extension = Some(extension);
        }
        Ok(())
    }

    fn staged_layout_mut(&mut self, id: LayoutId) -> Result<&mut MessageLayout> {
        self.work
            .layout_mut(id)
            .ok_or_else(|| Error::internal("layout missing from work arena"))
    }
}

/// Joins a scope and a short name into a qualified name
fn join(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}

/// Convert a snake_case name to lowerCamelCase
fn to_lower_camel_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = false;

    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}
