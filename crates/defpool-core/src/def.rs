//! Definition objects stored in the pool.
//!
//! Every definition is owned by the pool's arena and refers to its
//! neighbours through typed ids. [`Def`] is the tagged reference the
//! symbol table stores: one variant per kind that can be looked up by
//! qualified name.

use crate::error::Error;
use crate::ids::{
    EnumId, EnumValueId, ExtensionId, FieldId, FileId, LayoutId, MessageId, ServiceId,
};
use rustc_hash::FxHashMap;
use std::ops::Range;

pub use prost_types::field_descriptor_proto::{Label, Type as FieldType};

/// Kind of definition a symbol refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefKind {
    /// A message type
    Message,
    /// An enum type
    Enum,
    /// A single enum value
    EnumValue,
    /// A service
    Service,
    /// An extension field
    Extension,
}

impl DefKind {
    /// Returns a lowercase label for messages and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            DefKind::Message => "message",
            DefKind::Enum => "enum",
            DefKind::EnumValue => "enum value",
            DefKind::Service => "service",
            DefKind::Extension => "extension",
        }
    }
}

/// Tagged reference to a named definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Def {
    /// A message type
    Message(MessageId),
    /// An enum type
    Enum(EnumId),
    /// A single enum value
    EnumValue(EnumValueId),
    /// A service
    Service(ServiceId),
    /// An extension field
    Extension(FieldId),
}

impl Def {
    /// Returns the kind tag of this reference
    pub fn kind(&self) -> DefKind {
        match self {
            Def::Message(_) => DefKind::Message,
            Def::Enum(_) => DefKind::Enum,
            Def::EnumValue(_) => DefKind::EnumValue,
            Def::Service(_) => DefKind::Service,
            Def::Extension(_) => DefKind::Extension,
        }
    }

    /// Returns the message id if this is a message
    pub fn as_message(self) -> Option<MessageId> {
        match self {
            Def::Message(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the enum id if this is an enum
    pub fn as_enum(self) -> Option<EnumId> {
        match self {
            Def::Enum(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the enum value id if this is an enum value
    pub fn as_enum_value(self) -> Option<EnumValueId> {
        match self {
            Def::EnumValue(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the service id if this is a service
    pub fn as_service(self) -> Option<ServiceId> {
        match self {
            Def::Service(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the field id if this is an extension
    pub fn as_extension(self) -> Option<FieldId> {
        match self {
            Def::Extension(id) => Some(id),
            _ => None,
        }
    }
}

/// Proto syntax version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// Proto2 syntax
    Proto2,
    /// Proto3 syntax
    Proto3,
}

impl Syntax {
    /// Returns the syntax declaration string
    pub fn as_str(&self) -> &'static str {
        match self {
            Syntax::Proto2 => "proto2",
            Syntax::Proto3 => "proto3",
        }
    }
}

impl TryFrom<&str> for Syntax {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Error> {
        match value {
            "" | "proto2" => Ok(Syntax::Proto2),
            "proto3" => Ok(Syntax::Proto3),
            _ => Err(Error::internal(format!("unsupported proto syntax '{value}'"))),
        }
    }
}

/// One loaded descriptor file
#[derive(Debug, Clone)]
pub struct FileDef {
    /// Handle of this file
    pub id: FileId,
    /// File name as declared in the descriptor
    pub name: String,
    /// Package, empty when none is declared
    pub package: String,
    /// Syntax of the file
    pub syntax: Syntax,
    /// Direct dependencies, in declaration order
    pub dependencies: Vec<FileId>,
    /// Dependencies re-exported with `import public`
    pub public_dependencies: Vec<FileId>,
    /// Dependencies imported with `import weak`
    pub weak_dependencies: Vec<FileId>,
    /// Top-level messages
    pub messages: Vec<MessageId>,
    /// Top-level enums
    pub enums: Vec<EnumId>,
    /// Services
    pub services: Vec<ServiceId>,
    /// Top-level extensions
    pub extensions: Vec<FieldId>,
}

/// A member of a message addressable by its short name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    /// A regular field
    Field(FieldId),
    /// A oneof, by position in [`MessageDef::oneofs`]
    Oneof(usize),
}

/// A message type
#[derive(Debug, Clone)]
pub struct MessageDef {
    /// Handle of this message
    pub id: MessageId,
    /// Short name
    pub name: String,
    /// Fully qualified name
    pub full_name: String,
    /// Declaring file
    pub file: FileId,
    /// Enclosing message for nested types
    pub containing_type: Option<MessageId>,
    /// Regular fields, in declaration order
    pub fields: Vec<FieldId>,
    /// Oneofs, in declaration order
    pub oneofs: Vec<OneofDef>,
    /// Nested message types
    pub nested_messages: Vec<MessageId>,
    /// Nested enum types
    pub nested_enums: Vec<EnumId>,
    /// Extensions declared inside this message's scope
    pub nested_extensions: Vec<FieldId>,
    /// Field numbers reserved for extensions (end exclusive)
    pub extension_ranges: Vec<Range<i32>>,
    /// Synthetic map entry type
    pub map_entry: bool,
    /// Uses the legacy message-set wire format
    pub message_set_wire_format: bool,
    /// Compiled layout of this message
    pub layout: LayoutId,
    pub(crate) members: FxHashMap<String, Member>,
}

impl MessageDef {
    /// Finds a field or oneof by its short name
    pub fn find_member_by_name(&self, name: &str) -> Option<Member> {
        self.members.get(name).copied()
    }

    /// Returns true if `number` lies inside one of the extension ranges
    pub fn is_extension_number(&self, number: i32) -> bool {
        self.extension_ranges.iter().any(|range| range.contains(&number))
    }
}

/// A oneof inside a message
#[derive(Debug, Clone)]
pub struct OneofDef {
    /// Short name
    pub name: String,
    /// Fully qualified name
    pub full_name: String,
    /// Member fields
    pub fields: Vec<FieldId>,
    /// Synthetic oneof created for a proto3 `optional` field
    pub synthetic: bool,
}

/// What a message, enum, or group field refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef {
    /// A message or group type
    Message(MessageId),
    /// An enum type
    Enum(EnumId),
}

/// A field or an extension
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Handle of this field
    pub id: FieldId,
    /// Short name
    pub name: String,
    /// Fully qualified name
    pub full_name: String,
    /// Declaring file
    pub file: FileId,
    /// Field number
    pub number: i32,
    /// Cardinality
    pub label: Label,
    /// Wire-level type
    pub field_type: FieldType,
    /// Referenced message or enum, for non-scalar fields
    pub type_ref: Option<TypeRef>,
    /// JSON name
    pub json_name: String,
    /// Default value as written in the descriptor
    pub default_value: Option<String>,
    /// Message this field belongs to; for extensions, the extendee.
    /// Only `None` while the declaring file is still being built.
    pub containing_type: Option<MessageId>,
    /// Message scope an extension was declared in
    pub extension_scope: Option<MessageId>,
    /// Position of the containing oneof in the message's oneofs
    pub oneof: Option<usize>,
    /// Repeated scalars encoded packed
    pub packed: bool,
    /// Declared with proto3 `optional`
    pub proto3_optional: bool,
    /// Extension identity, set for extensions once laid out
    pub extension: Option<ExtensionId>,
}

impl FieldDef {
    /// Returns true for extension fields
    pub fn is_extension(&self) -> bool {
        self.extension.is_some()
    }

    /// Returns true for repeated fields
    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }
}

/// An enum type
#[derive(Debug, Clone)]
pub struct EnumDef {
    /// Handle of this enum
    pub id: EnumId,
    /// Short name
    pub name: String,
    /// Fully qualified name
    pub full_name: String,
    /// Declaring file
    pub file: FileId,
    /// Enclosing message for nested enums
    pub containing_type: Option<MessageId>,
    /// Values in declaration order
    pub values: Vec<EnumValueId>,
    /// Proto2 semantics: unknown numbers are rejected
    pub closed: bool,
}

/// A single enum value
#[derive(Debug, Clone)]
pub struct EnumValueDef {
    /// Handle of this value
    pub id: EnumValueId,
    /// Short name
    pub name: String,
    /// Fully qualified name, scoped alongside the enum itself
    pub full_name: String,
    /// Numeric value
    pub number: i32,
    /// Owning enum
    pub parent: EnumId,
}

/// A service
#[derive(Debug, Clone)]
pub struct ServiceDef {
    /// Handle of this service
    pub id: ServiceId,
    /// Short name
    pub name: String,
    /// Fully qualified name
    pub full_name: String,
    /// Declaring file
    pub file: FileId,
    /// Methods in declaration order
    pub methods: Vec<MethodDef>,
}

impl ServiceDef {
    /// Finds a method by short name
    pub fn find_method_by_name(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|method| method.name == name)
    }
}

/// An RPC method
#[derive(Debug, Clone)]
pub struct MethodDef {
    /// Short name
    pub name: String,
    /// Fully qualified name
    pub full_name: String,
    /// Request message
    pub input_type: MessageId,
    /// Response message
    pub output_type: MessageId,
    /// Client streams requests
    pub client_streaming: bool,
    /// Server streams responses
    pub server_streaming: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_def_kind_matches_variant() {
        let def = Def::Message(MessageId::from_raw(1));
        assert_eq!(def.kind(), DefKind::Message);
        assert_eq!(def.as_message(), Some(MessageId::from_raw(1)));
        assert_eq!(def.as_enum(), None);
        assert_eq!(def.as_extension(), None);

        let def = Def::Extension(FieldId::from_raw(4));
        assert_eq!(def.kind(), DefKind::Extension);
        assert_eq!(def.as_message(), None);
    }

    #[test]
    fn test_syntax() {
        assert_eq!(Syntax::try_from("").unwrap(), Syntax::Proto2);
        assert_eq!(Syntax::try_from("proto2").unwrap(), Syntax::Proto2);
        assert_eq!(Syntax::try_from("proto3").unwrap(), Syntax::Proto3);
        assert!(Syntax::try_from("proto4").is_err());
    }
}
