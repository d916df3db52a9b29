//! Compiled binary layouts.
//!
//! A layout is the wire-level view of a message: which field numbers it
//! carries and how each one is encoded. Extensions get their own layout,
//! and the position of that layout in the pool is the extension's
//! identity ([`ExtensionId`](crate::ExtensionId)).
//!
//! Layouts are normally derived from the definitions while a file is
//! built. A caller that already has them (for example generated code
//! shipping precomputed tables) can pass a [`FileLayout`] instead. Its
//! entries must follow declaration order. Messages are listed pre-order,
//! a message before its nested messages. Extensions declared inside a
//! message follow those of its nested messages, and extensions declared
//! at file level come last.

use crate::def::{FieldDef, FieldType, Label};
use crate::ids::LayoutId;

/// Protobuf wire types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer
    Varint = 0,
    /// 64-bit fixed-width
    I64 = 1,
    /// Length-delimited (strings, bytes, embedded messages, packed fields)
    Len = 2,
    /// Start group (deprecated)
    StartGroup = 3,
    /// End group (deprecated)
    EndGroup = 4,
    /// 32-bit fixed-width
    I32 = 5,
}

impl WireType {
    /// Wire type used for a single value of `field_type`
    pub fn for_type(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Int32
            | FieldType::Int64
            | FieldType::Uint32
            | FieldType::Uint64
            | FieldType::Sint32
            | FieldType::Sint64
            | FieldType::Bool
            | FieldType::Enum => WireType::Varint,
            FieldType::Fixed64 | FieldType::Sfixed64 | FieldType::Double => WireType::I64,
            FieldType::Fixed32 | FieldType::Sfixed32 | FieldType::Float => WireType::I32,
            FieldType::String | FieldType::Bytes | FieldType::Message => WireType::Len,
            FieldType::Group => WireType::StartGroup,
        }
    }
}

/// Returns true if repeated values of `field_type` may be packed
pub fn is_packable(field_type: FieldType) -> bool {
    !matches!(
        field_type,
        FieldType::String | FieldType::Bytes | FieldType::Message | FieldType::Group
    )
}

/// Layout of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    /// Field number
    pub number: i32,
    /// Wire type the field is written with
    pub wire_type: WireType,
    /// Repeated field
    pub repeated: bool,
}

impl FieldLayout {
    /// Derives the layout of a built field
    pub fn for_field(field: &FieldDef) -> Self {
        let wire_type = if field.packed {
            WireType::Len
        } else {
            WireType::for_type(field.field_type)
        };
        Self {
            number: field.number,
            wire_type,
            repeated: field.label == Label::Repeated,
        }
    }
}

/// Layout of one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLayout {
    /// Fields sorted by number
    pub fields: Vec<FieldLayout>,
    /// Message accepts extensions
    pub extendable: bool,
    /// Message uses the message-set wire format
    pub message_set: bool,
}

impl MessageLayout {
    /// Builds a layout from field layouts in any order
    pub fn new(mut fields: Vec<FieldLayout>, extendable: bool, message_set: bool) -> Self {
        fields.sort_by_key(|field| field.number);
        Self {
            fields,
            extendable,
            message_set,
        }
    }

    /// Finds the layout of field `number`
    pub fn field(&self, number: i32) -> Option<&FieldLayout> {
        self.fields
            .binary_search_by_key(&number, |field| field.number)
            .ok()
            .map(|index| &self.fields[index])
    }

    /// Returns true if this layout carries exactly the given field numbers
    pub(crate) fn matches_numbers(&self, numbers: &[i32]) -> bool {
        let mut sorted = numbers.to_vec();
        sorted.sort_unstable();
        self.fields.len() == sorted.len()
            && self.fields.iter().zip(&sorted).all(|(f, n)| f.number == *n)
    }
}

/// Layout of one extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionLayout {
    /// Layout of the extended message
    pub extendee: LayoutId,
    /// Layout of the extension field itself
    pub field: FieldLayout,
}

/// Precomputed layouts for a whole file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileLayout {
    /// One layout per message, pre-order
    pub messages: Vec<MessageLayout>,
    /// One field layout per extension, declaration order
    pub extensions: Vec<FieldLayout>,
}
