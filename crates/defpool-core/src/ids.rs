//! Typed index handles into the definition arena.
//!
//! Ids are positions in the pool-wide sequence of each definition kind.
//! A build transaction hands out ids past the end of the permanent arena,
//! so an id stays valid once its file commits.

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Creates an id from a raw arena position
            #[inline]
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Creates an id from a `usize` arena position
            #[inline]
            pub(crate) fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).expect("definition arena exceeds u32 ids"))
            }

            /// Returns the raw position
            #[inline]
            pub fn as_u32(self) -> u32 {
                self.0
            }

            /// Returns the position as an index
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Handle to a [`FileDef`](crate::def::FileDef)
    FileId
);
define_id!(
    /// Handle to a [`MessageDef`](crate::def::MessageDef)
    MessageId
);
define_id!(
    /// Handle to an [`EnumDef`](crate::def::EnumDef)
    EnumId
);
define_id!(
    /// Handle to an [`EnumValueDef`](crate::def::EnumValueDef)
    EnumValueId
);
define_id!(
    /// Handle to a [`ServiceDef`](crate::def::ServiceDef)
    ServiceId
);
define_id!(
    /// Handle to a [`FieldDef`](crate::def::FieldDef), plain field or extension
    FieldId
);
define_id!(
    /// Handle to a compiled [`MessageLayout`](crate::layout::MessageLayout)
    LayoutId
);
define_id!(
    /// Extension identity: handle to a compiled
    /// [`ExtensionLayout`](crate::layout::ExtensionLayout)
    ExtensionId
);
