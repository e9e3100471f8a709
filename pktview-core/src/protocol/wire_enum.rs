//! Enums with symbolic names for wire values.
//!
//! Declare with [`wire_enum!`](crate::wire_enum). The generated enum knows its
//! own name table, so decoded fields render as `Guild` instead of `3`, and a
//! protocol's opcode enum can be listed without a packet.

/// An enum whose variants map to raw wire values.
pub trait WireEnum: Copy + Sized + 'static {
    /// Name of the enum type.
    const TYPE_NAME: &'static str;

    /// All variants, in declaration order.
    const VARIANTS: &'static [Self];

    /// Look up the variant for a raw value.
    fn from_raw(raw: u64) -> Option<Self>;

    /// Raw wire value of this variant.
    fn raw(self) -> u64;

    /// Symbolic name of this variant.
    fn name(self) -> &'static str;
}

/// Type-erased view of a [`WireEnum`], used for a protocol's opcode type.
#[derive(Clone, Copy)]
pub struct EnumType {
    name: &'static str,
    lookup: fn(u64) -> Option<&'static str>,
    entries: fn() -> Vec<(u64, &'static str)>,
}

impl EnumType {
    pub fn of<E: WireEnum>() -> Self {
        Self {
            name: E::TYPE_NAME,
            lookup: |raw| E::from_raw(raw).map(E::name),
            entries: || E::VARIANTS.iter().map(|v| (v.raw(), v.name())).collect(),
        }
    }

    /// Name of the enum type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Symbolic name for a raw value.
    pub fn variant_name(&self, raw: u64) -> Option<&'static str> {
        (self.lookup)(raw)
    }

    /// (raw value, name) pairs in declaration order.
    pub fn entries(&self) -> Vec<(u64, &'static str)> {
        (self.entries)()
    }
}

impl std::fmt::Debug for EnumType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnumType").field("name", &self.name).finish()
    }
}

/// Declare an enum with a raw representation and a name table.
///
/// ```
/// pktview_core::wire_enum! {
///     /// Room state.
///     pub enum RoomState: u8 {
///         Open = 0,
///         Full = 1,
///     }
/// }
///
/// use pktview_core::protocol::WireEnum;
/// assert_eq!(RoomState::from_raw(1), Some(RoomState::Full));
/// assert_eq!(RoomState::Full.name(), "Full");
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr($repr)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $crate::protocol::WireEnum for $name {
            const TYPE_NAME: &'static str = stringify!($name);
            const VARIANTS: &'static [Self] = &[$($name::$variant),+];

            fn from_raw(raw: u64) -> Option<Self> {
                $(
                    if raw == $name::$variant as u64 {
                        return Some($name::$variant);
                    }
                )+
                None
            }

            fn raw(self) -> u64 {
                self as $repr as u64
            }

            fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant) ),+
                }
            }
        }
    };
}
