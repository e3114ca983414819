//! Macros for declaring state and event identifiers.

/// Declare a fieldless enum usable as a state or event identifier.
///
/// Derives everything [`StateId`](crate::core::StateId) and
/// [`EventId`](crate::core::EventId) need plus serde support for
/// checkpoints, and implements `Display` with the variant name.
///
/// # Example
///
/// ```
/// use hsm_engine::id_enum;
///
/// id_enum! {
///     pub enum Floor {
///         Ground,
///         First,
///     }
/// }
///
/// assert_eq!(Floor::First.to_string(), "First");
/// ```
#[macro_export]
macro_rules! id_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Debug,
            serde::Serialize,
            serde::Deserialize
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str(stringify!($variant))),*
                }
            }
        }
    };
}
