//! Newtype IDs for type-safe entity references.
//!
//! The backend is a document store, so every id is an opaque string
//! (typically a 24-character hex object id). Use the `define_id!` macro to
//! create wrappers that prevent accidentally mixing ids of different entities.

use crate::cart::Variant;

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use shopfront_core::define_id;
/// define_id!(UserId);
/// define_id!(OrderId);
///
/// let user_id = UserId::new("64f0c1");
/// let order_id = OrderId::new("64f0c1");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(LineId);
define_id!(UserId);
define_id!(OrderId);

impl LineId {
    /// Build the client-side id of a guest cart line.
    ///
    /// Guest lines never reach the server under this id; it only has to be
    /// unique within one cart. Product, both variant selectors and the
    /// creation time all take part, so two variants added within the same
    /// millisecond still get distinct ids.
    #[must_use]
    pub fn for_guest(product_id: &ProductId, variant: &Variant, created_at_millis: i64) -> Self {
        let size = variant.size.as_deref().unwrap_or("-");
        let color = variant.color.as_deref().unwrap_or("-");
        Self(format!("{product_id}:{size}:{color}:{created_at_millis}"))
    }
}
