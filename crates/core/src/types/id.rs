//! Typed row ids.
//!
//! Each table's primary key gets its own wrapper so a product id cannot be
//! passed where a user id is expected. On the wire and in `PostgreSQL` the
//! ids are plain integers.

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(transparent))]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

entity_id!(
    /// `pencraft.user.id`.
    UserId
);
entity_id!(
    /// `pencraft.product.id`.
    ProductId
);
entity_id!(
    /// `pencraft.order.id`.
    OrderId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_plain_integers_on_the_wire() {
        assert_eq!(serde_json::to_string(&UserId::new(7)).unwrap(), "7");
        assert_eq!(
            serde_json::from_str::<ProductId>("42").unwrap(),
            ProductId::new(42)
        );
    }

    #[test]
    fn test_id_display() {
        assert_eq!(OrderId::new(12).to_string(), "12");
        assert_eq!(ProductId::new(3).as_i32(), 3);
    }

    #[test]
    fn test_ids_order_by_value() {
        assert!(OrderId::new(2) > OrderId::new(1));
    }
}
