//! Typed model of the Notion objects the mirror reads.
//!
//! Decoding is lenient: unknown block and property types, and recognized
//! types with an unexpected body, decode to explicit fallback variants
//! instead of failing the enclosing object.

mod block;
mod database;
mod page;
mod property;
mod rich_text;

pub use block::{Block, BlockKind};
pub use database::{Database, PropertySchema, SchemaKind};
pub use page::{Page, Parent, UNTITLED};
pub use property::PropertyValue;
pub use rich_text::{RichText, plain_text, title_or};

/// JSON objects decoded as `(key, value)` lists in document order.
mod ordered {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        struct Entries<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for Entries<T> {
            type Value = Vec<(String, T)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(Entries(PhantomData))
    }
}
