//! Core types for decoded log data.
//!
//! This module provides the data structures shared by the frame decoder, the
//! indexer, and consumers of the reader API.
//!
//! ## Architecture
//!
//! - [`FieldType`] is the closed set of primitive kinds a schema may declare,
//!   each with a wire code and fixed byte width
//! - [`FieldFormat`] and [`MessageFormat`] describe a schema parsed from a FORMAT record
//! - [`MessageData`] is a DATA record decoded against a shared [`MessageFormat`]
//! - [`MessageInfo`] and [`MessageParameter`] carry session metadata and parameters
//! - [`FieldCatalog`] enumerates every addressable leaf field name
//!
//! ## Usage Example
//!
//! ```rust
//! use ulog_reader::types::{FieldFormat, FieldType, MessageData, MessageFormat, Value};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let format = Arc::new(MessageFormat::new(
//!     1,
//!     "baro",
//!     vec![FieldFormat::parse_descriptor("f:pressure").unwrap()],
//! ));
//! let record = MessageData {
//!     format,
//!     multi_id: 0,
//!     timestamp: 1_000_000,
//!     values: vec![Value::Float32(1013.25)],
//! };
//!
//! let mut update = HashMap::new();
//! record.flatten_into(&mut update);
//! assert_eq!(update.get("baro_0.pressure"), Some(&Value::Float32(1013.25)));
//! ```

mod field_type;
mod format;
mod message;

// Re-export all public types
pub use field_type::{FieldType, Value};
pub use format::{DESCRIPTOR_SEPARATOR, FieldFormat, MessageFormat};
pub use message::{
    FieldCatalog, Message, MessageData, MessageInfo, MessageParameter, catalog_instance,
    instance_name,
};

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    prop_compose! {
        fn arb_field_format()(
            name in "[a-zA-Z][a-zA-Z0-9_]{0,15}",
            field_type in prop::sample::select(FieldType::ALL.to_vec()),
            size in prop_oneof![Just(1usize), 2..16usize],
        ) -> FieldFormat {
            FieldFormat { name, field_type, size }
        }
    }

    proptest! {
        #[test]
        fn prop_format_payload_reencodes_byte_identical(
            msg_id in any::<u8>(),
            name in "_?[a-z][a-z0-9_]{0,20}",
            fields in prop::collection::vec((arb_field_format(), any::<bool>()), 0..12),
            trailing_separator in any::<bool>(),
        ) {
            // Scalars are sometimes written with an explicit `[1]`, and firmware
            // often terminates the list with a separator.
            let mut declared = fields
                .iter()
                .map(|(field, explicit)| {
                    if field.size == 1 && *explicit {
                        format!("{}[1]:{}", field.field_type.code(), field.name)
                    } else {
                        field.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(";");
            if trailing_separator {
                declared.push(DESCRIPTOR_SEPARATOR);
            }

            let mut payload = vec![msg_id, name.len() as u8];
            payload.extend_from_slice(name.as_bytes());
            payload.extend_from_slice(&(declared.len() as u16).to_le_bytes());
            payload.extend_from_slice(declared.as_bytes());

            let format = MessageFormat::from_descriptors(msg_id, name, declared).unwrap();
            let expected: Vec<FieldFormat> = fields.into_iter().map(|(field, _)| field).collect();
            prop_assert_eq!(&format.fields, &expected);
            prop_assert_eq!(format.encode().unwrap(), payload);
        }

        #[test]
        fn prop_catalog_instance_has_one_entry_per_leaf(
            fields in prop::collection::btree_map(
                "[a-z][a-z0-9]{0,8}",
                (prop::sample::select(FieldType::ALL.to_vec()), 1..6usize),
                1..10
            ),
            multi_id in any::<u8>()
        ) {
            let fields: Vec<FieldFormat> = fields
                .into_iter()
                .map(|(name, (field_type, size))| FieldFormat { name, field_type, size })
                .collect();
            let leaves: usize = fields.iter().map(|f| f.size).sum();
            let format = MessageFormat::new(9, "topic", fields);

            let mut catalog = FieldCatalog::new();
            catalog_instance(&mut catalog, &format, multi_id);

            prop_assert_eq!(catalog.len(), leaves);
            let prefix = format!("topic_{multi_id}.");
            prop_assert!(catalog.keys().all(|k| k.starts_with(&prefix)));
        }
    }
}
