//! Decoded log records

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{FieldType, MessageFormat, Value};

/// Mapping from fully-qualified field name to its declared element type.
pub type FieldCatalog = BTreeMap<String, FieldType>;

/// Stream prefix for one message instance: `"<format>_<multi_id>"`.
pub fn instance_name(format: &MessageFormat, multi_id: u8) -> String {
    format!("{}_{}", format.name, multi_id)
}

/// Add catalog entries for every field of `format` under one instance prefix.
///
/// Array fields get one `"<prefix>.<field>[<i>]"` entry per element.
pub fn catalog_instance(catalog: &mut FieldCatalog, format: &MessageFormat, multi_id: u8) {
    let prefix = instance_name(format, multi_id);
    for field in &format.fields {
        if field.is_array() {
            for idx in 0..field.size {
                catalog.insert(format!("{prefix}.{}[{idx}]", field.name), field.field_type);
            }
        } else {
            catalog.insert(format!("{prefix}.{}", field.name), field.field_type);
        }
    }
}

/// One DATA record decoded against its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageData {
    /// Schema this record was decoded with (shared with the registry)
    pub format: Arc<MessageFormat>,
    /// Instance discriminator, e.g. sensor 0 vs sensor 1
    pub multi_id: u8,
    /// Microseconds since boot
    pub timestamp: u64,
    /// One value per schema field, in declaration order
    pub values: Vec<Value>,
}

impl MessageData {
    /// Value of a field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.format
            .fields
            .iter()
            .position(|f| f.name == field)
            .and_then(|idx| self.values.get(idx))
    }

    /// Merge this record into `update` as flattened `"<format>_<multi>.<field>"` keys.
    ///
    /// Existing keys are overwritten, others are left untouched.
    pub fn flatten_into(&self, update: &mut HashMap<String, Value>) {
        let prefix = instance_name(&self.format, self.multi_id);
        for (field, value) in self.format.fields.iter().zip(&self.values) {
            match value {
                Value::Array(items) if field.is_array() => {
                    for (idx, item) in items.iter().enumerate() {
                        update.insert(format!("{prefix}.{}[{idx}]", field.name), item.clone());
                    }
                }
                _ => {
                    update.insert(format!("{prefix}.{}", field.name), value.clone());
                }
            }
        }
    }
}

/// Session metadata record (system name, versions, UTC reference...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub key: String,
    pub value: Value,
}

/// Replayable parameter record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageParameter {
    pub key: String,
    pub value: Value,
}

/// Any record produced by the frame decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Format(Arc<MessageFormat>),
    Data(MessageData),
    Info(MessageInfo),
    Parameter(MessageParameter),
}

impl Message {
    pub fn as_data(&self) -> Option<&MessageData> {
        match self {
            Message::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Message::Data(_))
    }
}
