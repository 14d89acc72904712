//! Message format registry

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::types::MessageFormat;

/// Schemas learned from FORMAT records, keyed by message ID.
///
/// A redefinition replaces the previous schema wholesale. Records already
/// decoded keep the `Arc` of the schema they were decoded with.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: HashMap<u8, Arc<MessageFormat>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, replacing any previous one with the same ID.
    pub fn register(&mut self, format: Arc<MessageFormat>) {
        let msg_id = format.msg_id;
        if let Some(previous) = self.formats.insert(msg_id, Arc::clone(&format)) {
            if *previous != *format {
                debug!(
                    "Message ID {} redefined: '{}' replaces '{}'",
                    msg_id, format.name, previous.name
                );
            }
        }
    }

    pub fn get(&self, msg_id: u8) -> Option<&Arc<MessageFormat>> {
        self.formats.get(&msg_id)
    }

    pub fn contains(&self, msg_id: u8) -> bool {
        self.formats.contains_key(&msg_id)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<MessageFormat>> {
        self.formats.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldFormat, FieldType};

    #[test]
    fn last_definition_wins() {
        let mut registry = FormatRegistry::new();
        let v1 = Arc::new(MessageFormat::new(
            4,
            "battery",
            vec![FieldFormat::new("voltage", FieldType::Float32, 1)],
        ));
        let v2 = Arc::new(MessageFormat::new(
            4,
            "battery",
            vec![
                FieldFormat::new("voltage", FieldType::Float32, 1),
                FieldFormat::new("current", FieldType::Float32, 1),
            ],
        ));

        registry.register(Arc::clone(&v1));
        registry.register(Arc::clone(&v2));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(4).map(|f| f.fields.len()), Some(2));
        assert_eq!(v1.fields.len(), 1, "earlier schema stays intact for its holders");
        assert!(registry.get(5).is_none());
        assert!(!registry.contains(5));
    }
}
