//! Message schema types carried by FORMAT records

use serde::{Deserialize, Serialize};
use std::fmt;

use super::FieldType;
use crate::{Result, UlogError};

/// Separator between field descriptors in a FORMAT record.
pub const DESCRIPTOR_SEPARATOR: char = ';';

/// One field of a message schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct FieldFormat {
    /// Field name as declared by the firmware
    pub name: String,
    /// Element type
    pub field_type: FieldType,
    /// Number of elements (1 for scalars, >1 for fixed arrays)
    pub size: usize,
}

impl FieldFormat {
    pub fn new(name: impl Into<String>, field_type: FieldType, size: usize) -> Self {
        Self { name: name.into(), field_type, size }
    }

    pub fn is_array(&self) -> bool {
        self.size > 1
    }

    /// Total encoded width of this field in bytes.
    pub fn byte_len(&self) -> usize {
        self.field_type.size() * self.size
    }

    /// Parse a `"<code>[<n>]:<name>"` descriptor.
    pub fn parse_descriptor(descriptor: &str) -> Result<Self> {
        let malformed = |details: String| UlogError::Parse {
            context: "Field descriptor".to_string(),
            details,
        };

        let (type_part, name) = descriptor
            .split_once(':')
            .ok_or_else(|| malformed(format!("Missing ':' in descriptor '{descriptor}'")))?;
        if name.is_empty() {
            return Err(malformed(format!("Empty field name in descriptor '{descriptor}'")));
        }

        let mut chars = type_part.chars();
        let code = chars
            .next()
            .ok_or_else(|| malformed(format!("Missing type code in descriptor '{descriptor}'")))?;
        let field_type = FieldType::from_code(code)
            .ok_or_else(|| malformed(format!("Unknown type code '{code}' for field '{name}'")))?;

        let rest = chars.as_str();
        let size = if rest.is_empty() {
            1
        } else {
            let count = rest
                .strip_prefix('[')
                .and_then(|r| r.strip_suffix(']'))
                .ok_or_else(|| malformed(format!("Bad array suffix '{rest}' for field '{name}'")))?;
            let size: usize = count.parse().map_err(|_| {
                malformed(format!("Bad array size '{count}' for field '{name}'"))
            })?;
            if size == 0 {
                return Err(malformed(format!("Zero-length array for field '{name}'")));
            }
            size
        };

        Ok(Self { name: name.to_string(), field_type, size })
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array() {
            write!(f, "{}[{}]:{}", self.field_type.code(), self.size, self.name)
        } else {
            write!(f, "{}:{}", self.field_type.code(), self.name)
        }
    }
}

/// Schema for one message ID, as declared by a FORMAT record.
///
/// Immutable once parsed. A later FORMAT with the same ID replaces the whole
/// value in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct MessageFormat {
    pub msg_id: u8,
    pub name: String,
    pub fields: Vec<FieldFormat>,
    /// Descriptor list exactly as declared, including `[1]` suffixes and
    /// empty segments
    descriptor_text: String,
}

impl MessageFormat {
    /// Build a schema from fields; the descriptor text is the canonical form.
    pub fn new(msg_id: u8, name: impl Into<String>, fields: Vec<FieldFormat>) -> Self {
        let descriptor_text = fields
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(&DESCRIPTOR_SEPARATOR.to_string());
        Self { msg_id, name: name.into(), fields, descriptor_text }
    }

    /// Parse a schema from its declared descriptor list, keeping the text verbatim
    /// so [`encode`](Self::encode) reproduces the original payload.
    pub fn from_descriptors(
        msg_id: u8,
        name: impl Into<String>,
        descriptors: impl Into<String>,
    ) -> Result<Self> {
        let descriptor_text = descriptors.into();
        let fields = Self::parse_descriptors(&descriptor_text)?;
        Ok(Self { msg_id, name: name.into(), fields, descriptor_text })
    }

    /// Private formats (name starting with `_`) stay out of the field catalog.
    pub fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }

    /// Payload bytes taken by the field values of one DATA record.
    pub fn values_len(&self) -> usize {
        self.fields.iter().map(FieldFormat::byte_len).sum()
    }

    /// Parse a `;`-separated descriptor list. Empty segments are skipped.
    pub fn parse_descriptors(descriptors: &str) -> Result<Vec<FieldFormat>> {
        descriptors
            .split(DESCRIPTOR_SEPARATOR)
            .filter(|d| !d.is_empty())
            .map(FieldFormat::parse_descriptor)
            .collect()
    }

    /// Descriptor list as declared by the FORMAT record.
    pub fn descriptors(&self) -> &str {
        &self.descriptor_text
    }

    /// Encode the FORMAT payload:
    /// `[u8 msg_id][u8 name_len][name][u16 LE descr_len][descriptors]`.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let descriptors = self.descriptors();
        let name_len = u8::try_from(self.name.len()).map_err(|_| UlogError::Parse {
            context: "FORMAT encoding".to_string(),
            details: format!("Format name '{}' exceeds 255 bytes", self.name),
        })?;
        let descr_len = u16::try_from(descriptors.len()).map_err(|_| UlogError::Parse {
            context: "FORMAT encoding".to_string(),
            details: format!("Descriptors of '{}' exceed 65535 bytes", self.name),
        })?;

        let mut payload = Vec::with_capacity(4 + self.name.len() + descriptors.len());
        payload.push(self.msg_id);
        payload.push(name_len);
        payload.extend_from_slice(self.name.as_bytes());
        payload.extend_from_slice(&descr_len.to_le_bytes());
        payload.extend_from_slice(descriptors.as_bytes());
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, ensure};

    #[test]
    fn scalar_and_array_descriptors() -> Result<()> {
        let scalar = FieldFormat::parse_descriptor("Q:timestamp_sample")?;
        ensure!(scalar == FieldFormat::new("timestamp_sample", FieldType::UInt64, 1));
        ensure!(!scalar.is_array());

        let array = FieldFormat::parse_descriptor("f[3]:accel")?;
        ensure!(array == FieldFormat::new("accel", FieldType::Float32, 3));
        ensure!(array.is_array());
        ensure!(array.byte_len() == 12);
        Ok(())
    }

    #[test]
    fn rejects_malformed_descriptors() {
        for bad in ["faccel", "f:", ":x", "x:field", "f[0]:a", "f[3:a", "f[x]:a", "f3]:a"] {
            assert!(
                FieldFormat::parse_descriptor(bad).is_err(),
                "descriptor {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn descriptor_list_skips_empty_segments() -> Result<()> {
        let fields = MessageFormat::parse_descriptors("f:x;;B[4]:flags;")?;
        ensure!(fields.len() == 2);
        ensure!(fields[1].size == 4);
        Ok(())
    }

    #[test]
    fn encode_layout() -> Result<()> {
        let format = MessageFormat::new(
            7,
            "gps",
            vec![
                FieldFormat::new("lat", FieldType::Int32, 1),
                FieldFormat::new("cov", FieldType::Float32, 2),
            ],
        );
        let payload = format.encode()?;
        let descriptors = b"i:lat;f[2]:cov";

        ensure!(payload[0] == 7);
        ensure!(payload[1] == 3);
        ensure!(&payload[2..5] == b"gps");
        ensure!(payload[5..7] == (descriptors.len() as u16).to_le_bytes());
        ensure!(&payload[7..] == descriptors);
        ensure!(format.values_len() == 12);
        Ok(())
    }

    #[test]
    fn declared_descriptor_text_survives_reencoding() -> Result<()> {
        for declared in ["f[1]:x", "f:x;B:y;", "b:a;;d[1]:b;", ""] {
            let format = MessageFormat::from_descriptors(3, "raw", declared)?;
            ensure!(format.descriptors() == declared);

            let payload = format.encode()?;
            ensure!(&payload[7..] == declared.as_bytes(), "re-encoded {declared:?} differently");
        }

        let explicit = MessageFormat::from_descriptors(3, "raw", "f[1]:x;")?;
        ensure!(explicit.fields == vec![FieldFormat::new("x", FieldType::Float32, 1)]);
        ensure!(explicit != MessageFormat::new(3, "raw", explicit.fields.clone()));
        Ok(())
    }

    #[test]
    fn canonical_descriptors_from_fields() {
        let format = MessageFormat::new(
            1,
            "imu",
            vec![
                FieldFormat::new("accel", FieldType::Float32, 3),
                FieldFormat::new("temp", FieldType::UInt16, 1),
            ],
        );
        assert_eq!(format.descriptors(), "f[3]:accel;H:temp");
    }

    #[test]
    fn private_names() {
        assert!(MessageFormat::new(1, "_padding", vec![]).is_private());
        assert!(!MessageFormat::new(1, "sensor_combined", vec![]).is_private());
        assert!(!MessageFormat::new(1, "", vec![]).is_private());
    }
}
