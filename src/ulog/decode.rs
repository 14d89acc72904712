//! Record payload decoders
//!
//! Each decoder works on the bytes from the start of a payload to the end of
//! the stream and reports how many of them it consumed. The caller compares that
//! count with the declared frame size; a decoder never trusts the frame size to
//! bound its reads, so a short frame shows up as a size mismatch rather than as
//! silently truncated values.

use std::sync::Arc;

use crate::UlogError;
use crate::types::{FieldFormat, FieldType, MessageData, MessageFormat, Value};

/// Why a payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The stream ended before the record did
    Truncated { needed: usize, available: usize },
    /// The bytes are present but do not describe a valid record
    Malformed(String),
}

impl From<UlogError> for PayloadError {
    fn from(err: UlogError) -> Self {
        match err {
            UlogError::Parse { details, .. } => PayloadError::Malformed(details),
            other => PayloadError::Malformed(other.to_string()),
        }
    }
}

/// A decoded record and the number of payload bytes it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub record: T,
    pub consumed: usize,
}

struct PayloadReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], PayloadError> {
        let available = self.bytes.len() - self.pos;
        if available < n {
            return Err(PayloadError::Truncated { needed: self.pos + n, available: self.bytes.len() });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, PayloadError> {
        Ok(self.take(1)?[0])
    }

    fn u16_le(&mut self) -> Result<u16, PayloadError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u64_le(&mut self) -> Result<u64, PayloadError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(raw))
    }

    fn utf8(&mut self, n: usize, what: &str) -> Result<String, PayloadError> {
        let bytes = self.take(n)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| PayloadError::Malformed(format!("{what} is not valid UTF-8")))
    }

    fn element(&mut self, field_type: FieldType) -> Result<Value, PayloadError> {
        let bytes = self.take(field_type.size())?;
        field_type
            .decode(bytes)
            .ok_or_else(|| PayloadError::Malformed(format!("Cannot decode {field_type}")))
    }

    fn field(&mut self, field: &FieldFormat) -> Result<Value, PayloadError> {
        if field.is_array() {
            let items = (0..field.size)
                .map(|_| self.element(field.field_type))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(items))
        } else {
            self.element(field.field_type)
        }
    }
}

/// FORMAT: `[u8 msg_id][u8 name_len][name][u16 LE descr_len][descriptors]`.
pub fn decode_format(payload: &[u8]) -> Result<Decoded<MessageFormat>, PayloadError> {
    let mut reader = PayloadReader::new(payload);
    let msg_id = reader.u8()?;
    let name_len = reader.u8()? as usize;
    let name = reader.utf8(name_len, "Format name")?;
    let descr_len = reader.u16_le()? as usize;
    let descriptors = reader.utf8(descr_len, "Field descriptors")?;
    let format = MessageFormat::from_descriptors(msg_id, name, descriptors)?;

    Ok(Decoded { record: format, consumed: reader.pos })
}

/// Peek the message ID of a DATA payload.
pub fn data_msg_id(payload: &[u8]) -> Result<u8, PayloadError> {
    PayloadReader::new(payload).u8()
}

/// DATA: `[u8 msg_id][u8 multi_id][u64 LE timestamp][values in schema order]`.
pub fn decode_data(
    format: &Arc<MessageFormat>,
    payload: &[u8],
) -> Result<Decoded<MessageData>, PayloadError> {
    let mut reader = PayloadReader::new(payload);
    let _msg_id = reader.u8()?;
    let multi_id = reader.u8()?;
    let timestamp = reader.u64_le()?;
    let values =
        format.fields.iter().map(|field| reader.field(field)).collect::<Result<Vec<_>, _>>()?;

    Ok(Decoded {
        record: MessageData { format: Arc::clone(format), multi_id, timestamp, values },
        consumed: reader.pos,
    })
}

/// INFO / PARAMETER: `[u8 type code][u8 array size][u8 key_len][key][value]`.
///
/// Character arrays become [`Value::String`], cut at the first NUL.
pub fn decode_keyed_value(payload: &[u8]) -> Result<Decoded<(String, Value)>, PayloadError> {
    let mut reader = PayloadReader::new(payload);
    let code = reader.u8()?;
    let field_type = FieldType::from_code(code as char)
        .ok_or_else(|| PayloadError::Malformed(format!("Unknown type code {code:#04x}")))?;
    let size = reader.u8()? as usize;
    if size == 0 {
        return Err(PayloadError::Malformed("Zero-length value".to_string()));
    }
    let key_len = reader.u8()? as usize;
    let key = reader.utf8(key_len, "Key")?;

    let value = if field_type == FieldType::Char && size > 1 {
        let raw = reader.take(size)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Value::String(String::from_utf8_lossy(&raw[..end]).into_owned())
    } else {
        reader.field(&FieldFormat::new(key.clone(), field_type, size))?
    };

    Ok(Decoded { record: (key, value), consumed: reader.pos })
}
