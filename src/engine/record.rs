//! Log record format for the file-backed engine
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE, includes itself and the checksum)
//! +------------------+
//! | Op               | (u8: 1 = set, 2 = delete)
//! +------------------+
//! | Key              | (length-prefixed bytes)
//! +------------------+
//! | Value            | (length-prefixed bytes, empty for delete)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Checksum covers all bytes except the checksum itself.

use std::io::{self, Read};

use super::checksum::{compute_checksum, verify_checksum};

/// Smallest possible record: length + op + two empty length prefixes + checksum
pub const MIN_RECORD_SIZE: usize = 4 + 1 + 4 + 4 + 4;

/// Mutation kind carried by a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOp {
    Set,
    Delete,
}

impl LogOp {
    fn as_byte(self) -> u8 {
        match self {
            LogOp::Set => 1,
            LogOp::Delete => 2,
        }
    }

    fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(LogOp::Set),
            2 => Some(LogOp::Delete),
            _ => None,
        }
    }
}

/// One mutation in the engine log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub op: LogOp,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl LogRecord {
    /// Record for an upsert
    pub fn set(key: &[u8], value: &[u8]) -> Self {
        Self {
            op: LogOp::Set,
            key: key.to_vec(),
            value: value.to_vec(),
        }
    }

    /// Record for a removal
    pub fn delete(key: &[u8]) -> Self {
        Self {
            op: LogOp::Delete,
            key: key.to_vec(),
            value: Vec::new(),
        }
    }

    /// Serialize the complete record to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let record_length = (4 + 1 + 4 + self.key.len() + 4 + self.value.len() + 4) as u32;

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.push(self.op.as_byte());
        record.extend_from_slice(&(self.key.len() as u32).to_le_bytes());
        record.extend_from_slice(&self.key);
        record.extend_from_slice(&(self.value.len() as u32).to_le_bytes());
        record.extend_from_slice(&self.value);

        let checksum = compute_checksum(&record);
        record.extend_from_slice(&checksum.to_le_bytes());
        record
    }

    /// Deserialize a record from the front of `data`, verifying its checksum.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Record too short",
            ));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if record_length < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if data.len() < record_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Record truncated: expected {} bytes, got {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);

        if !verify_checksum(&data[0..checksum_offset], stored_checksum) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    compute_checksum(&data[0..checksum_offset]),
                    stored_checksum
                ),
            ));
        }

        let mut cursor = io::Cursor::new(&data[4..checksum_offset]);

        fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
            let mut len_buf = [0u8; 4];
            reader.read_exact(&mut len_buf)?;
            let len = u32::from_le_bytes(len_buf) as usize;

            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf)?;
            Ok(buf)
        }

        let mut op_buf = [0u8; 1];
        cursor.read_exact(&mut op_buf)?;
        let op = LogOp::from_byte(op_buf[0]).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unknown log op: {}", op_buf[0]),
            )
        })?;

        let key = read_bytes(&mut cursor)?;
        let value = read_bytes(&mut cursor)?;

        Ok((Self { op, key, value }, record_length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_record_roundtrip() {
        let record = LogRecord::set(b"customer.000100", br#"{"name":"Curt"}"#);
        let bytes = record.serialize();
        let (decoded, consumed) = LogRecord::deserialize(&bytes).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_delete_record_has_empty_value() {
        let bytes = LogRecord::delete(b"customer.000100").serialize();
        let (decoded, _) = LogRecord::deserialize(&bytes).unwrap();
        assert_eq!(decoded.op, LogOp::Delete);
        assert!(decoded.value.is_empty());
    }

    #[test]
    fn test_consumes_only_first_record() {
        let mut bytes = LogRecord::set(b"a", b"1").serialize();
        let first_len = bytes.len();
        bytes.extend(LogRecord::set(b"b", b"2").serialize());

        let (decoded, consumed) = LogRecord::deserialize(&bytes).unwrap();
        assert_eq!(decoded.key, b"a");
        assert_eq!(consumed, first_len);
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut bytes = LogRecord::set(b"key", b"value").serialize();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;

        let err = LogRecord::deserialize(&bytes).unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_truncated_record_rejected() {
        let bytes = LogRecord::set(b"key", b"value").serialize();
        let err = LogRecord::deserialize(&bytes[..bytes.len() - 2]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
