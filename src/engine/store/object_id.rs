use std::fmt;
use std::str::FromStr;

use rand::RngCore;

use crate::engine::errors::TableError;

/// Width of every object identifier in bytes.
pub const ID_LENGTH: usize = 20;

/// Fixed-width key of an object in the store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; ID_LENGTH]);

impl ObjectId {
    pub const fn from_bytes(bytes: [u8; ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Left-pads `key` with zero bytes to [`ID_LENGTH`].
    pub fn from_key(key: impl AsRef<[u8]>) -> Result<Self, TableError> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(TableError::NullArgument("object id"));
        }
        if key.len() > ID_LENGTH {
            return Err(TableError::OutOfRange(format!(
                "object id of {} bytes exceeds {} bytes",
                key.len(),
                ID_LENGTH
            )));
        }
        let mut bytes = [0u8; ID_LENGTH];
        bytes[ID_LENGTH - key.len()..].copy_from_slice(key);
        Ok(Self(bytes))
    }

    pub fn from_hex(s: &str) -> Result<Self, TableError> {
        let mut bytes = [0u8; ID_LENGTH];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| TableError::OutOfRange(format!("invalid hex object id '{}': {}", s, e)))?;
        Ok(Self(bytes))
    }

    /// Random id with UUIDv4-style version and variant bits.
    pub fn random() -> Self {
        let mut bytes = [0u8; ID_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes[6] = (bytes[6] & 0x0F) | 0x40;
        bytes[8] = (bytes[8] & 0x3F) | 0x80;
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
