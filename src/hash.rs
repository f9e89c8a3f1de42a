use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;

use crate::Error;

/// SHA-1 hash used for content addressing (40 lowercase hex chars)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; 20]);

impl Hash {
    /// zero hash (useful as sentinel)
    pub const ZERO: Hash = Hash([0u8; 20]);

    /// create from raw bytes
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// hash arbitrary bytes
    pub fn of(data: &[u8]) -> Self {
        Self(Sha1::digest(data).into())
    }

    /// parse from hex string
    ///
    /// only 40 lowercase hex chars are accepted; uppercase digits would
    /// derive a different on-disk path for the same object.
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        if s.len() != 40 || s.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(Error::InvalidInput(format!("bad hash format: {}", s)));
        }
        let bytes = hex::decode(s)
            .map_err(|_| Error::InvalidInput(format!("bad hash format: {}", s)))?;
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// get raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// split into path components for the object store
    /// returns (first 2 hex chars, remaining 38 hex chars)
    pub fn to_path_components(&self) -> (String, String) {
        let hex = self.to_hex();
        (hex[..2].to_string(), hex[2..].to_string())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..12])
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// frame a payload in the object wire form: `"<type> <len>\0<payload>"`
///
/// the object's identity is the SHA-1 of this framed (uncompressed) form.
pub fn frame(object_type: &str, payload: &[u8]) -> crate::Result<Vec<u8>> {
    if object_type.is_empty() {
        return Err(Error::InvalidInput("empty object type".to_string()));
    }

    let len_digits = payload.len().to_string();
    let mut framed = Vec::with_capacity(object_type.len() + 1 + len_digits.len() + 1 + payload.len());
    framed.extend_from_slice(object_type.as_bytes());
    framed.push(b' ');
    framed.extend_from_slice(len_digits.as_bytes());
    framed.push(0);
    framed.extend_from_slice(payload);
    Ok(framed)
}

/// frame a payload and compute its content hash in one step
pub fn frame_and_hash(object_type: &str, payload: &[u8]) -> crate::Result<(Vec<u8>, Hash)> {
    let framed = frame(object_type, payload)?;
    let hash = Hash::of(&framed);
    Ok((framed, hash))
}
