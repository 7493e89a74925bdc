//! Payload byte encoding shared by environments and transforms.
//!
//! Typed payloads are carried as opaque bytes holding a JSON document. On the
//! JSON wire those bytes travel as standard base64 strings.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Decodes a typed payload. Empty bytes decode to the all-defaults message,
/// the same way an unset message decodes in protobuf.
pub(crate) fn decode_message<T>(bytes: &[u8]) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned + Default,
{
    if bytes.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes)
}

pub(crate) fn encode_message<T: Serialize>(message: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(message)
}

/// `#[serde(with = "crate::codec::base64_bytes")]` for `Vec<u8>` fields.
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
