use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Deserializer, Serialize, de::Visitor};

use super::encoding;

/// A newtype around `Vec<u8>` which serializes as an unpadded `base64url`
/// string.
///
/// This is the representation used for binary values that live inside the
/// WebAuthn dictionaries themselves (credential ids, challenges, PRF salts).
/// Deserialization also accepts plain `base64` and arrays of numbers so that
/// payloads captured from different clients parse uniformly.
#[derive(Debug, Default, PartialEq, Eq, Clone, Hash)]
#[repr(transparent)]
pub struct Bytes(Vec<u8>);

impl Deref for Bytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Bytes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(inner: Vec<u8>) -> Self {
        Bytes(inner)
    }
}

impl From<&[u8]> for Bytes {
    fn from(inner: &[u8]) -> Self {
        Bytes(inner.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Bytes {
    fn from(inner: [u8; N]) -> Self {
        Bytes(inner.to_vec())
    }
}

impl From<Bytes> for Vec<u8> {
    fn from(src: Bytes) -> Self {
        src.0
    }
}

impl From<Bytes> for String {
    fn from(src: Bytes) -> Self {
        encoding::base64url(&src)
    }
}

impl TryFrom<&str> for Bytes {
    type Error = encoding::DecodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        encoding::from_base64url(value)
            .or_else(|e| encoding::try_from_base64(value).ok_or(e))
            .map(Self)
    }
}

impl FromIterator<u8> for Bytes {
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        Bytes(iter.into_iter().collect())
    }
}

impl IntoIterator for Bytes {
    type Item = u8;

    type IntoIter = std::vec::IntoIter<u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Bytes {
    type Item = &'a u8;

    type IntoIter = std::slice::Iter<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for Bytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&encoding::base64url(&self.0))
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Base64Visitor;

        impl<'de> Visitor<'de> for Base64Visitor {
            type Value = Bytes;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "a byte sequence or a base64(url) encoded string")
            }

            fn visit_borrowed_str<E>(self, v: &'de str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_str(v)
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_str(&v)
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.try_into().map_err(|_| {
                    E::invalid_value(
                        serde::de::Unexpected::Str(v),
                        &"a base64(url) encoded string",
                    )
                })
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut buf = Vec::with_capacity(seq.size_hint().unwrap_or_default());
                while let Some(byte) = seq.next_element()? {
                    buf.push(byte);
                }
                Ok(Bytes(buf))
            }
        }
        deserializer.deserialize_any(Base64Visitor)
    }
}

/// The wallet backend's wire representation of raw bytes: a JSON object of
/// the shape `{"$b64u": "<base64url, no padding>"}`.
///
/// Every binary field crossing the backend's HTTP boundary (challenge,
/// rawId, clientDataJSON, attestationObject, authenticatorData, signature,
/// userHandle) uses this tag. Decoding then re-encoding is byte-identical.
#[derive(Debug, Default, PartialEq, Eq, Clone, Hash)]
#[repr(transparent)]
pub struct TaggedBytes(Vec<u8>);

#[derive(Serialize, Deserialize)]
struct TaggedRepr {
    #[serde(rename = "$b64u")]
    b64u: String,
}

impl Deref for TaggedBytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u8>> for TaggedBytes {
    fn from(inner: Vec<u8>) -> Self {
        TaggedBytes(inner)
    }
}

impl From<&[u8]> for TaggedBytes {
    fn from(inner: &[u8]) -> Self {
        TaggedBytes(inner.to_vec())
    }
}

impl From<TaggedBytes> for Vec<u8> {
    fn from(src: TaggedBytes) -> Self {
        src.0
    }
}

impl From<Bytes> for TaggedBytes {
    fn from(src: Bytes) -> Self {
        TaggedBytes(src.0)
    }
}

impl From<TaggedBytes> for Bytes {
    fn from(src: TaggedBytes) -> Self {
        Bytes(src.0)
    }
}

impl Serialize for TaggedBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        TaggedRepr {
            b64u: encoding::base64url(&self.0),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TaggedBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = TaggedRepr::deserialize(deserializer)?;
        encoding::from_base64url(&repr.b64u)
            .map(TaggedBytes)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn deserialize_many_formats_into_bytes() {
        let json = r#"{
            "array": [101,195,212,161,191,112,75,189,152,52,121,17,62,113,114,164],
            "base64url": "ZcPUob9wS72YNHkRPnFypA",
            "base64": "ZcPUob9wS72YNHkRPnFypA=="
        }"#;

        let deserialized: HashMap<&str, Bytes> =
            serde_json::from_str(json).expect("failed to deserialize");

        assert_eq!(deserialized["array"], deserialized["base64url"]);
        assert_eq!(deserialized["base64url"], deserialized["base64"]);
    }

    #[test]
    fn tagged_bytes_round_trip() {
        let tagged = TaggedBytes::from(vec![0u8, 1, 254, 255]);
        let json = serde_json::to_string(&tagged).expect("failed to serialize");
        assert_eq!(json, r#"{"$b64u":"AAH-_w"}"#);
        let back: TaggedBytes = serde_json::from_str(&json).expect("failed to deserialize");
        assert_eq!(back, tagged);
    }

    #[test]
    fn tagged_bytes_empty_round_trip() {
        let tagged = TaggedBytes::default();
        let json = serde_json::to_string(&tagged).expect("failed to serialize");
        assert_eq!(json, r#"{"$b64u":""}"#);
        let back: TaggedBytes = serde_json::from_str(&json).expect("failed to deserialize");
        assert!(back.is_empty());
    }

    #[test]
    fn tagged_bytes_rejects_malformed_encoding() {
        serde_json::from_str::<TaggedBytes>(r#"{"$b64u":"!!!"}"#)
            .expect_err("malformed base64url must not decode");
    }
}
