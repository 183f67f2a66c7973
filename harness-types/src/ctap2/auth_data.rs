use std::{
    fmt,
    io::{Cursor, Read},
    num::TryFromIntError,
};

use ciborium::value::Value;
use coset::{AsCborValue, CborSerializable, CoseKey};

use crate::{
    crypto::sha256,
    ctap2::{Aaguid, Flags},
};

/// The contextual bindings an authenticator attests to with every signature:
/// which RP the credential is scoped to, whether the user was present and
/// verified, the signature counter, and (on creation) the new credential's
/// public key.
///
/// <https://w3c.github.io/webauthn/#sctn-authenticator-data>
#[derive(Debug, PartialEq)]
pub struct AuthenticatorData {
    /// SHA-256 hash of the RP ID the credential is scoped to.
    rp_id_hash: [u8; 32],

    /// The flag byte. [`Flags::AT`] and [`Flags::ED`] are derived from the
    /// optional payloads when encoding.
    pub flags: Flags,

    /// Signature counter, encoded as a big-endian u32.
    pub counter: Option<u32>,

    /// Present on creation; carries the new credential's id and public key.
    pub attested_credential_data: Option<AttestedCredentialData>,

    /// Extension outputs as a CBOR map keyed by extension identifier.
    pub extensions: Option<Value>,
}

/// The byte slice is not a well-formed authenticator data structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDataParseError {
    /// Shorter than the 37 byte fixed prefix.
    TooShort,
    /// The flag byte uses reserved bits.
    InvalidFlags,
    /// The attested credential data did not parse.
    MalformedCredentialData,
    /// The trailing extension map did not parse as CBOR.
    MalformedExtensions,
}

impl fmt::Display for AuthDataParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::TooShort => "authenticator data is shorter than its fixed 37 byte prefix",
            Self::InvalidFlags => "authenticator data flag byte uses reserved bits",
            Self::MalformedCredentialData => "attested credential data is malformed",
            Self::MalformedExtensions => "extension data is not a CBOR value",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for AuthDataParseError {}

impl AuthenticatorData {
    /// Create authenticator data scoped to `rp_id` with default flags.
    pub fn new(rp_id: &str, counter: Option<u32>) -> Self {
        Self {
            rp_id_hash: sha256(rp_id.as_bytes()),
            flags: Flags::empty(),
            counter,
            attested_credential_data: None,
            extensions: None,
        }
    }

    /// Attach attested credential data; [`Flags::AT`] is set on encoding.
    pub fn with_attested_credential_data(mut self, acd: AttestedCredentialData) -> Self {
        self.attested_credential_data = Some(acd);
        self
    }

    /// Merge additional [`Flags`].
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags |= flags;
        self
    }

    /// Read access to the RP ID hash.
    pub fn rp_id_hash(&self) -> &[u8] {
        &self.rp_id_hash
    }

    /// Encode to the byte representation signatures are computed over.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut flags = self.flags;
        if self.attested_credential_data.is_some() {
            flags |= Flags::AT;
        }
        if self.extensions.is_some() {
            flags |= Flags::ED;
        }

        let mut out = Vec::with_capacity(37);
        out.extend_from_slice(&self.rp_id_hash);
        out.push(flags.into());
        out.extend_from_slice(&self.counter.unwrap_or_default().to_be_bytes());
        if let Some(acd) = &self.attested_credential_data {
            acd.append_to(&mut out);
        }
        if let Some(extensions) = &self.extensions {
            // SAFETY: serializing an in-memory CBOR value into a Vec cannot fail.
            ciborium::ser::into_writer(extensions, &mut out).unwrap();
        }
        out
    }

    /// Decode authenticator data from its byte representation.
    pub fn from_slice(v: &[u8]) -> Result<Self, AuthDataParseError> {
        // rp id hash (32) + flags (1) + counter (4)
        if v.len() < 37 {
            return Err(AuthDataParseError::TooShort);
        }
        let (rp_id_hash, v) = v.split_at(32);
        let (flag_byte, v) = v.split_at(1);
        let (counter, v) = v.split_at(4);

        let flags = Flags::from_bits(flag_byte[0]).ok_or(AuthDataParseError::InvalidFlags)?;

        let mut reader = Cursor::new(v);
        let attested_credential_data = flags
            .contains(Flags::AT)
            .then(|| AttestedCredentialData::from_reader(&mut reader))
            .transpose()?;
        let extensions = flags
            .contains(Flags::ED)
            .then(|| {
                ciborium::de::from_reader(&mut reader)
                    .map_err(|_| AuthDataParseError::MalformedExtensions)
            })
            .transpose()?;

        // SAFETY: the slices are created by split_at with matching lengths.
        Ok(Self {
            rp_id_hash: rp_id_hash.try_into().unwrap(),
            flags,
            counter: Some(u32::from_be_bytes(counter.try_into().unwrap())),
            attested_credential_data,
            extensions,
        })
    }
}

/// The attested credential data block added to the authenticator data when
/// a credential is created.
///
/// <https://w3c.github.io/webauthn/#attested-credential-data>
#[derive(Debug, Clone, PartialEq)]
pub struct AttestedCredentialData {
    /// The AAGUID of the creating authenticator.
    pub aaguid: Aaguid,

    /// The credential id; kept private so its length stays within the u16
    /// the wire format prepends.
    credential_id: Vec<u8>,

    /// The credential public key in COSE_Key form.
    pub key: CoseKey,
}

impl AttestedCredentialData {
    /// Build attested credential data, rejecting credential ids longer than
    /// a u16 can describe.
    pub fn new(
        aaguid: Aaguid,
        credential_id: Vec<u8>,
        key: CoseKey,
    ) -> Result<Self, TryFromIntError> {
        u16::try_from(credential_id.len())?;
        Ok(Self {
            aaguid,
            credential_id,
            key,
        })
    }

    /// Read access to the credential id.
    pub fn credential_id(&self) -> &[u8] {
        &self.credential_id
    }

    fn append_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.aaguid.0);
        // SAFETY: the constructor asserted the length fits in a u16.
        out.extend_from_slice(&u16::try_from(self.credential_id.len()).unwrap().to_be_bytes());
        out.extend_from_slice(&self.credential_id);
        // SAFETY: encoding an in-memory COSE key cannot fail.
        out.extend_from_slice(&self.key.clone().to_vec().unwrap());
    }

    fn from_reader<R: Read>(reader: &mut R) -> Result<Self, AuthDataParseError> {
        let malformed = |_| AuthDataParseError::MalformedCredentialData;

        let mut aaguid = [0; 16];
        reader.read_exact(&mut aaguid).map_err(malformed)?;

        let mut cred_len = [0; 2];
        reader.read_exact(&mut cred_len).map_err(malformed)?;
        let cred_len = usize::from(u16::from_be_bytes(cred_len));

        let mut credential_id = vec![0; cred_len];
        reader.read_exact(&mut credential_id).map_err(malformed)?;

        let cose_value = ciborium::de::from_reader(reader)
            .map_err(|_| AuthDataParseError::MalformedCredentialData)?;
        let key = CoseKey::from_cbor_value(cose_value)
            .map_err(|_| AuthDataParseError::MalformedCredentialData)?;

        Ok(Self {
            aaguid: Aaguid(aaguid),
            credential_id,
            key,
        })
    }
}
