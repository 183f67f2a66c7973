//! # Harness Authenticator
//!
//! A software CTAP2 authenticator for driving the wallet's WebAuthn flows
//! without hardware. Storage and user interaction are trait plug points so
//! tests can swap in maps, mocks or toggleable user-verification state,
//! while the ceremony processing itself stays specification shaped.

mod authenticator;
mod capabilities;
mod credential_store;
mod user_validation;

use coset::{
    CoseKey, CoseKeyBuilder,
    iana::{self, EnumI64},
};
use harness_types::{Bytes, ctap2::Ctap2Error};
use p256::{
    EncodedPoint, PublicKey, SecretKey,
    ecdsa::SigningKey,
    elliptic_curve::{generic_array::GenericArray, sec1::FromEncodedPoint},
    pkcs8::EncodePublicKey,
};

pub use self::{
    authenticator::Authenticator,
    capabilities::{AuthenticatorCapabilities, CtapVersion},
    credential_store::{CredentialStore, MemoryStore},
    user_validation::{ToggleUserValidation, UiHint, UserCheck, UserValidationMethod},
};

#[cfg(any(test, feature = "testable"))]
pub use self::user_validation::MockUserValidationMethod;

/// Extract the signing key from a COSE private key.
fn private_key_from_cose_key(key: &CoseKey) -> Result<SecretKey, Ctap2Error> {
    if !matches!(
        key.alg,
        Some(coset::RegisteredLabelWithPrivate::Assigned(
            iana::Algorithm::ES256
        ))
    ) {
        return Err(Ctap2Error::UnsupportedAlgorithm);
    }

    key.params
        .iter()
        .find_map(|(label, value)| {
            if let coset::Label::Int(i) = label {
                iana::Ec2KeyParameter::from_i64(*i)
                    .filter(|p| p == &iana::Ec2KeyParameter::D)
                    .and_then(|_| value.as_bytes())
                    .and_then(|b| SecretKey::from_slice(b).ok())
            } else {
                None
            }
        })
        .ok_or(Ctap2Error::InvalidCredential)
}

/// Convert a COSE public key to an X.509 SubjectPublicKeyInfo byte array,
/// the form exposed through the credential response's easy accessors.
pub fn public_key_der_from_cose_key(key: &CoseKey) -> Result<Bytes, Ctap2Error> {
    let (mut x, mut y) = (None, None);
    for (label, value) in &key.params {
        if let coset::Label::Int(i) = label {
            match iana::Ec2KeyParameter::from_i64(*i) {
                Some(iana::Ec2KeyParameter::X) => x = value.as_bytes(),
                Some(iana::Ec2KeyParameter::Y) => y = value.as_bytes(),
                _ => (),
            }
        }
    }
    let (Some(x), Some(y)) = (x, y) else {
        return Err(Ctap2Error::InvalidCredential);
    };

    let point = EncodedPoint::from_affine_coordinates(
        GenericArray::from_slice(x.as_slice()),
        GenericArray::from_slice(y.as_slice()),
        false,
    );
    let Some(pub_key): Option<PublicKey> = PublicKey::from_encoded_point(&point).into() else {
        return Err(Ctap2Error::InvalidCredential);
    };
    pub_key
        .to_public_key_der()
        .map_err(|_| Ctap2Error::InvalidCredential)
        .map(|der| der.as_ref().to_vec().into())
}

pub(crate) struct CoseKeyPair {
    public: CoseKey,
    private: CoseKey,
}

impl CoseKeyPair {
    fn from_secret_key(private_key: &SecretKey, algorithm: iana::Algorithm) -> Self {
        let public_point = SigningKey::from(private_key)
            .verifying_key()
            .to_encoded_point(false);
        // SAFETY: the point is uncompressed, so both coordinates are present.
        let x = public_point.x().unwrap().as_slice().to_vec();
        let y = public_point.y().unwrap().as_slice().to_vec();

        let private = CoseKeyBuilder::new_ec2_priv_key(
            iana::EllipticCurve::P_256,
            x.clone(),
            y.clone(),
            private_key.to_bytes().to_vec(),
        )
        .algorithm(algorithm)
        .build();
        let public = CoseKeyBuilder::new_ec2_pub_key(iana::EllipticCurve::P_256, x, y)
            .algorithm(algorithm)
            .build();

        Self { public, private }
    }
}

#[cfg(test)]
mod tests {
    use p256::{
        SecretKey,
        ecdsa::{
            SigningKey,
            signature::{Signer, Verifier},
        },
    };
    use harness_types::rand::random_vec;

    use super::{CoseKeyPair, private_key_from_cose_key};

    #[test]
    fn private_key_cose_round_trip() {
        let secret = SecretKey::random(&mut rand::thread_rng());
        let CoseKeyPair { private, .. } =
            CoseKeyPair::from_secret_key(&secret, coset::iana::Algorithm::ES256);

        let verifying = *SigningKey::from(&secret).verifying_key();

        let recovered = private_key_from_cose_key(&private).expect("could not recover the key");
        let signer = SigningKey::from(recovered);

        let message = random_vec(64);
        let signature: p256::ecdsa::Signature = signer.sign(&message);
        verifying
            .verify(&message, &signature)
            .expect("signature from recovered key should verify");
    }
}
