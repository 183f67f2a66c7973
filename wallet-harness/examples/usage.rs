//! Minimal walkthrough of the harness pieces: bring up an authenticator
//! environment, run a registration and an authentication ceremony through
//! the interceptor, and inspect the recorded operations.

use wallet_harness::channel::VirtualAuthenticatorEnvironment;
use wallet_harness::client::{
    CeremonyInterceptor, CeremonyProvider, RpIdVerifier, VirtualCeremonyClient,
};
use wallet_harness::authenticator::AuthenticatorCapabilities;
use wallet_harness::types::{rand::random_vec, webauthn::*};

use url::Url;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut environment = VirtualAuthenticatorEnvironment::new();
    environment.initialize().await?;
    let device = environment
        .add_authenticator(AuthenticatorCapabilities::platform())
        .await?;

    let provider = CeremonyInterceptor::new(
        VirtualCeremonyClient::new(environment.ceremony_authenticator(device).await?)
            .with_rp_id_verifier(RpIdVerifier::new().allows_insecure_localhost(true)),
    );

    let origin = Url::parse("http://localhost:5173")?;
    let prf = AuthenticationExtensionsClientInputs {
        prf: Some(AuthenticationExtensionsPrfInputs {
            eval: Some(AuthenticationExtensionsPrfValues {
                first: b"vault-unlock".as_slice().into(),
                second: None,
            }),
            eval_by_credential: None,
        }),
    };

    let created = provider
        .create(
            &origin,
            CredentialCreationOptions {
                public_key: PublicKeyCredentialCreationOptions {
                    rp: PublicKeyCredentialRpEntity {
                        id: Some("localhost".into()),
                        name: "Keyfold Wallet".into(),
                    },
                    user: PublicKeyCredentialUserEntity {
                        id: random_vec(16).into(),
                        name: "maya@example.com".into(),
                        display_name: "Maya".into(),
                    },
                    challenge: random_vec(32).into(),
                    pub_key_cred_params: PublicKeyCredentialParameters::es256(),
                    timeout: None,
                    exclude_credentials: None,
                    authenticator_selection: Some(AuthenticatorSelectionCriteria {
                        resident_key: Some(ResidentKeyRequirement::Required),
                        require_resident_key: true,
                        user_verification: UserVerificationRequirement::Required,
                        authenticator_attachment: None,
                    }),
                    attestation: Default::default(),
                    extensions: Some(prf.clone()),
                },
            },
        )
        .await?;
    println!("registered credential {}", created.id);

    let asserted = provider
        .get(
            &origin,
            CredentialRequestOptions {
                public_key: PublicKeyCredentialRequestOptions {
                    challenge: random_vec(32).into(),
                    timeout: None,
                    rp_id: Some("localhost".into()),
                    allow_credentials: None,
                    user_verification: UserVerificationRequirement::Required,
                    extensions: Some(prf),
                },
            },
        )
        .await?;
    println!("authenticated as credential {}", asserted.id);

    for record in provider.operation_history() {
        println!(
            "{}: success={} prf={} in {:?}",
            record.kind,
            record.success,
            record.prf_attached,
            record.duration()
        );
    }

    environment.cleanup().await;
    Ok(())
}
