//! Fixtures shared by the end-to-end suites.

pub mod backend;

use harness_channel::{AuthenticatorId, VirtualAuthenticatorEnvironment};
use harness_client::{
    CeremonyInterceptor, HarnessConfig, RpIdVerifier, VirtualCeremonyClient,
};
use url::Url;

/// Everything one end-to-end scenario needs: a running backend stand-in,
/// an initialized authenticator environment, and the harness config
/// pointing at both.
pub struct Scenario {
    pub config: HarnessConfig,
    pub environment: VirtualAuthenticatorEnvironment,
    pub origin: Url,
}

impl Scenario {
    /// Boot the backend stand-in on an ephemeral port and initialize the
    /// authenticator environment.
    pub async fn start() -> Self {
        let port = backend::spawn().await;
        let config = HarnessConfig {
            backend_url: Url::parse(&format!("http://127.0.0.1:{port}/"))
                .expect("backend url parses"),
            ..HarnessConfig::default()
        };
        let origin = config.origin.clone();

        let mut environment = VirtualAuthenticatorEnvironment::new();
        environment
            .initialize()
            .await
            .expect("environment initializes");

        Self {
            config,
            environment,
            origin,
        }
    }

    /// An intercepted ceremony provider for one of the environment's
    /// authenticators, configured for the harness's localhost origin.
    pub async fn provider(
        &self,
        authenticator: AuthenticatorId,
    ) -> CeremonyInterceptor<VirtualCeremonyClient> {
        let shared = self
            .environment
            .ceremony_authenticator(authenticator)
            .await
            .expect("authenticator exists");
        CeremonyInterceptor::new(
            VirtualCeremonyClient::new(shared)
                .with_rp_id_verifier(RpIdVerifier::new().allows_insecure_localhost(true)),
        )
    }
}
