use std::time::Duration;

use url::Url;

/// A configuration value from the environment did not parse.
#[derive(Debug, thiserror::Error)]
#[error("environment variable {name} does not parse: {message}")]
pub struct ConfigError {
    name: &'static str,
    message: String,
}

/// Configuration of one harness run, assembled once at startup and passed
/// down explicitly; leaf modules never read the environment themselves.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base URL of the wallet backend under test. Must end with `/`.
    pub backend_url: Url,

    /// The origin ceremonies run on, i.e. where the wallet frontend is
    /// served.
    pub origin: Url,

    /// The RP ID credentials are scoped to.
    pub rp_id: String,

    /// Default timeout for ceremony waiters.
    pub ceremony_timeout: Duration,

    /// Port of the mock OpenID4VCI issuer.
    pub issuer_port: u16,

    /// Port of the mock OpenID4VP verifier.
    pub verifier_port: u16,

    /// Port of the mock AuthZEN policy decision point.
    pub pdp_port: u16,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            // SAFETY: literal urls parse.
            backend_url: Url::parse("http://127.0.0.1:8080/").unwrap(),
            origin: Url::parse("http://localhost:5173").unwrap(),
            rp_id: "localhost".into(),
            ceremony_timeout: Duration::from_secs(10),
            issuer_port: 9280,
            verifier_port: 9281,
            pdp_port: 9282,
        }
    }
}

impl HarnessConfig {
    /// Build a configuration from the environment, with the defaults of
    /// [`HarnessConfig::default`] for anything unset.
    ///
    /// Recognized variables: `WALLET_BACKEND_URL`, `WALLET_ORIGIN`,
    /// `WALLET_RP_ID`, `WALLET_CEREMONY_TIMEOUT_MS`, `MOCK_ISSUER_PORT`,
    /// `MOCK_VERIFIER_PORT`, `MOCK_PDP_PORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            backend_url: env_url("WALLET_BACKEND_URL")?.unwrap_or(defaults.backend_url),
            origin: env_url("WALLET_ORIGIN")?.unwrap_or(defaults.origin),
            rp_id: std::env::var("WALLET_RP_ID").unwrap_or(defaults.rp_id),
            ceremony_timeout: env_parse::<u64>("WALLET_CEREMONY_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.ceremony_timeout),
            issuer_port: env_parse("MOCK_ISSUER_PORT")?.unwrap_or(defaults.issuer_port),
            verifier_port: env_parse("MOCK_VERIFIER_PORT")?.unwrap_or(defaults.verifier_port),
            pdp_port: env_parse("MOCK_PDP_PORT")?.unwrap_or(defaults.pdp_port),
        })
    }
}

fn env_url(name: &'static str) -> Result<Option<Url>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => Url::parse(&raw)
            .map(Some)
            .map_err(|err| ConfigError {
                name,
                message: err.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

fn env_parse<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.parse().map(Some).map_err(|err: T::Err| ConfigError {
            name,
            message: err.to_string(),
        }),
        Err(_) => Ok(None),
    }
}
