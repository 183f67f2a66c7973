use url::Url;

use crate::WebauthnError;

/// Checks that a requested RP ID agrees with the ceremony origin.
///
/// The harness pins its origins (the wallet frontend, or localhost during
/// development runs), so this keeps the registrable-domain walk out and
/// verifies the suffix relation plus the scheme rules directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct RpIdVerifier {
    allows_insecure_localhost: bool,
}

impl RpIdVerifier {
    /// A verifier with the production rules: https only, no localhost.
    pub fn new() -> Self {
        Self::default()
    }

    /// Let plain-http localhost origins through, which is how the harness
    /// talks to a dev-server frontend.
    pub fn allows_insecure_localhost(mut self, is_allowed: bool) -> Self {
        self.allows_insecure_localhost = is_allowed;
        self
    }

    /// Verify `rp_id` against the `origin` and return the effective domain.
    pub fn assert_domain<'a>(
        &self,
        origin: &'a Url,
        rp_id: Option<&'a str>,
    ) -> Result<&'a str, WebauthnError> {
        let mut effective_domain = origin.domain().ok_or(WebauthnError::OriginMissingDomain)?;

        if let Some(rp_id) = rp_id {
            let is_suffix = effective_domain == rp_id
                || effective_domain
                    .strip_suffix(rp_id)
                    .is_some_and(|prefix| prefix.ends_with('.'));
            if !is_suffix {
                return Err(WebauthnError::OriginRpMismatch);
            }
            effective_domain = rp_id;
        }

        if effective_domain == "localhost" {
            return if self.allows_insecure_localhost {
                Ok(effective_domain)
            } else {
                Err(WebauthnError::InsecureLocalhostNotAllowed)
            };
        }

        if !origin.scheme().eq_ignore_ascii_case("https") {
            return Err(WebauthnError::UnprotectedOrigin);
        }

        // A registrable domain has at least one dot.
        if !effective_domain.contains('.') {
            return Err(WebauthnError::InvalidRpId);
        }

        Ok(effective_domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("valid test url")
    }

    #[test]
    fn accepts_matching_and_parent_domains() {
        let verifier = RpIdVerifier::new();
        assert_eq!(
            verifier.assert_domain(&url("https://wallet.keyfold.dev"), Some("wallet.keyfold.dev")),
            Ok("wallet.keyfold.dev")
        );
        assert_eq!(
            verifier.assert_domain(&url("https://app.wallet.keyfold.dev"), Some("wallet.keyfold.dev")),
            Ok("wallet.keyfold.dev")
        );
    }

    #[test]
    fn rejects_lookalike_suffixes() {
        let verifier = RpIdVerifier::new();
        assert_eq!(
            verifier.assert_domain(&url("https://evilkeyfold.dev"), Some("keyfold.dev")),
            Err(WebauthnError::OriginRpMismatch)
        );
    }

    #[test]
    fn localhost_needs_the_explicit_allowance() {
        assert_eq!(
            RpIdVerifier::new().assert_domain(&url("http://localhost:5173"), None),
            Err(WebauthnError::InsecureLocalhostNotAllowed)
        );
        assert_eq!(
            RpIdVerifier::new()
                .allows_insecure_localhost(true)
                .assert_domain(&url("http://localhost:5173"), None),
            Ok("localhost")
        );
    }

    #[test]
    fn plain_http_is_rejected_elsewhere() {
        assert_eq!(
            RpIdVerifier::new().assert_domain(&url("http://wallet.keyfold.dev"), None),
            Err(WebauthnError::UnprotectedOrigin)
        );
    }
}
