use harness_types::ctap2::get_info;

use crate::{Authenticator, CredentialStore, UserValidationMethod};

impl<S, U> Authenticator<S, U>
where
    S: CredentialStore + Send + Sync,
    U: UserValidationMethod + Send + Sync,
{
    /// Report this device's capabilities; the ceremony layer gates its
    /// extension processing on this.
    pub fn get_info(&self) -> get_info::Response {
        let capabilities = self.capabilities();
        get_info::Response {
            versions: vec![capabilities.get_info_version()],
            extensions: capabilities
                .supports_prf
                .then(|| vec![get_info::Extension::HmacSecret, get_info::Extension::Prf]),
            aaguid: *self.aaguid(),
            options: get_info::Options {
                rk: capabilities.has_resident_key,
                up: true,
                uv: self.user_validation().is_verification_enabled(),
            },
            transports: Some(self.transports()),
        }
    }
}
