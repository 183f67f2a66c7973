use std::fmt;

/// The CTAP2 status codes the software authenticator can return.
///
/// Only the codes the wallet flows can actually trigger are modeled; the
/// numeric values match the specification so that assertions against
/// captured traffic stay meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ctap2Error {
    /// 0x12: a CBOR payload did not parse.
    InvalidCbor,
    /// 0x19: a credential from the exclude list already exists.
    CredentialExcluded,
    /// 0x22: the referenced credential is malformed or unusable.
    InvalidCredential,
    /// 0x26: none of the requested algorithms is supported.
    UnsupportedAlgorithm,
    /// 0x27: the user (or the harness acting as the user) declined.
    OperationDenied,
    /// 0x2B: an option was requested that this authenticator cannot honor.
    UnsupportedOption,
    /// 0x2C: an option combination is invalid for this request.
    InvalidOption,
    /// 0x2E: no matching credential was found.
    NoCredentials,
    /// 0x2F: the user did not interact in time.
    UserActionTimeout,
}

impl Ctap2Error {
    /// The specification's numeric value for this status.
    pub const fn code(self) -> u8 {
        match self {
            Self::InvalidCbor => 0x12,
            Self::CredentialExcluded => 0x19,
            Self::InvalidCredential => 0x22,
            Self::UnsupportedAlgorithm => 0x26,
            Self::OperationDenied => 0x27,
            Self::UnsupportedOption => 0x2B,
            Self::InvalidOption => 0x2C,
            Self::NoCredentials => 0x2E,
            Self::UserActionTimeout => 0x2F,
        }
    }
}

impl fmt::Display for Ctap2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidCbor => "CTAP2_ERR_INVALID_CBOR",
            Self::CredentialExcluded => "CTAP2_ERR_CREDENTIAL_EXCLUDED",
            Self::InvalidCredential => "CTAP2_ERR_INVALID_CREDENTIAL",
            Self::UnsupportedAlgorithm => "CTAP2_ERR_UNSUPPORTED_ALGORITHM",
            Self::OperationDenied => "CTAP2_ERR_OPERATION_DENIED",
            Self::UnsupportedOption => "CTAP2_ERR_UNSUPPORTED_OPTION",
            Self::InvalidOption => "CTAP2_ERR_INVALID_OPTION",
            Self::NoCredentials => "CTAP2_ERR_NO_CREDENTIALS",
            Self::UserActionTimeout => "CTAP2_ERR_USER_ACTION_TIMEOUT",
        };
        write!(f, "{name} (0x{:02x})", self.code())
    }
}

impl std::error::Error for Ctap2Error {}

impl From<Ctap2Error> for u8 {
    fn from(src: Ctap2Error) -> Self {
        src.code()
    }
}
