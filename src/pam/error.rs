use std::ffi::{c_int, NulError};
use std::fmt;

use super::sys::*;

pub type PamResult<T, E = PamError> = Result<T, E>;

/// A PAM result code. Codes this list does not know are kept as they are.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum PamErrorType {
    /// There was no error running the PAM command
    Success,
    OpenError,
    SymbolError,
    ServiceError,
    SystemError,
    BufferError,
    /// The account phase refused access; what an HBAC denial looks like.
    PermissionDenied,
    AuthError,
    CredentialsInsufficient,
    /// PAM modules were unable to access the authentication information (for
    /// example due to a network error).
    AuthInfoUnavailable,
    /// The specified user is unknown to an authentication service.
    UserUnknown,
    MaxTries,
    NewAuthTokenRequired,
    /// The user account is expired and can no longer be used.
    AccountExpired,
    SessionError,
    CredentialsUnavailable,
    CredentialsExpired,
    CredentialsError,
    NoModuleData,
    ConversationError,
    AuthTokenError,
    AuthTokenRecoveryError,
    AuthTokenLockBusy,
    AuthTokenDisableAging,
    TryAgain,
    Ignore,
    Abort,
    AuthTokenExpired,
    ModuleUnknown,
    BadItem,
    UnknownErrorType(i32),
}

impl PamErrorType {
    pub fn from_int(errno: c_int) -> PamErrorType {
        use PamErrorType::*;

        match errno {
            PAM_SUCCESS => Success,
            PAM_OPEN_ERR => OpenError,
            PAM_SYMBOL_ERR => SymbolError,
            PAM_SERVICE_ERR => ServiceError,
            PAM_SYSTEM_ERR => SystemError,
            PAM_BUF_ERR => BufferError,
            PAM_PERM_DENIED => PermissionDenied,
            PAM_AUTH_ERR => AuthError,
            PAM_CRED_INSUFFICIENT => CredentialsInsufficient,
            PAM_AUTHINFO_UNAVAIL => AuthInfoUnavailable,
            PAM_USER_UNKNOWN => UserUnknown,
            PAM_MAXTRIES => MaxTries,
            PAM_NEW_AUTHTOK_REQD => NewAuthTokenRequired,
            PAM_ACCT_EXPIRED => AccountExpired,
            PAM_SESSION_ERR => SessionError,
            PAM_CRED_UNAVAIL => CredentialsUnavailable,
            PAM_CRED_EXPIRED => CredentialsExpired,
            PAM_CRED_ERR => CredentialsError,
            PAM_NO_MODULE_DATA => NoModuleData,
            PAM_CONV_ERR => ConversationError,
            PAM_AUTHTOK_ERR => AuthTokenError,
            PAM_AUTHTOK_RECOVERY_ERR => AuthTokenRecoveryError,
            PAM_AUTHTOK_LOCK_BUSY => AuthTokenLockBusy,
            PAM_AUTHTOK_DISABLE_AGING => AuthTokenDisableAging,
            PAM_TRY_AGAIN => TryAgain,
            PAM_IGNORE => Ignore,
            PAM_ABORT => Abort,
            PAM_AUTHTOK_EXPIRED => AuthTokenExpired,
            PAM_MODULE_UNKNOWN => ModuleUnknown,
            PAM_BAD_ITEM => BadItem,
            _ => UnknownErrorType(errno),
        }
    }

    pub fn as_int(&self) -> c_int {
        use PamErrorType::*;

        match self {
            Success => PAM_SUCCESS,
            OpenError => PAM_OPEN_ERR,
            SymbolError => PAM_SYMBOL_ERR,
            ServiceError => PAM_SERVICE_ERR,
            SystemError => PAM_SYSTEM_ERR,
            BufferError => PAM_BUF_ERR,
            PermissionDenied => PAM_PERM_DENIED,
            AuthError => PAM_AUTH_ERR,
            CredentialsInsufficient => PAM_CRED_INSUFFICIENT,
            AuthInfoUnavailable => PAM_AUTHINFO_UNAVAIL,
            UserUnknown => PAM_USER_UNKNOWN,
            MaxTries => PAM_MAXTRIES,
            NewAuthTokenRequired => PAM_NEW_AUTHTOK_REQD,
            AccountExpired => PAM_ACCT_EXPIRED,
            SessionError => PAM_SESSION_ERR,
            CredentialsUnavailable => PAM_CRED_UNAVAIL,
            CredentialsExpired => PAM_CRED_EXPIRED,
            CredentialsError => PAM_CRED_ERR,
            NoModuleData => PAM_NO_MODULE_DATA,
            ConversationError => PAM_CONV_ERR,
            AuthTokenError => PAM_AUTHTOK_ERR,
            AuthTokenRecoveryError => PAM_AUTHTOK_RECOVERY_ERR,
            AuthTokenLockBusy => PAM_AUTHTOK_LOCK_BUSY,
            AuthTokenDisableAging => PAM_AUTHTOK_DISABLE_AGING,
            TryAgain => PAM_TRY_AGAIN,
            Ignore => PAM_IGNORE,
            Abort => PAM_ABORT,
            AuthTokenExpired => PAM_AUTHTOK_EXPIRED,
            ModuleUnknown => PAM_MODULE_UNKNOWN,
            BadItem => PAM_BAD_ITEM,
            UnknownErrorType(e) => *e,
        }
    }

    fn describe(&self) -> &'static str {
        use PamErrorType::*;

        match self {
            Success => "Success",
            OpenError => "Failed to load module",
            SymbolError => "Symbol not found",
            ServiceError => "Error in service module",
            SystemError => "System error",
            BufferError => "Memory buffer error",
            PermissionDenied => "Permission denied",
            AuthError => "Authentication failure",
            CredentialsInsufficient => "Insufficient credentials to access authentication data",
            AuthInfoUnavailable => "Authentication service cannot retrieve authentication info",
            UserUnknown => "User not known to the underlying authentication module",
            MaxTries => "Have exhausted maximum number of retries for service",
            NewAuthTokenRequired => "Authentication token is no longer valid; new one required",
            AccountExpired => "User account has expired",
            SessionError => "Cannot make/remove an entry for the specified session",
            CredentialsUnavailable => "Authentication service cannot retrieve user credentials",
            CredentialsExpired => "User credentials expired",
            CredentialsError => "Failure setting user credentials",
            NoModuleData => "No module specific data is present",
            ConversationError => "Conversation error",
            AuthTokenError => "Authentication token manipulation error",
            AuthTokenRecoveryError => "Authentication information cannot be recovered",
            AuthTokenLockBusy => "Authentication token lock busy",
            AuthTokenDisableAging => "Authentication token aging disabled",
            TryAgain => "Failed preliminary check by password service",
            Ignore => "The return value should be ignored by PAM dispatch",
            Abort => "Critical error - immediate abort",
            AuthTokenExpired => "Authentication token expired",
            ModuleUnknown => "Module is unknown",
            BadItem => "Bad item passed to pam_*_item()",
            UnknownErrorType(_) => "Unknown PAM error",
        }
    }
}

impl fmt::Display for PamErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.describe(), self.as_int())
    }
}

/// The account check could not produce a result code at all.
#[derive(Debug)]
pub enum PamError {
    UnexpectedNulByte(NulError),
    /// Starting the PAM transaction failed.
    Pam(PamErrorType),
    IoError(std::io::Error),
    /// The invocation shim died without an exit code.
    Terminated(String),
}

impl From<std::io::Error> for PamError {
    fn from(err: std::io::Error) -> Self {
        PamError::IoError(err)
    }
}

impl From<NulError> for PamError {
    fn from(err: NulError) -> Self {
        PamError::UnexpectedNulByte(err)
    }
}

impl fmt::Display for PamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PamError::UnexpectedNulByte(_) => write!(f, "Unexpected nul byte in input"),
            PamError::Pam(tp) => write!(f, "PAM error: {tp}"),
            PamError::IoError(e) => write!(f, "IO error: {e}"),
            PamError::Terminated(how) => write!(f, "account check terminated: {how}"),
        }
    }
}

impl std::error::Error for PamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PamError::UnexpectedNulByte(e) => Some(e),
            PamError::IoError(e) => Some(e),
            PamError::Pam(_) | PamError::Terminated(_) => None,
        }
    }
}

impl PamError {
    /// Create a new PamError based on the error number from pam.
    pub fn from_pam(errno: c_int) -> PamError {
        PamError::Pam(PamErrorType::from_int(errno))
    }
}
