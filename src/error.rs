//! Error taxonomy and its operator-facing rendering.
//!
//! Three channels are kept apart so an operator can tell a rejected MFA code from a
//! broken credentials file:
//! - [`IssuanceError`]: STS refused or failed to produce a session. A disabled region is
//!   rendered with its error code, other service errors with their message only, and
//!   transport failures with the raw SDK error text.
//! - [`StoreError`]: the credentials file could not be loaded or saved.
//! - [`ValidationError`]: caller input was malformed.
//!
//! [`ProvisionError`] wraps the first two with a fixed prefix and keeps the classified
//! cause in its `source()` chain, which `anyhow` prints as `Caused by:` in `main`.

use std::{fmt, io, path::PathBuf};

use aws_sdk_sts::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::get_session_token::GetSessionTokenError,
};
use thiserror::Error;

/// Error code STS returns when GetSessionToken is disabled in the requested region.
pub const REGION_DISABLED_CODE: &str = "RegionDisabledException";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Token required and must be at least 6 digits")]
    InvalidToken,
    #[error("MFA Device ARN required. Please go to your IAM user and copy.")]
    MissingDeviceArn,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IssuanceError {
    #[error("RegionDisabledException: {0}")]
    RegionDisabled(String),
    #[error("{message}")]
    Service { code: String, message: String },
    #[error("{0}")]
    Transport(String),
}

impl IssuanceError {
    /// Machine-readable code reported by STS, if the failure came from the service.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::RegionDisabled(_) => Some(REGION_DISABLED_CODE),
            Self::Service { code, .. } => Some(code),
            Self::Transport(_) => None,
        }
    }

    fn from_service(err: GetSessionTokenError) -> Self {
        match err {
            GetSessionTokenError::RegionDisabledException(inner) => {
                Self::RegionDisabled(inner.message().unwrap_or_default().to_owned())
            }
            other => Self::Service {
                code: other.code().unwrap_or("Unknown").to_owned(),
                message: other
                    .message()
                    .map(str::to_owned)
                    .unwrap_or_else(|| other.to_string()),
            },
        }
    }
}

impl<R> From<SdkError<GetSessionTokenError, R>> for IssuanceError
where
    R: fmt::Debug + Send + Sync + 'static,
{
    fn from(err: SdkError<GetSessionTokenError, R>) -> Self {
        match err {
            SdkError::ServiceError(context) => Self::from_service(context.into_err()),
            other => Self::Transport(DisplayErrorContext(&other).to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not determine home directory")]
    NoHomeDir,
    #[error("Credentials file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read {}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("Credentials file {} contains no profiles", .0.display())]
    Empty(PathBuf),
    #[error("Failed to write {}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Unable to generate a token with provided credentials")]
    Issuance(#[source] IssuanceError),
    #[error("Failed to update credentials store")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use aws_sdk_sts::{
        config::http::HttpResponse, error::ErrorMetadata, types::error::RegionDisabledException,
    };

    use super::*;

    #[test]
    fn region_disabled_is_reported_with_its_code() {
        let err = GetSessionTokenError::RegionDisabledException(
            RegionDisabledException::builder()
                .message("STS is not activated in this region")
                .build(),
        );

        let issuance = IssuanceError::from_service(err);

        assert_eq!(
            issuance,
            IssuanceError::RegionDisabled("STS is not activated in this region".into())
        );
        assert_eq!(
            issuance.to_string(),
            "RegionDisabledException: STS is not activated in this region"
        );
        assert_eq!(issuance.code(), Some(REGION_DISABLED_CODE));
    }

    #[test]
    fn other_service_errors_are_reported_by_message_only() {
        let err = GetSessionTokenError::generic(
            ErrorMetadata::builder()
                .code("AccessDenied")
                .message("MultiFactorAuthentication failed with invalid MFA one time pass code.")
                .build(),
        );

        let issuance = IssuanceError::from_service(err);

        assert_eq!(issuance.code(), Some("AccessDenied"));
        assert_eq!(
            issuance.to_string(),
            "MultiFactorAuthentication failed with invalid MFA one time pass code."
        );
    }

    #[test]
    fn non_service_failures_are_transport_errors() {
        let err: SdkError<GetSessionTokenError, HttpResponse> =
            SdkError::timeout_error("deadline elapsed");

        let issuance = IssuanceError::from(err);

        assert!(matches!(issuance, IssuanceError::Transport(_)));
        assert_eq!(issuance.code(), None);
    }

    #[test]
    fn provision_errors_keep_the_classified_cause() {
        let err = ProvisionError::Issuance(IssuanceError::RegionDisabled("disabled".into()));
        assert_eq!(
            err.to_string(),
            "Unable to generate a token with provided credentials"
        );
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("RegionDisabledException: disabled")
        );

        let err = ProvisionError::from(StoreError::NotFound("/nowhere/credentials".into()));
        assert_eq!(err.to_string(), "Failed to update credentials store");
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("Credentials file not found: /nowhere/credentials")
        );
    }

    #[test]
    fn unresolved_home_directory_is_a_store_error() {
        let err = ProvisionError::Store(StoreError::NoHomeDir);
        assert_eq!(err.to_string(), "Failed to update credentials store");
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("Could not determine home directory")
        );
    }
}
