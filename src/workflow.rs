//! MFA Session Provisioning
//!
//! This module implements the credential exchange: an MFA code is traded for temporary
//! session credentials, which are then merged into the AWS credentials file under a profile
//! derived from the source profile name.
//!
//! ## Derived Profile
//!
//! The long-term credentials stay where they are. The session credentials are written next to
//! them under `<profile>-sts`:
//!
//! ```ini
//! [default]
//! aws_access_key_id=AKIA...           # Long-term IAM user key, used to sign the STS call
//! aws_secret_access_key=...
//!
//! [default-sts]
//! aws_access_key_id=ASIA...           # Temporary access key
//! aws_secret_access_key=...           # Temporary secret key
//! aws_session_token=...               # Session token
//! expiration=2023-12-01T12:00:00Z     # When the credentials expire
//! ```
//!
//! Re-running overwrites the same four keys in the same section. Every other section and key
//! is written back as it was loaded.

use std::{fmt, path::PathBuf};

use aws_smithy_types::date_time::Format;
use log::{debug, info};

use crate::{
    credentials::{SessionCredential, TokenIssuer},
    error::ProvisionError,
    input::InputArgs,
    store::{CredentialStore, CredentialsDocument},
};

/// Suffix appended to the source profile to name the session profile.
pub const STS_PROFILE_SUFFIX: &str = "-sts";

/// Name of the profile the session credentials for `profile` are written to.
pub fn sts_profile(profile: &str) -> String {
    format!("{profile}{STS_PROFILE_SUFFIX}")
}

/// Outcome of a successful [`setup_user`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    /// Derived profile holding the session credentials.
    pub profile: String,
    /// Credentials file that was written.
    pub path: PathBuf,
    /// Expiration of the session credentials in ISO 8601 format.
    pub expiration: String,
}

impl fmt::Display for Provisioned {
    /// Usage instructions for the operator: the profile flag for the AWS CLI and the
    /// equivalent environment variables.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            profile,
            path,
            expiration,
        } = self;
        writeln!(f, "Adding credentials for {profile} to {}", path.display())?;
        writeln!(f, "Credentials expire at: {expiration}")?;
        writeln!(f, "Use with the awscli by passing --profile={profile}")?;
        writeln!(f)?;
        writeln!(f, "or set up your environment with")?;
        writeln!(f)?;
        writeln!(f, "export AWS_DEFAULT_PROFILE={profile}")?;
        write!(f, "export AWS_PROFILE={profile}")
    }
}

/// Generates an STS session for `input` and stores it under the derived profile.
///
/// This function performs the complete exchange:
/// 1. Requests session credentials from `issuer` with the device ARN, MFA code and duration
/// 2. Derives the target profile name with [`sts_profile`]
/// 3. Loads the credentials document from `store`
/// 4. Sets `aws_access_key_id`, `aws_secret_access_key`, `aws_session_token` and `expiration`
///    in the derived section
/// 5. Saves the document back through `store`
///
/// # Arguments
///
/// * `input` - Validated parameters (see [`InputArgs::validate`])
/// * `issuer` - Performs the GetSessionToken exchange
/// * `store` - Holds the credentials document
///
/// # Returns
///
/// * `Ok(Provisioned)` - The derived profile, the file written and the expiration
/// * `Err(ProvisionError::Issuance)` - The issuer failed; the store has not been touched
/// * `Err(ProvisionError::Store)` - The document could not be loaded or saved
///
/// # Credential File Requirements
///
/// The credentials file must already exist and contain at least one profile. A missing or
/// empty file is reported as a store error rather than created from scratch.
pub async fn setup_user<I, S>(
    input: &InputArgs,
    issuer: &I,
    store: &S,
) -> Result<Provisioned, ProvisionError>
where
    I: TokenIssuer,
    S: CredentialStore,
{
    info!("Generating STS Token for {} profile", input.profile);
    info!("Fetching credentials - Duration: {}s", input.duration);

    let session = issuer
        .issue(&input.device_arn, &input.token, input.duration)
        .await
        .map_err(|err| {
            debug!("GetSessionToken failed with code {:?}", err.code());
            ProvisionError::Issuance(err)
        })?;

    let profile = sts_profile(&input.profile);
    let mut document = store.load()?;
    let expiration = write_session(&mut document, &profile, &session);
    store.save(&document)?;

    info!("Success! Credentials for {profile} expire at: {expiration}");

    Ok(Provisioned {
        profile,
        path: store.path().to_path_buf(),
        expiration,
    })
}

/// Writes the session fields into `section` and returns the formatted expiration.
fn write_session(
    document: &mut CredentialsDocument,
    section: &str,
    session: &SessionCredential,
) -> String {
    let expiration = session
        .expiration
        .fmt(Format::DateTime)
        .unwrap_or_else(|_| "unknown".to_string());

    document.set(section, "aws_access_key_id", &session.access_key_id);
    document.set(section, "aws_secret_access_key", &session.secret_access_key);
    document.set(section, "aws_session_token", &session.session_token);
    document.set(section, "expiration", &expiration);

    expiration
}
