use aws_config::Region;
use aws_sdk_sts::Client;
use aws_smithy_types::DateTime;

use crate::error::IssuanceError;

/// Temporary credentials returned by GetSessionToken.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCredential {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime,
}

/// Exchanges an MFA device serial and code for a session credential.
pub trait TokenIssuer {
    async fn issue(
        &self,
        device_serial: &str,
        code: &str,
        duration_seconds: i64,
    ) -> Result<SessionCredential, IssuanceError>;
}

/// [`TokenIssuer`] backed by AWS STS, signing with the long-term credentials of a profile.
pub struct StsTokenIssuer {
    client: Client,
}

impl StsTokenIssuer {
    pub async fn new(profile: &str, region: &str) -> Self {
        let config = aws_config::from_env()
            .profile_name(profile)
            .region(Region::new(region.to_owned()))
            .load()
            .await;

        Self {
            client: Client::new(&config),
        }
    }
}

impl TokenIssuer for StsTokenIssuer {
    async fn issue(
        &self,
        device_serial: &str,
        code: &str,
        duration_seconds: i64,
    ) -> Result<SessionCredential, IssuanceError> {
        let duration = i32::try_from(duration_seconds).map_err(|_| IssuanceError::Service {
            code: "ValidationError".into(),
            message: format!("Duration {duration_seconds}s is out of range"),
        })?;

        let output = self
            .client
            .get_session_token()
            .duration_seconds(duration)
            .serial_number(device_serial)
            .token_code(code)
            .send()
            .await?;

        let credentials = output.credentials().ok_or_else(|| IssuanceError::Service {
            code: "MissingCredentials".into(),
            message: "No credentials returned".into(),
        })?;

        Ok(SessionCredential {
            access_key_id: credentials.access_key_id().to_owned(),
            secret_access_key: credentials.secret_access_key().to_owned(),
            session_token: credentials.session_token().to_owned(),
            expiration: *credentials.expiration(),
        })
    }
}
