//! Caller-supplied parameters and their validation.

use log::warn;

use crate::{cli::Args, error::ValidationError};

/// Session duration used when the requested one falls outside what STS accepts (1 hour).
pub const DEFAULT_DURATION: i64 = 3600;

/// Shortest and longest session durations, in seconds, accepted for GetSessionToken.
pub const DURATION_RANGE: std::ops::RangeInclusive<i64> = 900..=86400;

const MIN_TOKEN_LEN: usize = 6;

/// Parameters for a single credential exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputArgs {
    pub profile: String,
    pub token: String,
    pub region: String,
    pub device_arn: String,
    pub duration: i64,
}

impl InputArgs {
    /// Checks the required fields and clamps the duration.
    ///
    /// A missing or short token and a missing device ARN are rejected. An out-of-range
    /// duration is not an error: it is replaced with [`DEFAULT_DURATION`] and a notice is
    /// logged.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if self.token.len() < MIN_TOKEN_LEN {
            return Err(ValidationError::InvalidToken);
        }
        if self.device_arn.is_empty() {
            return Err(ValidationError::MissingDeviceArn);
        }
        if !DURATION_RANGE.contains(&self.duration) {
            warn!(
                "Invalid duration {}; setting to default of 1hr",
                self.duration
            );
            self.duration = DEFAULT_DURATION;
        }
        Ok(self)
    }
}

impl From<Args> for InputArgs {
    fn from(args: Args) -> Self {
        Self {
            profile: args.profile,
            token: args.token.unwrap_or_default(),
            region: args.region,
            device_arn: args.device_arn.unwrap_or_default(),
            duration: args.duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> InputArgs {
        InputArgs {
            profile: "default".into(),
            token: "123456".into(),
            region: "us-east-1".into(),
            device_arn: "arn:aws:iam::123456789012:mfa/alice".into(),
            duration: 3600,
        }
    }

    #[test]
    fn valid_input_is_unchanged() {
        for duration in [900, 3600, 43200, 86400] {
            let args = InputArgs { duration, ..input() };
            assert_eq!(args.clone().validate(), Ok(args));
        }
    }

    #[test]
    fn missing_or_short_token_is_rejected() {
        for token in ["", "12345"] {
            let args = InputArgs { token: token.into(), ..input() };
            assert_eq!(args.validate(), Err(ValidationError::InvalidToken));
        }
    }

    #[test]
    fn missing_device_arn_is_rejected() {
        let args = InputArgs { device_arn: String::new(), ..input() };
        assert_eq!(args.validate(), Err(ValidationError::MissingDeviceArn));
    }

    #[test]
    fn token_is_checked_before_device_arn() {
        let args = InputArgs {
            token: "1".into(),
            device_arn: String::new(),
            ..input()
        };
        assert_eq!(args.validate(), Err(ValidationError::InvalidToken));
    }

    #[test]
    fn out_of_range_duration_falls_back_to_default() {
        for duration in [i64::MIN, -1, 0, 899, 86401, 129600, i64::MAX] {
            let args = InputArgs { duration, ..input() }.validate().unwrap();
            assert_eq!(args.duration, DEFAULT_DURATION);
            assert_eq!(args.token, "123456");
        }
    }
}
