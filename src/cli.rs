//! Command-line interface definitions.

use clap::Parser;

/// AWS MFA session credential generator.
///
/// Exchanges the long-term credentials of `--profile` plus an MFA code for temporary
/// session credentials, and writes them to the `[<profile>-sts]` profile of the AWS
/// credentials file.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Profile holding the long-term credentials
    #[arg(long, default_value = "default")]
    pub profile: String,

    /// MFA token code
    #[arg(long)]
    pub token: Option<String>,

    /// AWS region
    #[arg(long, default_value = "us-east-1")]
    pub region: String,

    /// MFA device ARN (serial number)
    #[arg(long)]
    pub device_arn: Option<String>,

    /// Session duration in seconds (900-86400)
    #[arg(
        long,
        env = "AWS_SESSION_DURATION",
        default_value = "3600",
        allow_negative_numbers = true
    )]
    pub duration: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_single_default_profile() {
        let args = Args::try_parse_from(["aws-mfa-sts"]).unwrap();
        assert_eq!(args.profile, "default");
        assert_eq!(args.region, "us-east-1");
        assert_eq!(args.token, None);
        assert_eq!(args.device_arn, None);
    }

    #[test]
    fn parses_all_flags() {
        let args = Args::try_parse_from([
            "aws-mfa-sts",
            "--profile",
            "work",
            "--token",
            "123456",
            "--region",
            "eu-west-1",
            "--device-arn",
            "arn:aws:iam::123456789012:mfa/alice",
            "--duration",
            "7200",
        ])
        .unwrap();
        assert_eq!(args.profile, "work");
        assert_eq!(args.token.as_deref(), Some("123456"));
        assert_eq!(args.region, "eu-west-1");
        assert_eq!(
            args.device_arn.as_deref(),
            Some("arn:aws:iam::123456789012:mfa/alice")
        );
        assert_eq!(args.duration, 7200);
    }

    #[test]
    fn command_is_well_formed() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
