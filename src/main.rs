//! AWS MFA STS Credential Generator
//!
//! This program exchanges the long-term credentials of an AWS profile plus an MFA code for
//! temporary session credentials, and stores them in the AWS credentials file under a derived
//! `<profile>-sts` profile that other tools can select.
//!
//! The program performs the following operations:
//! 1. Parses command-line arguments
//! 2. Validates the MFA token and device ARN, clamping the session duration
//! 3. Requests a session token from AWS STS signed with the source profile
//! 4. Merges the session credentials into the existing credentials file
//! 5. Prints how to use the new profile

use std::process;

use anyhow::Result;
use clap::{CommandFactory, Parser};

mod cli;
mod credentials;
mod error;
mod input;
mod store;
mod workflow;

use cli::Args;
use credentials::StsTokenIssuer;
use error::ProvisionError;
use input::InputArgs;
use store::CredentialsFile;

/// Main entry point for the AWS MFA STS credential generator.
///
/// This function orchestrates the whole run:
/// 1. Initializes logging with INFO level filtering
/// 2. Parses and validates command-line arguments
/// 3. Builds an STS client for the source profile and region
/// 4. Generates the session and writes it to the credentials file
/// 5. Prints the derived profile and usage instructions
///
/// # Errors
/// Invalid input prints the problem and the usage text, then exits with status 1.
/// This function returns an error if:
/// * The credentials file location cannot be determined
/// * STS rejects the request or cannot be reached
/// * The credentials file cannot be loaded or saved
#[tokio::main]
async fn main() -> Result<()> {
    // Users can override the level with the RUST_LOG environment variable.
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let input = match InputArgs::from(Args::parse()).validate() {
        Ok(input) => input,
        Err(e) => {
            println!("{e}\n");
            // Nothing more to report if stdout is gone.
            let _ = Args::command().print_help();
            process::exit(1);
        }
    };

    let store = CredentialsFile::from_env().map_err(ProvisionError::Store)?;
    let issuer = StsTokenIssuer::new(&input.profile, &input.region).await;

    let provisioned = workflow::setup_user(&input, &issuer, &store).await?;
    println!("{provisioned}");

    Ok(())
}
