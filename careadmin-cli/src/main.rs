//! CareAdmin operator console
//!
//! Credentials for `login` and `change-password` are read from the
//! environment so they never land in shell history.

use anyhow::{Context, Result, bail};
use careadmin_core::api::{
    AppointmentStatus, ChannelRedirect, LabOrderStatus, RedirectReason, VerificationStatus,
};
use careadmin_core::auth::{CognitoClient, FileSessionStore, SessionManager};
use careadmin_core::config::{self, AppConfig};
use careadmin_core::{AdminApiClient, ApiResponse};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

const ENV_EMAIL: &str = "CAREADMIN_EMAIL";
const ENV_PASSWORD: &str = "CAREADMIN_PASSWORD";
const ENV_NEW_PASSWORD: &str = "CAREADMIN_NEW_PASSWORD";

// ============================================================================
// CLI
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "careadmin", version)]
#[command(about = "CareAdmin console - provider verification, appointments and lab orders")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with CAREADMIN_EMAIL / CAREADMIN_PASSWORD
    Login,
    /// Replace a temporary password (CAREADMIN_EMAIL, CAREADMIN_PASSWORD, CAREADMIN_NEW_PASSWORD)
    ChangePassword,
    /// Clear the stored session
    Logout,
    /// Show the signed-in identity
    Whoami,

    /// Providers awaiting verification
    PendingProviders,
    /// All providers, optionally filtered by verification status
    Providers { status: Option<VerificationStatus> },
    /// Provider details with documents and user profile
    Provider { id: String },
    /// Approve a provider
    Verify { id: String },
    /// Reject a provider
    Reject {
        id: String,
        reason: String,
        details: Option<String>,
    },

    /// List appointments, optionally filtered by status
    Appointments { status: Option<AppointmentStatus> },
    /// Show one appointment
    Appointment { id: String },
    /// Set an appointment's status
    UpdateAppointment {
        id: String,
        status: AppointmentStatus,
        notes: Option<String>,
    },
    /// Assign a provider to an appointment
    Assign {
        appointment_id: String,
        provider_id: String,
    },

    /// List lab orders, optionally filtered by status
    LabOrders { status: Option<LabOrderStatus> },
    /// Show one lab order
    LabOrder { id: String },
    /// Set a lab order's status
    UpdateLabOrder {
        id: String,
        status: LabOrderStatus,
        notes: Option<String>,
    },

    /// Dashboard counters
    Stats,
}

fn init_logging() {
    let log_level = std::env::var("RUST_LOG")
        .map(|_| log::LevelFilter::Debug)
        .unwrap_or(log::LevelFilter::Warn);

    let log_dir = std::env::var(config::ENV_DATA_DIR)
        .map(PathBuf::from)
        .ok()
        .or_else(|| config::default_data_dir().ok());

    let log_file = log_dir.and_then(|dir| {
        std::fs::create_dir_all(&dir).ok()?;
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("careadmin.log"))
            .ok()
    });

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(log_level).format_timestamp_millis();
    // Stdout carries JSON output, so logs go to a file or stderr
    match log_file {
        Some(file) => builder.target(env_logger::Target::Pipe(Box::new(file))),
        None => builder.target(env_logger::Target::Stderr),
    };
    builder.init();
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{} is not set", key))
}

/// Warn when a status is outside the known vocabulary; the server has the final say
fn check_status<S: PartialEq + Display>(status: &S, known: &[S]) {
    if !known.contains(status) {
        let known: Vec<String> = known.iter().map(ToString::to_string).collect();
        warn!("Unknown status '{}'", status);
        eprintln!(
            "warning: '{}' is not a known status (known: {})",
            status,
            known.join(", ")
        );
    }
}

/// Print the envelope as JSON; a failed call makes the process exit non-zero
fn print_response<T: Serialize>(response: ApiResponse<T>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&response)?);
    if let Some(err) = response.error_message() {
        bail!("{}", err);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();
    info!("Starting CareAdmin CLI v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let provider = CognitoClient::new(&config.cognito)?;
    let store = FileSessionStore::new(&config.data_dir)?;
    let session = Arc::new(SessionManager::new(Box::new(provider), Box::new(store)));

    let (redirect, mut redirects) = ChannelRedirect::new();
    let api = AdminApiClient::new(&config.api, session.clone(), Arc::new(redirect))?;

    let result = run(cli.command, &session, &api).await;

    // Drain redirect requests raised during the call
    while let Ok(reason) = redirects.try_recv() {
        match reason {
            RedirectReason::NotAuthenticated => {
                warn!("Login required");
                eprintln!("Not signed in. Run `careadmin login` first.");
            }
            RedirectReason::SessionExpired => {
                warn!("Session expired");
                eprintln!("Session expired. Run `careadmin login` again.");
            }
        }
    }

    if let Err(e) = &result {
        error!("Command failed: {}", e);
    }
    result
}

async fn run(command: Command, session: &SessionManager, api: &AdminApiClient) -> Result<()> {
    match command {
        Command::Login => {
            let email = required_env(ENV_EMAIL)?;
            let password = required_env(ENV_PASSWORD)?;
            let identity = session.sign_in(&email, &password).await?;
            println!("{}", serde_json::to_string_pretty(&identity)?);
            Ok(())
        }
        Command::ChangePassword => {
            let email = required_env(ENV_EMAIL)?;
            let password = required_env(ENV_PASSWORD)?;
            let new_password = required_env(ENV_NEW_PASSWORD)?;
            session
                .complete_password_change(&email, &password, &new_password)
                .await?;
            println!("Password changed. Sign in with the new password.");
            Ok(())
        }
        Command::Logout => {
            session.sign_out();
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => match session.current_identity().await? {
            Some(identity) => {
                println!("{}", serde_json::to_string_pretty(&identity)?);
                Ok(())
            }
            None => bail!("Not authenticated"),
        },

        Command::PendingProviders => print_response(api.list_pending_providers().await),
        Command::Providers { status } => {
            if let Some(status) = &status {
                check_status(status, VerificationStatus::ALL);
            }
            print_response(api.list_providers(status.as_ref()).await)
        }
        Command::Provider { id } => print_response(api.get_provider_details(&id).await),
        Command::Verify { id } => print_response(api.verify_provider(&id).await),
        Command::Reject {
            id,
            reason,
            details,
        } => print_response(
            api.reject_provider(&id, &reason, details.as_deref())
                .await,
        ),

        Command::Appointments { status } => {
            if let Some(status) = &status {
                check_status(status, AppointmentStatus::ALL);
            }
            print_response(api.list_appointments(status.as_ref()).await)
        }
        Command::Appointment { id } => print_response(api.find_appointment(&id).await),
        Command::UpdateAppointment { id, status, notes } => {
            check_status(&status, AppointmentStatus::ALL);
            print_response(
                api.update_appointment_status(&id, &status, notes.as_deref())
                    .await,
            )
        }
        Command::Assign {
            appointment_id,
            provider_id,
        } => print_response(api.assign_provider(&appointment_id, &provider_id).await),

        Command::LabOrders { status } => {
            if let Some(status) = &status {
                check_status(status, LabOrderStatus::ALL);
            }
            print_response(api.list_lab_orders(status.as_ref()).await)
        }
        Command::LabOrder { id } => print_response(api.find_lab_order(&id).await),
        Command::UpdateLabOrder { id, status, notes } => {
            check_status(&status, LabOrderStatus::ALL);
            print_response(
                api.update_lab_order_status(&id, &status, notes.as_deref())
                    .await,
            )
        }

        Command::Stats => print_response(api.dashboard_stats().await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_status_arguments_use_wire_values() {
        let cli = Cli::try_parse_from(["careadmin", "update-lab-order", "ORD123", "sample_collected"])
            .unwrap();
        match cli.command {
            Command::UpdateLabOrder { id, status, notes } => {
                assert_eq!(id, "ORD123");
                assert_eq!(status, LabOrderStatus::SampleCollected);
                assert_eq!(notes, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["careadmin", "appointments", "in-progress"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Appointments {
                status: Some(AppointmentStatus::InProgress)
            }
        ));
    }

    #[test]
    fn test_reject_takes_optional_details() {
        let cli = Cli::try_parse_from([
            "careadmin",
            "reject",
            "PRV9",
            "Missing license",
            "Upload a valid registration",
        ])
        .unwrap();
        match cli.command {
            Command::Reject {
                id,
                reason,
                details,
            } => {
                assert_eq!(id, "PRV9");
                assert_eq!(reason, "Missing license");
                assert_eq!(details.as_deref(), Some("Upload a valid registration"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_missing_argument_is_rejected() {
        assert!(Cli::try_parse_from(["careadmin", "assign", "APT1"]).is_err());
        assert!(Cli::try_parse_from(["careadmin", "no-such-command"]).is_err());
    }
}
