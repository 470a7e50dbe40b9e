//! SecureCast CLI entry point for the registration and voting flows.

mod config;
mod logging;

use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use securecast_client::ResilientClient;
use securecast_facematch::{FaceOracle, FaceVerifier};
use securecast_intake::{IntakeApi, IntakeClient};
use securecast_ledger::{LedgerApi, LedgerClient};
use securecast_otp::{OtpApi, OtpChallenge, OtpGate};
use securecast_replicator::{DrainProcessor, ReplicationMode};
use securecast_types::{Identity, Party};
use securecast_voting::{RestartReason, VoteOutcome, VoteRequest, VoteTransaction};

use config::SecurecastConfig;
use logging::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "securecast", about = "SecureCast registration and voting client")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "SECURECAST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SECURECAST_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SECURECAST_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Submit a registration to the intake queue and replicate it into the
    /// ledger. Prompts for the OTP mailed to the given address.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        national_id: String,
        /// Image file with the registrant's face.
        #[arg(long)]
        face_image: PathBuf,
    },

    /// Drain the intake queue into the ledger.
    Drain {
        /// Replicate with the idempotent update verb instead of the create
        /// verb.
        #[arg(long)]
        update: bool,
    },

    /// Cast a vote. Prompts for the OTP mailed to the registered address.
    Vote {
        #[arg(long)]
        email: String,
        #[arg(long)]
        party: String,
        /// Image file with a live face capture.
        #[arg(long)]
        face_image: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SecurecastConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => SecurecastConfig::default(),
    };
    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let log_format = cli.log_format.as_deref().unwrap_or(&config.log_format);
    init_logging(LogFormat::parse(log_format)?, log_level);

    let http = ResilientClient::new(config.retry_policy());
    let ledger: Arc<dyn LedgerApi> =
        Arc::new(LedgerClient::new(http.clone(), config.ledger_url.clone()));
    let intake: Arc<dyn IntakeApi> =
        Arc::new(IntakeClient::new(http.clone(), config.intake_url.clone()));

    match cli.command {
        Command::Register {
            name,
            email,
            address,
            national_id,
            face_image,
        } => {
            let face_template = encode_face_image(&face_image)?;
            let identity = Identity::new(name, email, address, national_id, face_template);

            let otp: Arc<dyn OtpApi> = Arc::new(OtpGate::new(http.clone(), config.otp_url.clone()));
            let challenge = otp.issue(&identity.email).await?;
            println!("An OTP has been sent to {}.", identity.email);
            let otp_code = prompt("Enter OTP: ")?;

            register(&config, intake, ledger, otp, identity, &otp_code, &challenge).await
        }
        Command::Drain { update } => {
            let mode = if update {
                ReplicationMode::Update
            } else {
                ReplicationMode::Insert
            };
            let processor = DrainProcessor::new(intake, ledger, config.drain_config());
            let summary = processor.run(mode).await;
            println!(
                "drained: {} replicated, {} skipped on integrity, {} failed",
                summary.replicated, summary.integrity_skipped, summary.failed
            );
            Ok(())
        }
        Command::Vote {
            email,
            party,
            face_image,
        } => {
            let otp = Arc::new(OtpGate::new(http.clone(), config.otp_url.clone()));
            let face = Arc::new(FaceVerifier::new(http.clone(), config.facematch.clone()));
            let captured = encode_face_image(&face_image)?;
            vote(ledger, otp, face, &email, Party::new(party), captured).await
        }
    }
}

/// Validate the registration OTP, stage the registration, decide
/// insert-vs-update, and run one drain pass in the resolved mode.
///
/// A rejected code ends the flow before anything reaches the intake queue;
/// the registrant starts over with a fresh OTP.
async fn register(
    config: &SecurecastConfig,
    intake: Arc<dyn IntakeApi>,
    ledger: Arc<dyn LedgerApi>,
    otp: Arc<dyn OtpApi>,
    identity: Identity,
    otp_code: &str,
    challenge: &OtpChallenge,
) -> anyhow::Result<()> {
    let validation = otp.validate(otp_code, challenge).await?;
    if !validation.valid {
        println!(
            "OTP validation failed: {}. Please submit the registration again.",
            validation.message
        );
        return Ok(());
    }

    intake.enqueue(&identity).await?;
    info!(email = %identity.email, "registration staged in intake queue");

    let mode = if ledger.exists(&identity.email).await {
        println!("Your details will be updated.");
        ReplicationMode::Update
    } else {
        println!("Your details will be added.");
        ReplicationMode::Insert
    };

    let processor = DrainProcessor::new(intake, ledger, config.drain_config());
    let summary = processor.run(mode).await;
    println!(
        "registration pass complete: {} replicated, {} skipped, {} failed",
        summary.replicated, summary.integrity_skipped, summary.failed
    );
    Ok(())
}

async fn vote(
    ledger: Arc<dyn LedgerApi>,
    otp: Arc<dyn OtpApi>,
    face: Arc<dyn FaceOracle>,
    email: &str,
    party: Party,
    captured_face: String,
) -> anyhow::Result<()> {
    let transaction = VoteTransaction::new(ledger, otp, face);

    let Some(voter) = transaction.lookup_voter(email).await? else {
        println!("No registration found for {email}. Please register first.");
        return Ok(());
    };

    let challenge = transaction.issue_challenge(&voter.email).await?;
    println!("An OTP has been sent to {}.", voter.email);
    let otp_code = prompt("Enter OTP: ")?;

    let request = VoteRequest {
        otp_code,
        challenge,
        captured_face,
        party,
    };

    match transaction.execute(&voter, &request).await? {
        VoteOutcome::Completed { message } => {
            println!("Vote cast successfully. {message}");
        }
        VoteOutcome::AlreadyCast { message } => {
            println!("Your vote was already cast. {message}");
        }
        VoteOutcome::Restart(RestartReason::OtpRejected { message }) => {
            println!("OTP validation failed: {message}. Please start over.");
        }
        VoteOutcome::Restart(RestartReason::FaceMismatch) => {
            println!("Face verification failed. Please start over.");
        }
        VoteOutcome::Unavailable => {
            println!("The ledger could not be verified. No vote was attempted; try again later.");
        }
    }
    Ok(())
}

/// Read a face image and wrap it the way registrations store templates.
fn encode_face_image(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read face image {}", path.display()))?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(bytes)))
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use securecast_nullables::{NullIntake, NullLedger, NullOtp};

    fn fast_config() -> SecurecastConfig {
        toml::from_str(
            r#"
            drain_idle_wait_ms = 1
            drain_error_backoff_ms = 1
            "#,
        )
        .unwrap()
    }

    fn registrant() -> Identity {
        Identity::new("A", "a@x.com", "addr", "0000", "Zg==")
    }

    #[tokio::test]
    async fn test_register_rejected_otp_never_reaches_the_queue() {
        let intake = Arc::new(NullIntake::new());
        let ledger = Arc::new(NullLedger::new());
        let otp = Arc::new(NullOtp::rejecting());
        let challenge = otp.issue("a@x.com").await.unwrap();

        register(
            &fast_config(),
            intake.clone(),
            ledger.clone(),
            otp,
            registrant(),
            "123456",
            &challenge,
        )
        .await
        .unwrap();

        assert_eq!(intake.depth(), 0);
        assert!(!intake
            .calls()
            .iter()
            .any(|c| c.starts_with("intake.enqueue")));
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_register_valid_otp_stages_and_replicates() {
        let intake = Arc::new(NullIntake::new());
        let ledger = Arc::new(NullLedger::new());
        let otp = Arc::new(NullOtp::accepting("123456"));
        let challenge = otp.issue("a@x.com").await.unwrap();

        register(
            &fast_config(),
            intake.clone(),
            ledger.clone(),
            otp,
            registrant(),
            "123456",
            &challenge,
        )
        .await
        .unwrap();

        assert_eq!(intake.depth(), 0);
        assert!(ledger.contains("a@x.com"));
        assert!(ledger.calls().contains(&"ledger.add:a@x.com".to_string()));
    }

    #[tokio::test]
    async fn test_register_known_identity_uses_update_verb() {
        let intake = Arc::new(NullIntake::new());
        let ledger = Arc::new(NullLedger::new());
        let otp = Arc::new(NullOtp::accepting("123456"));
        let challenge = otp.issue("a@x.com").await.unwrap();
        ledger.insert_identity(registrant());

        register(
            &fast_config(),
            intake.clone(),
            ledger.clone(),
            otp,
            registrant(),
            "123456",
            &challenge,
        )
        .await
        .unwrap();

        assert!(ledger
            .calls()
            .contains(&"ledger.update:a@x.com".to_string()));
        assert!(!ledger.calls().contains(&"ledger.add:a@x.com".to_string()));
    }
}
