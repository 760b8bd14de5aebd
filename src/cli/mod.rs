use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use uuid::Uuid;

use crate::application::{
    AppError, CommandVerifier, DiwaliUserEdit, LedgerConfig, LedgerService, LoanUserEdit,
    NewDiwaliUser, NewLoanUser,
};
use crate::domain::{
    format_rupees, parse_rupees, step_down, step_up, DataUri, DiwaliUser, Frequency, LoanType,
    LoanUser, Rupees, TransactionKind, VerificationOutcome, VerificationRequest,
};

/// chitbook - lending and festival savings ledger
#[derive(Parser)]
#[command(name = "chitbook")]
#[command(about = "Bookkeeping for a small lending business and its Diwali savings scheme")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "chitbook.db")]
    pub database: String,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Borrower and loan commands
    #[command(subcommand)]
    Loan(LoanCommands),

    /// Diwali savings scheme commands
    #[command(subcommand)]
    Scheme(SchemeCommands),

    /// Vault adjustment commands
    #[command(subcommand)]
    Vault(VaultCommands),

    /// Show the cash position and member counts
    Dashboard,

    /// Show every loan transaction and scheme deposit, newest first
    History {
        /// Maximum number of rows to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format: table, csv, json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Export a full JSON snapshot of the books
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Compare a live photo against an ID photo
    Verify {
        /// File containing the live photo as a data URI
        #[arg(long)]
        live_photo: PathBuf,

        /// File containing the ID photo as a data URI
        #[arg(long)]
        id_photo: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum LoanCommands {
    /// Show interest and disbursed cash for a principal
    Quote {
        /// Requested principal (snapped to multiples of 1,000 up to 50,000)
        amount: String,

        /// Loan type: normal, emi
        #[arg(short = 't', long = "type", default_value = "normal")]
        loan_type: String,

        /// Raise the principal by this many steps
        #[arg(long, action = ArgAction::Count)]
        up: u8,

        /// Lower the principal by this many steps
        #[arg(long, action = ArgAction::Count)]
        down: u8,
    },

    /// Register a borrower and disburse the loan
    Register {
        /// Borrower's full name
        #[arg(short, long)]
        name: String,

        /// Principal (multiple of 1,000 up to 50,000)
        #[arg(short, long)]
        amount: String,

        /// Loan type: normal, emi
        #[arg(short = 't', long = "type", default_value = "normal")]
        loan_type: String,

        /// Contact number
        #[arg(long)]
        contact: Option<String>,

        /// ID proof reference
        #[arg(long)]
        id_proof: Option<String>,

        #[command(flatten)]
        photos: PhotoArgs,
    },

    /// List borrowers
    List,

    /// Show a borrower and its transactions
    Show {
        /// Borrower ID
        id: String,
    },

    /// Override a borrower's details
    Edit {
        /// Borrower ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        contact: Option<String>,

        #[arg(long)]
        id_proof: Option<String>,

        /// New face value
        #[arg(long)]
        loan_amount: Option<String>,

        /// New repaid total
        #[arg(long)]
        paid_amount: Option<String>,
    },

    /// Record a repayment
    Repay {
        /// Borrower ID
        id: String,

        /// Amount repaid
        amount: String,
    },

    /// Delete a borrower and its transactions
    Delete {
        /// Borrower ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum SchemeCommands {
    /// Project the festival payout for a pledge
    Project {
        /// Pledge: 100, 1000 or 5000
        contribution: String,

        /// Frequency: weekly, monthly
        #[arg(short, long, default_value = "monthly")]
        frequency: String,
    },

    /// Enroll a member and collect the first pledge
    Enroll {
        /// Member's full name
        #[arg(short, long)]
        name: String,

        /// Pledge: 100, 1000 or 5000
        #[arg(long)]
        contribution: String,

        /// Frequency: weekly, monthly
        #[arg(short, long)]
        frequency: String,

        /// Contact number
        #[arg(long)]
        contact: Option<String>,

        /// ID proof reference
        #[arg(long)]
        id_proof: Option<String>,

        #[command(flatten)]
        photos: PhotoArgs,
    },

    /// List scheme members
    List,

    /// Show a member, the projected payout and deposits
    Show {
        /// Member ID
        id: String,
    },

    /// Override a member's details
    Edit {
        /// Member ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        contact: Option<String>,

        #[arg(long)]
        id_proof: Option<String>,

        #[arg(long)]
        contribution: Option<String>,

        #[arg(long)]
        frequency: Option<String>,

        #[arg(long)]
        total_saved: Option<String>,
    },

    /// Record a deposit
    Deposit {
        /// Member ID
        id: String,

        /// Amount deposited
        amount: String,
    },

    /// Delete a member and its deposits
    Delete {
        /// Member ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum VaultCommands {
    /// Add (positive) or withdraw (negative) vault cash
    Adjust {
        /// Signed amount
        #[arg(allow_negative_numbers = true)]
        amount: String,

        /// Why the adjustment was made
        #[arg(short, long)]
        reason: String,
    },

    /// List past adjustments
    List,
}

/// Optional photos for identity verification at onboarding.
#[derive(clap::Args, Default)]
pub struct PhotoArgs {
    /// File containing the live photo as a data URI
    #[arg(long, requires = "id_photo")]
    pub live_photo: Option<PathBuf>,

    /// File containing the ID photo as a data URI
    #[arg(long, requires = "live_photo")]
    pub id_photo: Option<PathBuf>,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = LedgerConfig::load_or_default(self.config.as_deref())?;

        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database, config).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Loan(loan_cmd) => {
                let service = LedgerService::connect(&self.database, config).await?;
                run_loan_command(&service, loan_cmd).await?;
            }

            Commands::Scheme(scheme_cmd) => {
                let service = LedgerService::connect(&self.database, config).await?;
                run_scheme_command(&service, scheme_cmd).await?;
            }

            Commands::Vault(vault_cmd) => {
                let service = LedgerService::connect(&self.database, config).await?;
                run_vault_command(&service, vault_cmd).await?;
            }

            Commands::Dashboard => {
                let service = LedgerService::connect(&self.database, config).await?;
                run_dashboard_command(&service).await?;
            }

            Commands::History { limit, format } => {
                let service = LedgerService::connect(&self.database, config).await?;
                run_history_command(&service, limit, &format).await?;
            }

            Commands::Export { output } => {
                let service = LedgerService::connect(&self.database, config).await?;
                run_export_command(&service, output.as_deref()).await?;
            }

            Commands::Verify {
                live_photo,
                id_photo,
            } => {
                let service = LedgerService::connect(&self.database, config).await?;
                run_verify_command(&service, &live_photo, &id_photo).await?;
            }
        }

        Ok(())
    }
}

async fn run_loan_command(service: &LedgerService, cmd: LoanCommands) -> Result<()> {
    match cmd {
        LoanCommands::Quote {
            amount,
            loan_type,
            up,
            down,
        } => {
            let loan_type = parse_loan_type(&loan_type)?;
            let mut principal = parse_amount(&amount)?;
            for _ in 0..up {
                principal = step_up(principal);
            }
            for _ in 0..down {
                principal = step_down(principal);
            }

            let quote = service.quote_loan(principal, loan_type);
            println!("Loan quote ({}, {}%)", quote.loan_type, loan_type.rate_percent());
            println!("  Principal:       {}", format_rupees(quote.principal));
            println!("  Interest:        {}", format_rupees(quote.interest));
            println!("  Cash disbursed:  {}", format_rupees(quote.disbursed_amount));
            println!("  Total repayable: {}", format_rupees(quote.total_repayable));
        }

        LoanCommands::Register {
            name,
            amount,
            loan_type,
            contact,
            id_proof,
            photos,
        } => {
            let new = NewLoanUser {
                name,
                contact,
                id_proof,
                principal: parse_amount(&amount)?,
                loan_type: parse_loan_type(&loan_type)?,
            };

            verify_photos(service, &photos).await?;
            let result = service.register_loan_user(new).await?;

            println!(
                "Registered {}: {} loan of {} ({} disbursed, {} interest)",
                result.user.name,
                result.quote.loan_type,
                format_rupees(result.quote.principal),
                format_rupees(result.quote.disbursed_amount),
                format_rupees(result.quote.interest)
            );
            println!("  ID: {}", result.user.id);
        }

        LoanCommands::List => {
            let users = service.list_loan_users().await?;
            if users.is_empty() {
                println!("No loan users found.");
            } else {
                println!(
                    "{:<36}  {:<20} {:>10} {:>10} {:>10} {:<10}",
                    "ID", "NAME", "LOAN", "PAID", "BALANCE", "STATUS"
                );
                println!("{}", "-".repeat(102));
                for user in users {
                    println!(
                        "{:<36}  {:<20} {:>10} {:>10} {:>10} {:<10}",
                        user.id,
                        truncate(&user.name, 20),
                        format_rupees(user.loan_amount),
                        format_rupees(user.paid_amount),
                        format_rupees(user.balance()),
                        user.status
                    );
                }
            }
        }

        LoanCommands::Show { id } => {
            let user = service.get_loan_user(parse_id(&id)?).await?;
            print_loan_user(&user);
        }

        LoanCommands::Edit {
            id,
            name,
            contact,
            id_proof,
            loan_amount,
            paid_amount,
        } => {
            let edit = LoanUserEdit {
                name,
                contact,
                id_proof,
                loan_amount: parse_optional_amount(loan_amount.as_deref())?,
                paid_amount: parse_optional_amount(paid_amount.as_deref())?,
            };
            let user = service.edit_loan_user(parse_id(&id)?, edit).await?;
            println!(
                "Updated {}: loan {}, paid {} ({})",
                user.name,
                format_rupees(user.loan_amount),
                format_rupees(user.paid_amount),
                user.status
            );
        }

        LoanCommands::Repay { id, amount } => {
            let amount = parse_amount(&amount)?;
            let result = service.post_repayment(parse_id(&id)?, amount).await?;
            println!(
                "Recorded repayment of {}: paid {} of {}, balance {} ({})",
                format_rupees(result.transaction.amount),
                format_rupees(result.paid_amount),
                format_rupees(result.loan_amount),
                format_rupees(result.balance()),
                result.status
            );
        }

        LoanCommands::Delete { id } => {
            let user = service.delete_loan_user(parse_id(&id)?).await?;
            println!("Deleted loan user: {}", user.name);
        }
    }
    Ok(())
}

fn print_loan_user(user: &LoanUser) {
    println!("Loan user: {}", user.name);
    println!("  ID:          {}", user.id);
    if let Some(contact) = &user.contact {
        println!("  Contact:     {}", contact);
    }
    if let Some(id_proof) = &user.id_proof {
        println!("  ID proof:    {}", id_proof);
    }
    println!("  Joined:      {}", user.joined_on.format("%Y-%m-%d"));
    println!("  Type:        {}", user.loan_type);
    println!("  Loan amount: {}", format_rupees(user.loan_amount));
    println!("  Disbursed:   {}", format_rupees(user.disbursed_amount));
    println!("  Paid:        {}", format_rupees(user.paid_amount));
    println!("  Balance:     {}", format_rupees(user.balance()));
    println!("  Status:      {}", user.status);
    println!();

    if user.transactions.is_empty() {
        println!("  No transactions.");
        return;
    }
    println!("  {:<12} {:>12}  DESCRIPTION", "DATE", "AMOUNT");
    for tx in &user.transactions {
        let sign = if tx.kind == TransactionKind::Credit { "+" } else { "" };
        println!(
            "  {:<12} {:>12}  {}",
            tx.date.format("%Y-%m-%d"),
            format!("{}{}", sign, format_rupees(tx.amount)),
            tx.description
        );
    }
}

async fn run_scheme_command(service: &LedgerService, cmd: SchemeCommands) -> Result<()> {
    match cmd {
        SchemeCommands::Project {
            contribution,
            frequency,
        } => {
            let frequency = parse_frequency(&frequency)?;
            let projection = service.project_savings(parse_amount(&contribution)?, frequency)?;
            println!(
                "{} {} for {} periods",
                format_rupees(projection.contribution),
                projection.frequency,
                frequency.horizon_periods()
            );
            println!(
                "  Total contributions: {}",
                format_rupees(projection.total_projected_contribution)
            );
            println!("  Bonus (10%):         {}", format_rupees(projection.bonus));
            println!(
                "  Diwali payout:       {}",
                format_rupees(projection.estimated_payout)
            );
        }

        SchemeCommands::Enroll {
            name,
            contribution,
            frequency,
            contact,
            id_proof,
            photos,
        } => {
            let new = NewDiwaliUser {
                name,
                contact,
                id_proof,
                contribution: parse_amount(&contribution)?,
                frequency: parse_frequency(&frequency)?,
            };

            verify_photos(service, &photos).await?;
            let result = service.enroll_diwali_user(new).await?;

            println!(
                "Enrolled {}: {} {}, estimated payout {}",
                result.user.name,
                format_rupees(result.user.contribution),
                result.user.frequency,
                format_rupees(result.projection.estimated_payout)
            );
            println!("  ID: {}", result.user.id);
        }

        SchemeCommands::List => {
            let users = service.list_diwali_users().await?;
            if users.is_empty() {
                println!("No scheme members found.");
            } else {
                println!(
                    "{:<36}  {:<20} {:>8} {:<8} {:>10} {:>10}",
                    "ID", "NAME", "PLEDGE", "FREQ", "SAVED", "PAYOUT"
                );
                println!("{}", "-".repeat(98));
                for user in users {
                    println!(
                        "{:<36}  {:<20} {:>8} {:<8} {:>10} {:>10}",
                        user.id,
                        truncate(&user.name, 20),
                        format_rupees(user.contribution),
                        user.frequency,
                        format_rupees(user.total_saved),
                        format_rupees(user.diwali_payout())
                    );
                }
            }
        }

        SchemeCommands::Show { id } => {
            let user = service.get_diwali_user(parse_id(&id)?).await?;
            print_diwali_user(&user);
        }

        SchemeCommands::Edit {
            id,
            name,
            contact,
            id_proof,
            contribution,
            frequency,
            total_saved,
        } => {
            let edit = DiwaliUserEdit {
                name,
                contact,
                id_proof,
                contribution: parse_optional_amount(contribution.as_deref())?,
                frequency: frequency.as_deref().map(parse_frequency).transpose()?,
                total_saved: parse_optional_amount(total_saved.as_deref())?,
            };
            let user = service.edit_diwali_user(parse_id(&id)?, edit).await?;
            println!(
                "Updated {}: {} {}, saved {}",
                user.name,
                format_rupees(user.contribution),
                user.frequency,
                format_rupees(user.total_saved)
            );
        }

        SchemeCommands::Deposit { id, amount } => {
            let amount = parse_amount(&amount)?;
            let result = service.post_deposit(parse_id(&id)?, amount).await?;
            println!(
                "Recorded deposit of {}: total saved {}",
                format_rupees(result.deposit.amount),
                format_rupees(result.total_saved)
            );
        }

        SchemeCommands::Delete { id } => {
            let user = service.delete_diwali_user(parse_id(&id)?).await?;
            println!("Deleted scheme member: {}", user.name);
        }
    }
    Ok(())
}

fn print_diwali_user(user: &DiwaliUser) {
    println!("Scheme member: {}", user.name);
    println!("  ID:              {}", user.id);
    if let Some(contact) = &user.contact {
        println!("  Contact:         {}", contact);
    }
    if let Some(id_proof) = &user.id_proof {
        println!("  ID proof:        {}", id_proof);
    }
    println!("  Joined:          {}", user.joined_on.format("%Y-%m-%d"));
    println!(
        "  Pledge:          {} {}",
        format_rupees(user.contribution),
        user.frequency
    );
    println!("  Total saved:     {}", format_rupees(user.total_saved));
    println!("  Estimated bonus: {}", format_rupees(user.estimated_bonus));
    println!("  Diwali payout:   {}", format_rupees(user.diwali_payout()));
    println!(
        "  Early exit:      {} (10% forfeited)",
        format_rupees(user.early_withdrawal_value())
    );
    if user.logged_total() != user.total_saved {
        println!(
            "  Note: deposits add up to {}",
            format_rupees(user.logged_total())
        );
    }
    println!();

    if user.transactions.is_empty() {
        println!("  No deposits.");
        return;
    }
    println!("  {:<12} {:>12}  DESCRIPTION", "DATE", "AMOUNT");
    for deposit in &user.transactions {
        println!(
            "  {:<12} {:>12}  {}",
            deposit.date.format("%Y-%m-%d"),
            format!("+{}", format_rupees(deposit.amount)),
            deposit.description
        );
    }
}

async fn run_vault_command(service: &LedgerService, cmd: VaultCommands) -> Result<()> {
    match cmd {
        VaultCommands::Adjust { amount, reason } => {
            let adjustment = service.adjust_vault(parse_amount(&amount)?, &reason).await?;
            let verb = if adjustment.is_withdrawal() {
                "Withdrew"
            } else {
                "Added"
            };
            println!(
                "{} {}: {}",
                verb,
                format_rupees(adjustment.amount.abs()),
                adjustment.reason
            );
        }

        VaultCommands::List => {
            let adjustments = service.list_vault_adjustments().await?;
            if adjustments.is_empty() {
                println!("No vault adjustments.");
            } else {
                println!("{:<12} {:>12}  REASON", "DATE", "AMOUNT");
                println!("{}", "-".repeat(50));
                for adjustment in adjustments {
                    println!(
                        "{:<12} {:>12}  {}",
                        adjustment.recorded_at.format("%Y-%m-%d"),
                        format_rupees(adjustment.amount),
                        adjustment.reason
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_dashboard_command(service: &LedgerService) -> Result<()> {
    let summary = service.vault_summary().await?;

    println!("Vault");
    println!("  Initial capital:  {:>14}", format_rupees(summary.initial_capital));
    println!("  Adjustments:      {:>14}", format_rupees(summary.net_adjustments));
    println!("  Loan wallet:      {:>14}", format_rupees(summary.loan_wallet));
    println!("  Diwali wallet:    {:>14}", format_rupees(summary.diwali_wallet));
    println!("  Total cash:       {:>14}", format_rupees(summary.total_cash()));
    println!();
    println!("Loans");
    println!("  Borrowers:        {:>14}", summary.loan_users_count);
    println!(
        "  Active/completed: {:>14}",
        format!("{}/{}", summary.active_loans, summary.completed_loans)
    );
    println!("  Loans given:      {:>14}", format_rupees(summary.total_loans_given));
    println!("  Cash disbursed:   {:>14}", format_rupees(summary.total_disbursed));
    println!("  Interest earned:  {:>14}", format_rupees(summary.interest_earned));
    println!("  Repaid:           {:>14}", format_rupees(summary.total_repaid));
    println!("  Outstanding:      {:>14}", format_rupees(summary.outstanding));
    println!();
    println!("Diwali scheme");
    println!("  Members:          {:>14}", summary.diwali_users_count);
    println!("  Total savings:    {:>14}", format_rupees(summary.diwali_wallet));

    Ok(())
}

async fn run_history_command(
    service: &LedgerService,
    limit: Option<usize>,
    format: &str,
) -> Result<()> {
    use crate::io::Exporter;

    let entries = service.history(limit).await?;

    match format {
        "csv" => {
            Exporter::write_history_csv(&entries, std::io::stdout())?;
        }
        "json" => {
            Exporter::write_history_json(&entries, std::io::stdout())?;
        }
        "table" => {
            if entries.is_empty() {
                println!("No transactions found.");
                return Ok(());
            }
            println!(
                "{:<12} {:<20} {:<8} {:<7} {:>12}  DESCRIPTION",
                "DATE", "MEMBER", "SOURCE", "KIND", "AMOUNT"
            );
            println!("{}", "-".repeat(80));
            for entry in entries {
                println!(
                    "{:<12} {:<20} {:<8} {:<7} {:>12}  {}",
                    entry.date.format("%Y-%m-%d"),
                    truncate(&entry.member, 20),
                    entry.source.as_str(),
                    entry.kind,
                    format_rupees(entry.amount),
                    truncate(&entry.description, 30)
                );
            }
        }
        other => anyhow::bail!("Unknown format '{}'. Use table, csv or json", other),
    }
    Ok(())
}

async fn run_export_command(service: &LedgerService, output: Option<&str>) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let snapshot = Exporter::new(service).export_snapshot_json(writer).await?;

    if let Some(path) = output {
        eprintln!(
            "Exported {} loan users, {} scheme members and {} adjustments to {}",
            snapshot.loan_users.len(),
            snapshot.diwali_users.len(),
            snapshot.vault_adjustments.len(),
            path
        );
    }
    Ok(())
}

async fn run_verify_command(service: &LedgerService, live_photo: &Path, id_photo: &Path) -> Result<()> {
    let request = read_verification_request(live_photo, id_photo)?;
    let verifier = configured_verifier(service)?;

    // A verifier failure is reported as a non-match rather than aborting
    let outcome = match service.confirm_identity(&verifier, &request).await {
        Ok(outcome) => outcome,
        Err(AppError::IdentityMismatch {
            confidence, reason, ..
        }) => VerificationOutcome {
            is_match: false,
            confidence,
            reason,
        },
        Err(AppError::VerificationFailed(message)) => {
            tracing::error!(%message, "identity verification failed");
            VerificationOutcome::failed("verifier error")
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "{} (confidence {:.2})",
        if outcome.is_match { "Match" } else { "No match" },
        outcome.confidence
    );
    if let Some(reason) = &outcome.reason {
        println!("  Reason: {}", reason);
    }
    Ok(())
}

/// Gate an onboarding on the face match when photos were supplied.
async fn verify_photos(service: &LedgerService, photos: &PhotoArgs) -> Result<()> {
    let (Some(live), Some(id)) = (&photos.live_photo, &photos.id_photo) else {
        return Ok(());
    };

    let request = read_verification_request(live, id)?;
    let verifier = configured_verifier(service)?;
    let outcome = service.confirm_identity(&verifier, &request).await?;
    println!("Identity verified (confidence {:.2})", outcome.confidence);
    Ok(())
}

fn configured_verifier(service: &LedgerService) -> Result<CommandVerifier> {
    let config = service
        .config()
        .verifier
        .as_ref()
        .context("No [verifier] section in the configuration file")?;
    Ok(CommandVerifier::from_config(config))
}

fn read_verification_request(live_photo: &Path, id_photo: &Path) -> Result<VerificationRequest> {
    Ok(VerificationRequest {
        live_photo_data_uri: read_data_uri(live_photo)?,
        id_photo_data_uri: read_data_uri(id_photo)?,
    })
}

fn read_data_uri(path: &Path) -> Result<DataUri> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    DataUri::parse(&contents).with_context(|| format!("{} is not a data URI", path.display()))
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).context("Invalid ID format (expected UUID)")
}

fn parse_amount(amount: &str) -> Result<Rupees> {
    parse_rupees(amount)
        .with_context(|| format!("Invalid amount '{}'. Use whole rupees, e.g. '5000'", amount))
}

fn parse_optional_amount(amount: Option<&str>) -> Result<Option<Rupees>> {
    amount.map(parse_amount).transpose()
}

fn parse_loan_type(value: &str) -> Result<LoanType> {
    LoanType::from_str(value)
        .ok_or_else(|| anyhow::anyhow!("Invalid loan type '{}'. Valid types: normal, emi", value))
}

fn parse_frequency(value: &str) -> Result<Frequency> {
    Frequency::from_str(value).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid frequency '{}'. Valid frequencies: weekly, monthly",
            value
        )
    })
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{}...", cut)
    }
}
