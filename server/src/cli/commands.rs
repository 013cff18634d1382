// server/src/cli/commands.rs

// Command-line arguments and subcommands for the clinic CLI.
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use lib::{Operation, Scope};
use models::{RecordId, ResourceKind, Role};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "clinic-cli", version, about = "Operate the clinic record store")]
pub struct CliArgs {
    /// YAML configuration file
    #[arg(long, short = 'c', global = true, env = "CLINIC_CONFIG", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Account the command acts as; every command goes through the same permission checks
    #[arg(long = "as", global = true, value_name = "ACCOUNT_ID")]
    pub acting_as: Option<RecordId>,
    #[command(subcommand)]
    pub command: ClinicCommands,
}

#[derive(Debug, Clone, Subcommand, PartialEq)]
pub enum ClinicCommands {
    /// Create the first administrator account
    BootstrapAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "CLINIC_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        full_name: String,
    },
    /// Sign up a doctor, patient or lab technician
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long, default_value = "patient")]
        role: Role,
    },
    /// Show the account behind --as
    Whoami,
    /// Totals of users, patients, doctors and prescriptions
    Stats,
    /// List doctors, or show one
    Doctors {
        #[arg(value_name = "DOCTOR_ID")]
        doctor_id: Option<RecordId>,
    },
    /// Turn an account into a doctor
    Promote {
        #[arg(value_name = "ACCOUNT_ID")]
        account_id: RecordId,
        #[arg(long)]
        specialization: String,
        #[arg(long)]
        license_number: String,
    },
    /// Mail reminders for every prescription running on the given day
    SendReminders {
        /// Defaults to today
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },
    /// Ask the assistant a question on behalf of --as
    Chat {
        #[arg(value_name = "MESSAGE")]
        message: String,
    },
    /// Extract the text of a stored document from its file
    Extract {
        #[arg(value_name = "DOCUMENT_ID")]
        document_id: RecordId,
        #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },
    /// Create, read, list, update or delete records of one kind
    Record {
        #[arg(value_name = "KIND")]
        kind: ResourceKind,
        /// create, read (or get), list, update or delete
        #[arg(value_name = "OPERATION")]
        operation: Operation,
        /// Record id for read, update and delete
        #[arg(long)]
        id: Option<RecordId>,
        /// JSON object: the whole record to create, or the fields to update
        #[arg(long, value_name = "JSON")]
        data: Option<String>,
        /// Slice to list: all, account:<ID>, doctor:<ID> or lab:<ID>
        #[arg(long, default_value = "all")]
        scope: Scope,
    },
    /// Print the effective permission table
    Policy {
        #[arg(long)]
        kind: Option<ResourceKind>,
    },
}

impl ClinicCommands {
    /// Name for logs; arguments may hold passwords.
    pub fn name(&self) -> &'static str {
        match self {
            ClinicCommands::BootstrapAdmin { .. } => "bootstrap-admin",
            ClinicCommands::Register { .. } => "register",
            ClinicCommands::Whoami => "whoami",
            ClinicCommands::Stats => "stats",
            ClinicCommands::Doctors { .. } => "doctors",
            ClinicCommands::Promote { .. } => "promote",
            ClinicCommands::SendReminders { .. } => "send-reminders",
            ClinicCommands::Chat { .. } => "chat",
            ClinicCommands::Extract { .. } => "extract",
            ClinicCommands::Record { .. } => "record",
            ClinicCommands::Policy { .. } => "policy",
        }
    }
}
