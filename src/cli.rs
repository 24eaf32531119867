//! CLI argument parsing for the lead call workflow.
//!
//! The CLI is thin: each subcommand maps to one service operation, and every
//! command can print its result as JSON with `--json`.
use crate::lead::{Campaign, LeadId, LeadStatus};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "leadcall",
    version,
    about = "Drive automated feedback calls for a list of customer leads",
    after_help = "Examples:\n  leadcall login priya\n  leadcall import leads.csv\n  leadcall call-all\n  leadcall check-status --watch 30\n  leadcall list --status completed\n  leadcall feedback 3 --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Data directory holding leads.json, config.json and session.json
    #[arg(long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Log engine activity to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Login(LoginArgs),
    /// Close the operator session
    Logout,
    Create(CreateArgs),
    Import(ImportArgs),
    List(ListArgs),
    /// Show one lead
    Show(LeadArgs),
    Feedback(FeedbackArgs),
    /// Place a call for one pending lead
    Call(LeadArgs),
    /// Place calls for every pending lead
    CallAll,
    CheckStatus(CheckStatusArgs),
    /// Delete a lead regardless of status
    Delete(LeadArgs),
    Stats(StatsArgs),
    SampleCsv(SampleCsvArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Write a default config.json into the data directory")]
pub struct InitArgs {
    /// Overwrite an existing config.json
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Open an operator session")]
pub struct LoginArgs {
    /// Operator name recorded on the session
    pub operator: String,

    /// Campaign assigned to leads created during the session
    #[arg(long, default_value_t = Campaign::Feedback)]
    pub campaign: Campaign,
}

#[derive(Parser, Debug)]
#[command(about = "Create a single lead")]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub phone: String,

    #[arg(long)]
    pub email: String,
}

#[derive(Parser, Debug)]
#[command(about = "Import leads from a CSV file (name,phone,email)")]
pub struct ImportArgs {
    #[arg(value_name = "CSV")]
    pub file: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "List leads, finished calls first")]
pub struct ListArgs {
    /// Only show leads with this status
    #[arg(long)]
    pub status: Option<LeadStatus>,

    /// Only show leads from this campaign
    #[arg(long)]
    pub campaign: Option<Campaign>,
}

/// Commands addressing one lead by id.
#[derive(Parser, Debug)]
pub struct LeadArgs {
    pub id: LeadId,
}

#[derive(Parser, Debug)]
#[command(about = "Show the normalized feedback for a lead")]
pub struct FeedbackArgs {
    pub id: LeadId,

    /// Also print the raw provider payload
    #[arg(long)]
    pub raw: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Fetch call results for every lead with a call in flight")]
pub struct CheckStatusArgs {
    /// Repeat every SECS seconds until no calls remain in flight
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,

    /// Stop watching after this many checks
    #[arg(long, value_name = "N", requires = "watch")]
    pub max_rounds: Option<u32>,
}

#[derive(Parser, Debug)]
#[command(about = "Count leads per status")]
pub struct StatsArgs {
    #[arg(long)]
    pub campaign: Option<Campaign>,
}

#[derive(Parser, Debug)]
#[command(about = "Print or write a CSV import template")]
pub struct SampleCsvArgs {
    /// Write the template here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
