//! leadcall: drive automated feedback calls for customer leads.
//!
//! Leads are created by hand or from CSV, dispatched to a voice-call provider,
//! reconciled by polling, and their raw call payloads normalized into
//! customer answers for display.
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

mod cli;
mod config;
mod dispatch;
mod error;
mod feedback;
mod intake;
mod lead;
mod logging;
mod paths;
mod provider;
mod reconcile;
mod render;
mod service;
mod session;
mod store;
#[cfg(test)]
mod test_support;
mod util;
mod workflow;

use cli::{Command, RootArgs};
use error::{ErrorReport, LeadError};
use workflow::RunContext;

fn main() -> ExitCode {
    let args = RootArgs::parse();
    if let Err(err) = logging::init_logging(args.global.verbose) {
        eprintln!("warning: {err:#}");
    }
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let report = error_report(&err);
            if args.global.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(text) => println!("{text}"),
                    Err(_) => eprintln!("error: {}", report.message),
                }
            } else {
                eprintln!("error: {}", report.message);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &RootArgs) -> Result<()> {
    let ctx = RunContext::from_global(&args.global)?;
    tracing::debug!(data_dir = %ctx.paths.root().display(), "resolved data dir");
    match &args.command {
        Command::Init(cmd) => workflow::run_init(&ctx, cmd),
        Command::Login(cmd) => workflow::run_login(&ctx, cmd),
        Command::Logout => workflow::run_logout(&ctx),
        Command::Create(cmd) => workflow::run_create(&ctx, cmd),
        Command::Import(cmd) => workflow::run_import(&ctx, cmd),
        Command::List(cmd) => workflow::run_list(&ctx, cmd),
        Command::Show(cmd) => workflow::run_show(&ctx, cmd),
        Command::Feedback(cmd) => workflow::run_feedback(&ctx, cmd),
        Command::Call(cmd) => workflow::run_call(&ctx, cmd),
        Command::CallAll => workflow::run_call_all(&ctx),
        Command::CheckStatus(cmd) => workflow::run_check_status(&ctx, cmd),
        Command::Delete(cmd) => workflow::run_delete(&ctx, cmd),
        Command::Stats(cmd) => workflow::run_stats(&ctx, cmd),
        Command::SampleCsv(cmd) => workflow::run_sample_csv(&ctx, cmd),
    }
}

/// Domain errors keep their kind; anything else is reported as storage.
fn error_report(err: &anyhow::Error) -> ErrorReport {
    match err.downcast_ref::<LeadError>() {
        Some(lead_err) => lead_err.report(),
        None => LeadError::from(anyhow::anyhow!("{err:#}")).report(),
    }
}
