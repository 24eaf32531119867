//! Command handlers: one `run_*` per subcommand.
//!
//! Handlers resolve the session and provider they need, call the service,
//! and print either text or JSON.
use crate::cli::{
    CheckStatusArgs, CreateArgs, FeedbackArgs, GlobalArgs, ImportArgs, InitArgs, LeadArgs,
    ListArgs, LoginArgs, SampleCsvArgs, StatsArgs,
};
use crate::config;
use crate::error::{LeadError, LeadResult};
use crate::intake;
use crate::paths::DataPaths;
use crate::provider::HttpCallProvider;
use crate::render;
use crate::service::{LeadFilter, LeadService};
use crate::session::{self, Session};
use crate::store::LeadStore;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::thread;
use std::time::Duration;

/// Resolved state shared by every handler.
pub struct RunContext {
    pub paths: DataPaths,
    pub json: bool,
}

impl RunContext {
    pub fn from_global(global: &GlobalArgs) -> LeadResult<Self> {
        let paths = DataPaths::resolve(global.data_dir.as_deref())
            .map_err(|err| LeadError::Config(format!("{err:#}")))?;
        Ok(Self {
            paths,
            json: global.json,
        })
    }

    fn service(&self) -> LeadService<HttpCallProvider> {
        LeadService::new(LeadStore::open(&self.paths.leads_path()))
    }

    fn calling_service(&self) -> LeadResult<LeadService<HttpCallProvider>> {
        let config = config::load_effective_config(&self.paths)
            .map_err(|err| LeadError::Config(format!("{err:#}")))?;
        let provider = HttpCallProvider::new(&config.provider)
            .map_err(|err| LeadError::Config(format!("{err:#}")))?;
        Ok(self.service().with_provider(provider))
    }

    fn session(&self) -> LeadResult<Session> {
        session::load(&self.paths)
    }

    /// Print `value` as pretty JSON or the rendered text.
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            let text = serde_json::to_string_pretty(value).context("serialize output")?;
            println!("{text}");
        } else {
            print!("{}", text());
        }
        Ok(())
    }
}

pub fn run_init(ctx: &RunContext, args: &InitArgs) -> Result<()> {
    let path = ctx.paths.config_path();
    if path.is_file() && !args.force {
        return Err(LeadError::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ))
        .into());
    }
    config::write_config(&ctx.paths, &config::default_config())?;
    ctx.emit(&serde_json::json!({ "config_path": path }), || {
        format!("wrote {}\n", path.display())
    })
}

pub fn run_login(ctx: &RunContext, args: &LoginArgs) -> Result<()> {
    let session = session::login(&ctx.paths, &args.operator, args.campaign)?;
    ctx.emit(&session, || {
        format!(
            "logged in as {} (campaign {})\n",
            session.operator, session.campaign
        )
    })
}

pub fn run_logout(ctx: &RunContext) -> Result<()> {
    let closed = session::logout(&ctx.paths)?;
    ctx.emit(&serde_json::json!({ "closed": closed }), || match &closed {
        Some(session) => format!("logged out {}\n", session.operator),
        None => "no active session\n".to_string(),
    })
}

pub fn run_create(ctx: &RunContext, args: &CreateArgs) -> Result<()> {
    let session = ctx.session()?;
    let lead = ctx
        .service()
        .create_lead(&session, &args.name, &args.phone, &args.email)?;
    ctx.emit(&lead, || format!("created lead {} ({})\n", lead.id, lead.name))
}

pub fn run_import(ctx: &RunContext, args: &ImportArgs) -> Result<()> {
    let session = ctx.session()?;
    let file = File::open(&args.file).map_err(|err| {
        LeadError::Validation(format!("open {}: {err}", args.file.display()))
    })?;
    let report = ctx.service().import_leads(&session, file)?;
    ctx.emit(&report, || format!("imported {} leads\n", report.imported))
}

pub fn run_list(ctx: &RunContext, args: &ListArgs) -> Result<()> {
    let rows = ctx.service().list_leads(LeadFilter {
        status: args.status,
        campaign: args.campaign,
    })?;
    ctx.emit(&rows, || render::lead_table(&rows))
}

pub fn run_show(ctx: &RunContext, args: &LeadArgs) -> Result<()> {
    let lead = ctx.service().get_lead(args.id)?;
    ctx.emit(&lead, || render::lead_detail(&lead))
}

pub fn run_feedback(ctx: &RunContext, args: &FeedbackArgs) -> Result<()> {
    let view = ctx.service().lead_feedback(args.id)?;
    ctx.emit(&view, || render::feedback_detail(&view, args.raw))
}

pub fn run_call(ctx: &RunContext, args: &LeadArgs) -> Result<()> {
    let session = ctx.session()?;
    let receipt = ctx.calling_service()?.dispatch_lead(&session, args.id)?;
    ctx.emit(&receipt, || {
        format!(
            "lead {}: call {} placed\n",
            receipt.lead_id, receipt.provider_call_id
        )
    })
}

pub fn run_call_all(ctx: &RunContext) -> Result<()> {
    let session = ctx.session()?;
    let report = ctx.calling_service()?.dispatch_all(&session)?;
    ctx.emit(&report, || render::bulk_report(&report))
}

pub fn run_check_status(ctx: &RunContext, args: &CheckStatusArgs) -> Result<()> {
    let session = ctx.session()?;
    let mut service = ctx.calling_service()?;
    let Some(interval) = args.watch else {
        let report = service.check_status(&session)?;
        return ctx.emit(&report, || render::reconcile_report(&report));
    };

    let mut round: u32 = 0;
    loop {
        round += 1;
        let report = service.check_status(&session)?;
        if ctx.json {
            // One compact document per round.
            println!(
                "{}",
                serde_json::to_string(&report).context("serialize status report")?
            );
        } else {
            print!("round {round}: {}", render::reconcile_report(&report));
        }
        let in_flight = service.stats(None)?.calling;
        if in_flight == 0 || args.max_rounds.is_some_and(|max| round >= max) {
            break;
        }
        tracing::debug!(in_flight, interval, "waiting for next status check");
        thread::sleep(Duration::from_secs(interval));
    }
    Ok(())
}

pub fn run_delete(ctx: &RunContext, args: &LeadArgs) -> Result<()> {
    let session = ctx.session()?;
    let removed = ctx.service().delete_lead(&session, args.id)?;
    ctx.emit(&removed, || {
        format!("deleted lead {} ({})\n", removed.id, removed.name)
    })
}

pub fn run_stats(ctx: &RunContext, args: &StatsArgs) -> Result<()> {
    let stats = ctx.service().stats(args.campaign)?;
    ctx.emit(&stats, || render::stats(&stats))
}

pub fn run_sample_csv(ctx: &RunContext, args: &SampleCsvArgs) -> Result<()> {
    let template = intake::sample_csv();
    match args.output.as_ref() {
        Some(path) => {
            fs::write(path, template.as_bytes())
                .with_context(|| format!("write {}", path.display()))?;
            ctx.emit(&serde_json::json!({ "path": path }), || {
                format!("wrote {}\n", path.display())
            })
        }
        None if ctx.json => ctx.emit(&serde_json::json!({ "csv": template }), String::new),
        None => {
            print!("{template}");
            Ok(())
        }
    }
}
