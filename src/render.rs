//! Plain-text rendering for CLI output.
//!
//! Each function returns the full text so callers decide where it goes.
use crate::dispatch::BulkDispatchReport;
use crate::feedback::{FeedbackSource, QuestionKey};
use crate::lead::Lead;
use crate::reconcile::{ReconcileOutcome, ReconcileReport};
use crate::service::{FeedbackView, LeadRow};
use crate::store::LeadStats;
use crate::util::{format_epoch_ms, truncate_chars};

const NAME_WIDTH: usize = 20;

fn fit(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        format!("{}~", truncate_chars(text, width - 1))
    } else {
        text.to_string()
    }
}

/// Lead table in the order given.
pub fn lead_table(rows: &[LeadRow]) -> String {
    if rows.is_empty() {
        return "no leads\n".to_string();
    }
    let mut out = format!(
        "{:>4}  {:<NAME_WIDTH$}  {:<16}  {:<9}  {:<9}  {:<19}  feedback\n",
        "id", "name", "phone", "status", "campaign", "created"
    );
    for row in rows {
        let lead = &row.lead;
        out.push_str(&format!(
            "{:>4}  {:<NAME_WIDTH$}  {:<16}  {:<9}  {:<9}  {:<19}  {}\n",
            lead.id,
            fit(&lead.name, NAME_WIDTH),
            fit(&lead.phone, 16),
            lead.status.as_str(),
            lead.campaign.as_str(),
            format_epoch_ms(lead.created_at_epoch_ms),
            row.feedback_preview
        ));
    }
    out
}

pub fn lead_detail(lead: &Lead) -> String {
    let mut out = format!(
        "lead: {}\nname: {}\nphone: {}\nemail: {}\nstatus: {}\ncampaign: {}\ncreated: {}\n",
        lead.id,
        lead.name,
        lead.phone,
        lead.email,
        lead.status,
        lead.campaign,
        format_epoch_ms(lead.created_at_epoch_ms)
    );
    if let Some(called_at) = lead.called_at_epoch_ms {
        out.push_str(&format!("called: {}\n", format_epoch_ms(called_at)));
    }
    if let Some(call_id) = lead.provider_call_id.as_deref() {
        out.push_str(&format!("call id: {call_id}\n"));
    }
    let recorded = if lead.feedback.is_some() { "recorded" } else { "none" };
    out.push_str(&format!("feedback: {recorded}\n"));
    out
}

/// Feedback view with the recovered customer answers under their headings.
pub fn feedback_detail(view: &FeedbackView, show_raw: bool) -> String {
    let mut out = format!(
        "lead: {} ({})\nstatus: {}\n",
        view.lead_id, view.name, view.status
    );
    let parsed = &view.parsed;
    if parsed.source == FeedbackSource::Empty {
        out.push_str("No feedback yet\n");
    } else {
        if let Some(summary) = parsed.summary.as_deref() {
            out.push_str(&format!("summary: {summary}\n"));
        }
        if let Some(duration) = parsed.duration.as_ref() {
            out.push_str(&format!("duration: {}\n", duration.display()));
        }
        if let Some(reason) = parsed.ended_reason.as_deref() {
            out.push_str(&format!("ended: {reason}\n"));
        }
        if let Some(status) = parsed.status.as_deref() {
            out.push_str(&format!("call status: {status}\n"));
        }
        if !parsed.customer_responses.is_empty() {
            out.push_str("customer responses:\n");
            for key in [
                QuestionKey::Satisfaction,
                QuestionKey::Helpful,
                QuestionKey::Suggestions,
                QuestionKey::FutureInterest,
            ] {
                if let Some(answer) = parsed.customer_responses.get(&key) {
                    out.push_str(&format!("  {}: {answer}\n", key.label()));
                }
            }
        }
        if let Some(feedback) = parsed.feedback.as_deref() {
            out.push_str(&format!("feedback: {feedback}\n"));
        }
        if let Some(transcript) = parsed.transcript.as_deref() {
            out.push_str("transcript:\n");
            for line in transcript.lines() {
                out.push_str(&format!("  {line}\n"));
            }
        }
    }
    if show_raw {
        if let Some(raw) = view.raw.as_deref() {
            out.push_str(&format!("raw:\n{raw}\n"));
        }
    }
    out
}

pub fn bulk_report(report: &BulkDispatchReport) -> String {
    let mut out = format!(
        "attempted: {}, succeeded: {}, failed: {}\n",
        report.attempted, report.succeeded, report.failed
    );
    for entry in &report.results {
        match (&entry.provider_call_id, &entry.error) {
            (Some(call_id), _) => {
                out.push_str(&format!(
                    "  - {} {}: call {call_id}\n",
                    entry.lead_id, entry.name
                ));
            }
            (None, Some(error)) => {
                out.push_str(&format!(
                    "  - {} {}: {} ({})\n",
                    entry.lead_id, entry.name, error.message, error.kind
                ));
            }
            (None, None) => {}
        }
    }
    out
}

fn outcome_label(outcome: ReconcileOutcome) -> &'static str {
    match outcome {
        ReconcileOutcome::StillPending => "still in progress",
        ReconcileOutcome::Completed => "completed",
        ReconcileOutcome::Rejected => "rejected",
        ReconcileOutcome::Error => "check failed",
    }
}

pub fn reconcile_report(report: &ReconcileReport) -> String {
    let mut out = format!("checked: {}, updated: {}\n", report.checked, report.updated);
    for entry in &report.results {
        out.push_str(&format!(
            "  - {} {}: {}",
            entry.lead_id,
            entry.name,
            outcome_label(entry.outcome)
        ));
        if let Some(error) = entry.error.as_ref() {
            out.push_str(&format!(" ({})", error.message));
        }
        out.push('\n');
    }
    out
}

pub fn stats(stats: &LeadStats) -> String {
    format!(
        "total: {}\npending: {}\ncalling: {}\ncompleted: {}\nrejected: {}\n",
        stats.total, stats.pending, stats.calling, stats.completed, stats.rejected
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::BulkDispatchEntry;
    use crate::error::ErrorReport;
    use crate::feedback::normalize;
    use crate::lead::{Campaign, LeadStatus};

    fn lead(id: u64, status: LeadStatus) -> Lead {
        Lead {
            id,
            name: "A very long customer name indeed".to_string(),
            phone: "+15550000001".to_string(),
            email: "a@example.com".to_string(),
            status,
            campaign: Campaign::Feedback,
            provider_call_id: None,
            feedback: None,
            created_at_epoch_ms: 0,
            called_at_epoch_ms: None,
        }
    }

    #[test]
    fn table_truncates_long_names() {
        let rows = [LeadRow {
            lead: lead(7, LeadStatus::Pending),
            feedback_preview: "No feedback yet".to_string(),
        }];
        let text = lead_table(&rows);
        let line = text.lines().nth(1).expect("row");
        assert!(line.contains("A very long custome~"), "{line}");
        assert!(line.ends_with("No feedback yet"));
        assert_eq!(lead_table(&[]), "no leads\n");
    }

    #[test]
    fn feedback_detail_uses_question_labels() {
        let raw = r#"{"transcript":"AI: What did you find especially helpful?\nUser: Friendly staff","duration":65}"#;
        let view = FeedbackView {
            lead_id: 3,
            name: "Asha".to_string(),
            status: LeadStatus::Completed,
            raw: Some(raw.to_string()),
            parsed: normalize(Some(raw)),
        };
        let text = feedback_detail(&view, false);
        assert!(text.contains("duration: 1:05"), "{text}");
        assert!(text.contains("  What Was Helpful: Friendly staff"), "{text}");
        assert!(!text.contains("raw:"));
        assert!(feedback_detail(&view, true).contains("raw:"));
    }

    #[test]
    fn bulk_report_lists_failures_with_kind() {
        let report = BulkDispatchReport {
            attempted: 2,
            succeeded: 1,
            failed: 1,
            results: vec![
                BulkDispatchEntry {
                    lead_id: 1,
                    name: "Asha".to_string(),
                    provider_call_id: Some("call-1".to_string()),
                    error: None,
                },
                BulkDispatchEntry {
                    lead_id: 2,
                    name: "Ravi".to_string(),
                    provider_call_id: None,
                    error: Some(ErrorReport {
                        kind: "dispatch".to_string(),
                        message: "boom".to_string(),
                    }),
                },
            ],
        };
        let text = bulk_report(&report);
        assert!(text.starts_with("attempted: 2, succeeded: 1, failed: 1\n"));
        assert!(text.contains("  - 2 Ravi: boom (dispatch)"));
    }

    #[test]
    fn detail_and_reconcile_report_end_every_line() {
        let mut called = lead(4, LeadStatus::Calling);
        called.provider_call_id = Some("call-4".to_string());
        let detail = lead_detail(&called);
        assert!(detail.contains("status: calling\ncampaign: feedback\n"), "{detail}");
        assert!(detail.ends_with("call id: call-4\nfeedback: none\n"), "{detail}");

        let report = ReconcileReport {
            checked: 1,
            updated: 0,
            results: vec![crate::reconcile::ReconcileEntry {
                lead_id: 4,
                name: "Asha".to_string(),
                outcome: ReconcileOutcome::Error,
                error: Some(ErrorReport {
                    kind: "dispatch".to_string(),
                    message: "timed out".to_string(),
                }),
            }],
        };
        assert_eq!(
            reconcile_report(&report),
            "checked: 1, updated: 0\n  - 4 Asha: check failed (timed out)\n"
        );
    }
}
