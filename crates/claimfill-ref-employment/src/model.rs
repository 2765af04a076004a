//! A deterministic stand-in for the language model.
//!
//! `ScriptedModel` answers every stage from the fictional case files with
//! plain string and JSON handling. No network calls are made. Reconstruct
//! replies are queued by the scenario, one per claimant message.

use std::collections::VecDeque;
use std::sync::{LazyLock, Mutex};

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;

use claimfill_contracts::{
    audit::ClaimValueVerdict,
    model::{ModelError, ModelReply, ModelRequest, Stage},
};
use claimfill_core::traits::ModelClient;
use claimfill_schema::walker::is_falsy;
use claimfill_verify::claim::{compare_claim, parse_amount, sum_values};

static JSON_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\n(.*?)\n```").expect("valid regex"));
static BREAKDOWN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\d+\.\s.*?(AED\s?[\d,]+\.\d{2})\**\s*$").expect("valid regex"));
static TOTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Total claimed:\s*(AED\s?[\d,]+\.\d{2})").expect("valid regex"));
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2} [A-Z][a-z]+ \d{4}\b").expect("valid regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^###\s+(.+?)\s*$").expect("valid regex"));

pub const CASE_SUMMARY: &str = "Amira Haddad claims unpaid salary, housing allowance, notice pay and \
    end of service gratuity from her former employer Falcon Ridge Logistics Ltd after her \
    dismissal on 31 March 2024.";

#[derive(Default)]
pub struct ScriptedModel {
    reconstruct: Mutex<VecDeque<ModelReply>>,
    calls: Mutex<Vec<Stage>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the Reconstruct reply for the next claimant message.
    pub fn queue_reconstruct(&self, reply: ModelReply) {
        if let Ok(mut queue) = self.reconstruct.lock() {
            queue.push_back(reply);
        }
    }

    /// How many requests `stage` has received.
    pub fn calls(&self, stage: Stage) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|s| **s == stage).count())
            .unwrap_or_default()
    }

    fn next_reconstruct(&self) -> Result<ModelReply, ModelError> {
        let mut queue = self
            .reconstruct
            .lock()
            .map_err(|_| ModelError::Unavailable { reason: "script queue poisoned".to_string() })?;
        Ok(queue.pop_front().unwrap_or_else(|| {
            ModelReply::Text("I'm sorry, I could not tell which part of the form that answers.".to_string())
        }))
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn invoke(&self, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.stage);
        }
        debug!(stage = %request.stage, "scripted model invoked");

        let message = request.messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        let reply = match request.stage {
            Stage::Describe => ModelReply::Text(format!("Summary of the document:\n{message}")),
            Stage::Classify => ModelReply::Structured(classify(message)),
            Stage::Extract => ModelReply::Structured(extract(message)),
            Stage::Combine => ModelReply::Structured(combine(message)),
            Stage::Revise => ModelReply::Structured(revise(message, &request.instructions)),
            Stage::ConflictAudit => ModelReply::Text(conflicts(message, &request.instructions)),
            Stage::ClaimValueAudit => ModelReply::Text(claim_value(message, &request.instructions)),
            Stage::RequiredDocuments => ModelReply::Text(required_documents(&request.instructions)),
            Stage::UnreferencedDocuments => ModelReply::Text(unreferenced(message, &request.instructions)),
            Stage::Reconstruct => self.next_reconstruct()?,
            Stage::Converse => ModelReply::Text(
                "Your claim form is complete. The Registry will review it and contact you about \
                 the next steps."
                    .to_string(),
            ),
            Stage::Checker => ModelReply::Text(
                "Thank you for the documents, Amira. To finish your claim form I still need the \
                 details listed above, starting with the claim value."
                    .to_string(),
            ),
            Stage::Summarize => ModelReply::Text(format!("{CASE_SUMMARY} The claim form has been reviewed with the claimant.")),
        };
        Ok(reply)
    }
}

// ── Stage scripts ─────────────────────────────────────────────────────────────

/// Label the termination letter for the defendant, everything else for the
/// claimant.
fn classify(documents_md: &str) -> Value {
    let details: Vec<Value> = documents_md
        .split("## Document ")
        .skip(1)
        .filter_map(|section| {
            let id = section.split('`').nth(1)?;
            let (label, reason) = if section.contains("NOTICE OF TERMINATION") {
                ("defendant", "Issued by the employer to justify the dismissal")
            } else {
                ("claimant", "Evidences the claimant's employment and unpaid pay")
            };
            Some(json!({ "document_id": id, "label": label, "reason": reason }))
        })
        .collect();
    json!({ "case_summary": CASE_SUMMARY, "details": details })
}

fn extract(text: &str) -> Value {
    if text.contains("EMPLOYMENT CONTRACT") {
        json!({
            "claimant": { "full_name": "Amira Haddad", "additional_claimants": [] },
            "defendant": { "full_name": "Falcon Ridge Logistics Ltd", "additional_defendants": [] },
            "legal_representation": {
                "defendant_details": {
                    "home_or_work_address": "Office 1204, Al Maqam Tower, Abu Dhabi",
                    "contact_email": "hr@falconridge.example",
                    "contact_telephone": "+971 2 555 0142"
                }
            },
            "employment_terms": {
                "employment_agreement_attached": true,
                "rate_of_remuneration": "AED 25,000.00 per month plus AED 8,333.33 housing allowance"
            },
            "jurisdiction": { "grounds_for_claim": "The employer is registered in ADGM" }
        })
    } else if text.contains("NOTICE OF TERMINATION") {
        json!({
            "defendant": { "full_name": "Falcon Ridge Logistics Ltd" },
            "claim_details": {
                "nature_of_claim": "Unpaid wages and end of service entitlements after termination"
            }
        })
    } else if text.contains("PAYSLIP") {
        json!({ "employment_terms": { "rate_of_remuneration": "AED 25,000.00 per month" } })
    } else {
        json!({})
    }
}

/// Merge every JSON block in document order; later non-empty values win.
fn combine(fragments_md: &str) -> Value {
    let mut record = Map::new();
    for block in JSON_BLOCK_RE.captures_iter(fragments_md) {
        if let Ok(Value::Object(fragment)) = serde_json::from_str::<Value>(&block[1]) {
            merge(&mut record, fragment);
        }
    }
    Value::Object(record)
}

fn merge(into: &mut Map<String, Value>, from: Map<String, Value>) {
    for (key, incoming) in from {
        if let (Some(Value::Object(existing)), Value::Object(fields)) = (into.get_mut(&key), &incoming) {
            merge(existing, fields.clone());
            continue;
        }
        if into.contains_key(&key) && is_falsy(&incoming) {
            continue;
        }
        into.insert(key, incoming);
    }
}

/// Fill what the corpus states and the instructions ask for.
fn revise(corpus: &str, instructions: &str) -> Value {
    let officer = "legal_representation.claimant_details.self_represented_or_authorised_officer";
    let mut found = Map::new();
    if corpus.contains("Villa 22, Al Reef") {
        found.insert(format!("{officer}.address_for_service"), json!("Villa 22, Al Reef, Abu Dhabi"));
    }
    if corpus.contains("+971 50 555 0199") {
        found.insert(format!("{officer}.telephone"), json!("+971 50 555 0199"));
    }
    if corpus.contains("amira.haddad@example.com") {
        found.insert(format!("{officer}.email"), json!("amira.haddad@example.com"));
    }
    if let Some(total) = TOTAL_RE.captures(corpus) {
        found.insert("claim_details.claim_value".to_string(), json!(&total[1]));
    }
    found.retain(|key, _| instructions.contains(key.as_str()));
    Value::Object(found)
}

/// Any date in the account that no document mentions is a conflict.
fn conflicts(user_claim: &str, instructions: &str) -> String {
    let findings: Vec<String> = DATE_RE
        .find_iter(user_claim)
        .map(|m| m.as_str())
        .filter(|date| !instructions.contains(date))
        .map(|date| format!("<conflict>The account mentions {date}, which no document confirms</conflict>"))
        .collect();
    if findings.is_empty() {
        "<empty></empty>".to_string()
    } else {
        findings.join("\n")
    }
}

/// Add up the itemised breakdown and compare it with the claimed total.
fn claim_value(user_claim: &str, instructions: &str) -> String {
    let amounts: Vec<String> = BREAKDOWN_RE
        .captures_iter(user_claim)
        .filter_map(|c| parse_amount(&c[1]))
        .map(|a| a.to_string())
        .collect();
    let Some(claimed) = parse_amount(instructions) else {
        return "I could not read the claimed total.".to_string();
    };
    if amounts.is_empty() {
        return "The account has no itemised breakdown to check.".to_string();
    }
    let calculated = match sum_values(&format!("[{}]", amounts.join(", "))) {
        Ok(total) => total,
        Err(e) => return format!("The breakdown could not be added up: {e}"),
    };
    match compare_claim(calculated, claimed) {
        ClaimValueVerdict::Conflict { detail } => format!(
            "<conflict>Claim is incorrect. Claim {claimed:.2}, but calculated {calculated:.2}. {detail}</conflict>"
        ),
        _ => "<correct></correct>".to_string(),
    }
}

fn required_documents(instructions: &str) -> String {
    if instructions.to_lowercase().contains("bank statement") {
        return "<required_documents></required_documents>".to_string();
    }
    "<required_documents>\
     <reason>Bank statements showing that salary for January to March 2024 was not received</reason>\
     </required_documents>"
        .to_string()
}

/// A document counts as referenced when the account uses any longer word
/// of its title.
fn unreferenced(user_claim: &str, instructions: &str) -> String {
    let account = user_claim.to_lowercase();
    let titles: String = TITLE_RE
        .captures_iter(instructions)
        .map(|c| c[1].to_string())
        .filter(|title| {
            !title
                .split_whitespace()
                .filter(|word| word.len() >= 5)
                .any(|word| account.contains(&word.to_lowercase()))
        })
        .map(|title| format!("<document>{title}</document>"))
        .collect();
    format!("<unreferenced_documents>{titles}</unreferenced_documents>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreferenced_lists_titles_the_account_never_uses() {
        let instructions = "Documents:\n## Document 1: `ab12`\n\nSummary of the document:\n### EMPLOYMENT CONTRACT\n\n\
            ## Document 2: `cd34`\n\nSummary of the document:\n### NOTICE OF TERMINATION";
        let reply = unreferenced("My notice period was never paid.", instructions);
        assert_eq!(
            reply,
            "<unreferenced_documents><document>EMPLOYMENT CONTRACT</document></unreferenced_documents>"
        );
    }

    #[test]
    fn combine_merges_fragments_in_order() {
        let md = "### Document 1 / 2\n```json\n{\"a\": {\"b\": \"x\"}, \"c\": \"\"}\n```\n\n---\n\n\
                  ### Document 2 / 2\n```json\n{\"a\": {\"d\": \"y\"}, \"c\": \"z\", \"e\": \"\"}\n```";
        assert_eq!(combine(md), json!({ "a": { "b": "x", "d": "y" }, "c": "z", "e": "" }));
    }

    #[test]
    fn empty_values_never_overwrite() {
        let mut record = json!({ "name": "Amira" }).as_object().cloned().unwrap();
        merge(&mut record, json!({ "name": "" }).as_object().cloned().unwrap());
        assert_eq!(record["name"], "Amira");
    }

    #[test]
    fn claim_value_script_reports_the_difference() {
        let account = "1. Unpaid salary for 2024 **AED 75,000.00**\n2. Gratuity AED 332,174.85\n- **Total claimed: AED 307,174.85**";
        let reply = claim_value(account, "claimed total of AED 307,174.85.");
        assert!(reply.starts_with("<conflict>"));
        assert!(reply.contains("calculated 407174.85"));

        let reply = claim_value(account, "claimed total of AED 407,174.85.");
        assert_eq!(reply, "<correct></correct>");
    }

    #[test]
    fn revise_only_answers_requested_keys() {
        let patch = revise(
            "Total claimed: AED 307,174.85. Reach me on +971 50 555 0199.",
            "Keys:\nclaim_details.claim_value",
        );
        assert_eq!(patch, json!({ "claim_details.claim_value": "AED 307,174.85" }));
    }

    #[test]
    fn unconfirmed_dates_are_conflicts() {
        let reply = conflicts("I started on 1 June 2019.", "Commencement date: 1 June 2018");
        assert!(reply.contains("1 June 2019"));
        assert_eq!(conflicts("I started on 1 June 2018.", "Commencement date: 1 June 2018"), "<empty></empty>");
    }
}
