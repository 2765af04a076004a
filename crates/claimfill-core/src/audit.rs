//! Advisory evaluator replies: tag parsing and advisory text.
//!
//! The audit evaluators answer in lightweight tags:
//!
//! - conflicts: `<conflict>..</conflict>` per finding, or `<empty></empty>`
//! - claim value: `<correct></correct>` or `<conflict>..</conflict>`
//! - required documents: `<required_documents><reason>..</reason></required_documents>`
//! - unreferenced uploads: `<unreferenced_documents><document>..</document></unreferenced_documents>`
//!
//! Anything outside the tags is ignored.

use std::sync::LazyLock;

use regex::Regex;

use claimfill_contracts::{
    audit::{AuditReport, ClaimValueVerdict, NOT_EVALUATED},
    verify::VerificationReport,
};

static CONFLICT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<conflict>(.*?)</conflict>").expect("valid regex"));
static CORRECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<correct>\s*</correct>|<correct/>").expect("valid regex"));
static REQUIRED_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<required_documents>(.*?)</required_documents>").expect("valid regex")
});
static REASON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<reason>(.*?)</reason>").expect("valid regex"));
static UNREFERENCED_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<unreferenced_documents>(.*?)</unreferenced_documents>").expect("valid regex")
});
static DOCUMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<document>(.*?)</document>").expect("valid regex"));

/// Every non-empty `<conflict>` body, trimmed, in reply order.
pub fn parse_conflicts(reply: &str) -> Vec<String> {
    CONFLICT_RE
        .captures_iter(reply)
        .filter_map(|c| non_empty(&c[1]))
        .collect()
}

/// Read the claim-value evaluator's verdict.
///
/// A conflict tag wins over a correct tag when a confused reply carries both.
pub fn parse_claim_verdict(reply: &str) -> ClaimValueVerdict {
    if let Some(detail) = parse_conflicts(reply).into_iter().next() {
        return ClaimValueVerdict::Conflict { detail };
    }
    if CORRECT_RE.is_match(reply) {
        return ClaimValueVerdict::Correct;
    }
    ClaimValueVerdict::Undetermined {
        reason: "evaluator reply carried no verdict tag".to_string(),
    }
}

/// Every `<reason>` inside `<required_documents>` blocks.
///
/// A block with text but no `<reason>` tags counts as one reason.
pub fn parse_required_documents(reply: &str) -> Vec<String> {
    let mut reasons = Vec::new();
    for block in REQUIRED_BLOCK_RE.captures_iter(reply) {
        let body = &block[1];
        let before = reasons.len();
        reasons.extend(REASON_RE.captures_iter(body).filter_map(|c| non_empty(&c[1])));
        if reasons.len() == before {
            reasons.extend(non_empty(body));
        }
    }
    reasons
}

/// Every `<document>` inside `<unreferenced_documents>` blocks.
pub fn parse_unreferenced_documents(reply: &str) -> Vec<String> {
    UNREFERENCED_BLOCK_RE
        .captures_iter(reply)
        .flat_map(|block| {
            DOCUMENT_RE
                .captures_iter(&block[1])
                .filter_map(|c| non_empty(&c[1]))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Render the audit and verification results as advisory markdown.
///
/// Returns an empty string when there is nothing to report.
pub fn compose_advisory(report: &AuditReport, verification: &VerificationReport) -> String {
    let mut sections = Vec::new();

    if !report.conflicts.is_empty() {
        sections.push(bullet_section("Conflicts between your account and the documents", &report.conflicts));
    }

    match &report.claim_value {
        ClaimValueVerdict::Conflict { detail } => {
            sections.push(format!("#### Claim value\n{detail}"));
        }
        ClaimValueVerdict::Undetermined { reason } if reason != NOT_EVALUATED => {
            sections.push(format!("#### Claim value\nCould not be checked: {reason}"));
        }
        _ => {}
    }

    if !report.required_documents.is_empty() {
        sections.push(bullet_section("Documents still required", &report.required_documents));
    }

    if !report.unreferenced_documents.is_empty() {
        sections.push(bullet_section(
            "Documents your account does not mention",
            &report.unreferenced_documents,
        ));
    }

    if !verification.failures.is_empty() {
        let findings: Vec<String> = verification
            .failures
            .iter()
            .map(|f| format!("[{}] {}", f.rule_id, f.message))
            .collect();
        sections.push(bullet_section("Record checks", &findings));
    }

    if !report.unavailable.is_empty() {
        sections.push(bullet_section("Checks that could not run", &report.unavailable));
    }

    sections.join("\n\n")
}

fn bullet_section(title: &str, items: &[String]) -> String {
    let mut out = format!("#### {title}");
    for item in items {
        out.push_str("\n- ");
        out.push_str(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use claimfill_contracts::verify::VerificationFailure;

    use super::*;

    #[test]
    fn conflicts_are_extracted_in_order() {
        let reply = "Review done.\n<conflict>Employer name differs</conflict>\n<conflict> Start date is 2021 in the contract </conflict>";
        assert_eq!(
            parse_conflicts(reply),
            vec!["Employer name differs", "Start date is 2021 in the contract"]
        );
    }

    #[test]
    fn empty_tag_means_no_conflicts() {
        assert!(parse_conflicts("<empty></empty>").is_empty());
    }

    #[test]
    fn claim_verdicts() {
        assert_eq!(parse_claim_verdict("<correct></correct>"), ClaimValueVerdict::Correct);

        let conflict = parse_claim_verdict(
            "<conflict>Claim is incorrect. Claim 307174.85, but calculated 407174.85</conflict>",
        );
        assert!(conflict.is_conflict());

        assert!(matches!(
            parse_claim_verdict("I think it is fine."),
            ClaimValueVerdict::Undetermined { .. }
        ));
    }

    #[test]
    fn required_document_reasons() {
        let reply = "<required_documents>\n  <reason>Salary slips for the unpaid months</reason>\n  <reason>Visa cancellation notice</reason>\n</required_documents>";
        assert_eq!(
            parse_required_documents(reply),
            vec!["Salary slips for the unpaid months", "Visa cancellation notice"]
        );
        assert!(parse_required_documents("<required_documents></required_documents>").is_empty());
    }

    #[test]
    fn unreferenced_document_titles() {
        let reply = "Checked.\n<unreferenced_documents>\n  <document>Employment contract</document>\n  <document> </document>\n</unreferenced_documents>";
        assert_eq!(parse_unreferenced_documents(reply), vec!["Employment contract"]);
        assert!(parse_unreferenced_documents("<unreferenced_documents></unreferenced_documents>").is_empty());
        assert!(parse_unreferenced_documents("<document>outside any block</document>").is_empty());
    }

    #[test]
    fn advisory_is_empty_when_nothing_to_report() {
        let report = AuditReport { claim_value: ClaimValueVerdict::Correct, ..Default::default() };
        assert!(compose_advisory(&report, &VerificationReport { passed: true, failures: vec![] }).is_empty());
    }

    #[test]
    fn advisory_lists_every_finding() {
        let report = AuditReport {
            conflicts: vec!["Employer name differs".to_string()],
            claim_value: ClaimValueVerdict::Conflict { detail: "Off by 100,000.00".to_string() },
            required_documents: vec!["Salary slips".to_string()],
            unreferenced_documents: vec!["Bonus policy".to_string()],
            unavailable: vec!["conflict_audit: model unavailable: timeout".to_string()],
        };
        let verification = VerificationReport {
            passed: false,
            failures: vec![VerificationFailure {
                rule_id: "no-placeholders".to_string(),
                message: "placeholder left at 'mediation.preferred'".to_string(),
            }],
        };

        let text = compose_advisory(&report, &verification);
        assert!(text.contains("- Employer name differs"));
        assert!(text.contains("Off by 100,000.00"));
        assert!(text.contains("- Salary slips"));
        assert!(text.contains("#### Documents your account does not mention\n- Bonus policy"));
        assert!(text.contains("[no-placeholders]"));
        assert!(text.contains("model unavailable"));
    }
}
