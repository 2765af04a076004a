//! Simulated case files for the employment reference adapter.
//!
//! All data in this module is hardcoded and fictional. The documents stand in
//! for the text a PDF or OCR extractor would hand the pipeline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Value};

use claimfill_contracts::error::{ClaimfillError, ClaimfillResult};
use claimfill_core::traits::DocumentReader;

// ── Case documents ───────────────────────────────────────────────────────────

pub const CONTRACT_PATH: &str = "case-0417/employment_contract.md";
pub const TERMINATION_PATH: &str = "case-0417/termination_letter.md";
pub const PAYSLIP_PATH: &str = "case-0417/payslip_march_2024.md";
/// A scanned PDF no reader in this adapter can open.
pub const SCAN_PATH: &str = "case-0417/bank_statement_scan.pdf";
pub const NARRATIVE_PATH: &str = "case-0417/claims_text.txt";

pub const EMPLOYMENT_CONTRACT: &str = "\
### EMPLOYMENT CONTRACT
This contract is made between Falcon Ridge Logistics Ltd (the Employer), registered in ADGM, \
of Office 1204, Al Maqam Tower, Abu Dhabi, and Amira Haddad (the Employee).
Position: Senior Operations Coordinator
Commencement date: 1 June 2018
Basic salary: AED 25,000.00 per month
Housing allowance: AED 8,333.33 per month
Notice period: two months
Employer contact: hr@falconridge.example, +971 2 555 0142";

pub const TERMINATION_LETTER: &str = "\
### NOTICE OF TERMINATION
From: Falcon Ridge Logistics Ltd, Office 1204, Al Maqam Tower, Abu Dhabi
To: Amira Haddad
Date: 31 March 2024
Your employment is terminated with effect from 31 March 2024 due to restructuring. \
Outstanding entitlements will be settled in accordance with the ADGM Employment Regulations.";

pub const PAYSLIP: &str = "\
### PAYSLIP MARCH 2024
Employee: Amira Haddad
Basic salary: AED 25,000.00
Housing allowance: AED 8,333.33
Status: UNPAID";

/// The claimant's own account. The itemised breakdown adds up to
/// AED 407,174.85 while the stated total is AED 307,174.85, and the start
/// date disagrees with the contract.
pub const NARRATIVE: &str = "\
Unpaid Salary Claim

I worked for Falcon Ridge Logistics Ltd from 1 June 2019 until I was dismissed on 31 March 2024.
My salary for January to March 2024 was never paid and I received no end of service gratuity.
1. Unpaid salary for January to March 2024 AED 75,000.00
2. Unpaid housing allowance AED 25,000.00
3. End of service gratuity AED 262,174.85
4. Notice period pay AED 45,000.00
Total claimed: AED 307,174.85
I live at Villa 22, Al Reef, Abu Dhabi. You can reach me on +971 50 555 0199 or amira.haddad@example.com.";

/// Every readable document, keyed by path.
pub fn case_files() -> HashMap<PathBuf, String> {
    [
        (CONTRACT_PATH, EMPLOYMENT_CONTRACT),
        (TERMINATION_PATH, TERMINATION_LETTER),
        (PAYSLIP_PATH, PAYSLIP),
        (NARRATIVE_PATH, NARRATIVE),
    ]
    .into_iter()
    .map(|(path, text)| (PathBuf::from(path), text.to_string()))
    .collect()
}

/// Reads the fictional case files; anything else fails like an unreadable
/// scan would.
pub struct CaseFileReader {
    files: HashMap<PathBuf, String>,
}

impl CaseFileReader {
    pub fn new() -> Self {
        Self { files: case_files() }
    }
}

impl Default for CaseFileReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentReader for CaseFileReader {
    async fn read(&self, path: &Path) -> ClaimfillResult<String> {
        self.files.get(path).cloned().ok_or_else(|| ClaimfillError::Ingestion {
            path: path.display().to_string(),
            reason: "no text layer: scanned documents need OCR".to_string(),
        })
    }
}

// ── Claimant answers ─────────────────────────────────────────────────────────

/// What the claimant answers when asked for a field, by template path.
///
/// Fields with no entry are answered "Not applicable".
pub fn claimant_answer(path: &str) -> Value {
    match path {
        "claimant.additional_claimants.full_name" => json!("None"),
        "defendant.additional_defendants.full_name" => json!("None"),
        "legal_representation.claimant_details.self_represented_or_authorised_officer.name_of_authorised_officer" => {
            json!("Amira Haddad")
        }
        "legal_representation.claimant_details.self_represented_or_authorised_officer.capacity_to_act_for_claimant" => {
            json!("Self-represented")
        }
        "claim_details.claim_value" => json!("AED 407,174.85"),
        "claim_details.interest_details" => json!("Interest at 5% per annum from 1 April 2024"),
        "claim_details.final_orders_sought" => json!([
            "Payment of unpaid salary and allowances",
            "Payment of end of service gratuity and notice pay"
        ]),
        "claim_details.particulars_of_claim.details" => json!([
            "Salary for January to March 2024 was not paid",
            "No gratuity was paid on termination"
        ]),
        "claim_details.particulars_of_claim.supporting_documents" => json!([
            "Employment contract",
            "Notice of termination",
            "Payslip for March 2024"
        ]),
        "mediation.preferred" => json!("No"),
        "mediation.reason_if_no" => json!("The employer has not responded to previous requests"),
        _ => json!("Not applicable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scanned_documents_cannot_be_read() {
        let reader = CaseFileReader::new();
        assert!(reader.read(Path::new(CONTRACT_PATH)).await.is_ok());

        let err = reader.read(Path::new(SCAN_PATH)).await.unwrap_err();
        assert!(err.to_string().contains("bank_statement_scan.pdf"));
    }

    #[test]
    fn unknown_fields_are_not_applicable() {
        assert_eq!(claimant_answer("mediation.preferred"), json!("No"));
        assert_eq!(claimant_answer("legal_representation.claimant_details.legal_represented_filled_by_laywer.firm"), json!("Not applicable"));
    }
}
