//! Reference schema templates.
//!
//! Every scalar is a placeholder describing what belongs there; every array
//! holds one representative entry (or sample scalars) that fixes its shape.

use serde_json::{json, Value};

/// Employment claim form. The claim value lives at
/// `claim_details.claim_value`.
pub fn employment_form() -> Value {
    json!({
        "claimant": {
            "full_name": "<FULL_CLAIMANT>",
            "additional_claimants": [
                { "full_name": "<ADDITIONAL_CLAIMANT_FULL_NAME_IF_MORE_THAN_2>" }
            ]
        },
        "defendant": {
            "full_name": "<FULL_DEFENDANT_NAME>",
            "additional_defendants": [
                { "full_name": "<ADDITIONAL_DEFENDANT_FULL_NAME_IF_MORE_THAN_2>" }
            ]
        },
        "legal_representation": {
            "claimant_details": {
                "self_represented_or_authorised_officer": {
                    "address_for_service": "<extracted_claimant_address_for_service>",
                    "telephone": "<extracted_claimant_telephone>",
                    "email": "<extracted_claimant_email_address>",
                    "name_of_authorised_officer": "<extracted_name_of_authorised_officer>",
                    "capacity_to_act_for_claimant": "<extracted_capacity_to_act>"
                },
                "legal_represented_filled_by_laywer": {
                    "legal_representative": "<extracted_laywer_full_name>",
                    "firm": "<extracted_lawyer_firm_name>",
                    "address_for_service": "<extracted_lawyer_address_for_service>",
                    "firm_reference": "<extracted_lawyer_firm_reference_number>",
                    "contact_name": "<extracted_contact_name_or_laywer_name>",
                    "contact_telephone": "<extracted_lawyer_phone>",
                    "contact_email": "<extracted_lawyer_email>"
                }
            },
            "defendant_details": {
                "home_or_work_address": "<extracted_defendant_address>",
                "contact_email": "<extracted_defendant_contact_email>",
                "contact_telephone": "<extracted_defendant_contact_phone>"
            }
        },
        "claim_details": {
            "nature_of_claim": "<Health and Safety>",
            "claim_value": "<10000 AED>",
            "interest_details": "<Rate of the Interest % >",
            "final_orders_sought": ["<extracted_order_1>", "<extracted_order_2>"],
            "particulars_of_claim": {
                "details": ["<PARTICULAR_OF_CLAIM_DETAIL_1>", "<PARTICULAR_OF_CLAIM_DETAIL_2>"],
                "supporting_documents": ["<SUPPORTING_DOCUMENT_1>", "<SUPPORTING_DOCUMENT_2>"]
            }
        },
        "employment_terms": {
            "employment_agreement_attached": true,
            "rate_of_remuneration": "<salary>"
        },
        "jurisdiction": {
            "grounds_for_claim": "<The claim relates to an ADGM entity>"
        },
        "mediation": {
            "preferred": "<extracted_or_user_input_mediation_choice>",
            "reason_if_no": "<user_input_if_required>"
        }
    })
}

/// General claim form with parties as lists. The claim value lives at
/// `claim_details.claim_value_usd`.
pub fn claim_form() -> Value {
    json!({
        "parties": {
            "claimant": [{
                "full_name": "<extracted_claimant_full_name>",
                "address": "<extracted_claimant_address>",
                "telephone": "<extracted_claimant_telephone_number>",
                "email": "<extracted_claimant_email_address>"
            }],
            "defendant": [{
                "full_name": "<extracted_defendant_full_name>",
                "address": "<extracted_defendant_address>",
                "telephone": "<extracted_defendant_telephone_number>",
                "email": "<extracted_defendant_email_address>"
            }]
        },
        "legal_representation": {
            "type": "<extracted_type_of_legal_representation>",
            "legal_representative": {
                "name": "<extracted_legal_representative_full_name>",
                "firm": "<extracted_law_firm_name>",
                "contact_person": "<extracted_contact_person_name>",
                "telephone": "<extracted_legal_representative_telephone_number>",
                "email": "<extracted_legal_representative_email_address>"
            }
        },
        "claim_details": {
            "nature_of_claim": "<extracted_nature_of_claim>",
            "claim_value_usd": "<extracted_total_claim_value_in_usd>",
            "interest_details": "<extracted_interest_rate_and_terms>",
            "final_orders_sought": [
                "<extracted_final_order_1_description>",
                "<extracted_final_order_2_description>"
            ],
            "particulars_of_claim": "<extracted_particulars_of_claim_text>",
            "attached_documents": [
                "<attached_document_filename_or_id_1>",
                "<attached_document_filename_or_id_2>"
            ]
        },
        "employment_terms": {
            "employment_agreement_attached": true,
            "rate_of_remuneration": "<extracted_monthly_or_hourly_salary_amount>"
        }
    })
}

#[cfg(test)]
mod tests {
    use claimfill_schema::{all_keys, validate_template};

    use super::*;

    #[test]
    fn reference_templates_are_valid() {
        validate_template(&employment_form()).unwrap();
        validate_template(&claim_form()).unwrap();
    }

    #[test]
    fn employment_form_leaves() {
        let keys = all_keys(&employment_form());
        assert_eq!(keys.len(), 30);
        assert_eq!(keys[0], "claimant.full_name");
        assert_eq!(keys[1], "claimant.additional_claimants.full_name");
        assert!(keys.contains(&"claim_details.claim_value".to_string()));
        assert!(keys.contains(&"claim_details.particulars_of_claim.supporting_documents".to_string()));
    }

    #[test]
    fn claim_form_list_parties_contribute_representative_leaves() {
        let keys = all_keys(&claim_form());
        assert_eq!(&keys[..4], ["parties.claimant.full_name", "parties.claimant.address", "parties.claimant.telephone", "parties.claimant.email"]);
        assert!(keys.contains(&"claim_details.claim_value_usd".to_string()));
    }
}
