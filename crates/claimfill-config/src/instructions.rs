//! Per-stage instruction templates.
//!
//! Each model-backed stage has one template. Placeholders are written as
//! `{name}` and filled by `InstructionSet::render`; braces that do not name
//! a supplied variable are left alone, so JSON examples survive rendering.
//!
//! The defaults below are deliberately short. Deployments override them in
//! the `[instructions]` table of the pipeline TOML.

use serde::{Deserialize, Serialize};

use claimfill_contracts::model::Stage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstructionSet {
    pub describe: String,
    /// Variables: `user_claim`.
    pub classify: String,
    /// Variables: `case_summary`, `classification`, `user_claim`,
    /// `document_description`.
    pub extract: String,
    /// Variables: `case_summary`.
    pub combine: String,
    /// Variables: `missing_keys`.
    pub revise: String,
    /// Variables: `document_descriptions`.
    pub conflict_audit: String,
    /// Variables: `claim_value`, `case_summary`.
    pub claim_value_audit: String,
    /// Variables: `document_descriptions`.
    pub required_documents: String,
    /// Variables: `document_descriptions`.
    pub unreferenced_documents: String,
    /// Variables: `missing_keys`, `all_keys`.
    pub reconstruct: String,
    /// Variables: `case_summary`.
    pub converse: String,
    /// Variables: `missing_keys`.
    pub checker: String,
    pub summarize: String,
}

impl Default for InstructionSet {
    fn default() -> Self {
        Self {
            describe: "Summarize the document for a legal professional. Keep every name, date, \
                amount and reference number exactly as written. Do not infer facts that are \
                not in the text."
                .to_string(),
            classify: "You will receive the claimant's own account and a list of documents, each \
                with an id and a description. Write a short summary of the case, then label \
                every document as supporting the claimant or the defendant. Reply with JSON: \
                {\"case_summary\": \"...\", \"details\": [{\"document_id\": \"...\", \
                \"label\": \"claimant|defendant\", \"reason\": \"...\"}]}.\n\n\
                Claimant's account:\n{user_claim}"
                .to_string(),
            extract: "Fill the JSON template from the document below. Leave a field as an empty \
                string when the document does not state it.\n\nCase summary:\n{case_summary}\n\n\
                This document is classified as: {classification}\n\n\
                Claimant's account:\n{user_claim}\n\n\
                Document description:\n{document_description}"
                .to_string(),
            combine: "Merge the JSON fragments below into one JSON object that follows the \
                template. Prefer values from documents that support the claimant when they \
                disagree.\n\nCase summary:\n{case_summary}"
                .to_string(),
            revise: "Read the documents and return a flat JSON object whose keys are taken from \
                this list and whose values are found in the text. Omit keys you cannot \
                fill.\n\nKeys:\n{missing_keys}"
                .to_string(),
            conflict_audit: "Compare the claimant's account with the documents. Wrap each \
                contradiction in <conflict></conflict>, or reply <empty></empty> when there \
                are none.\n\nDocuments:\n{document_descriptions}"
                .to_string(),
            claim_value_audit: "Check whether the itemised breakdown in the claimant's account \
                adds up to the claimed total of {claim_value}. Reply <correct></correct> when \
                it does, otherwise <conflict>explain the difference</conflict>.\n\n\
                Case summary:\n{case_summary}"
                .to_string(),
            required_documents: "List supporting documents this kind of claim normally needs \
                that are not among the documents provided, each inside \
                <required_documents><reason>...</reason></required_documents>.\n\n\
                Documents:\n{document_descriptions}"
                .to_string(),
            unreferenced_documents: "Find the uploaded documents that the claimant's account \
                never mentions or refers to. Wrap each one's title in <document></document> \
                inside <unreferenced_documents></unreferenced_documents>, and reply with empty \
                <unreferenced_documents></unreferenced_documents> tags when every document is \
                referenced.\n\nDocuments:\n{document_descriptions}"
                .to_string(),
            reconstruct: "The user is answering questions about missing form fields. Return a \
                flat JSON object mapping dotted keys to the values in the reply. Use only keys \
                from this list:\n{missing_keys}\n\nEvery key of the form, for \
                reference:\n{all_keys}"
                .to_string(),
            converse: "The form is complete. Answer the claimant's questions about their case \
                politely and briefly.\n\nCase summary:\n{case_summary}"
                .to_string(),
            checker: "Greet the claimant, thank them for the documents, and ask for the \
                following missing details in plain language:\n{missing_keys}"
                .to_string(),
            summarize: "Rewrite the case summary using the completed record and the \
                conversation so far. Reply with the summary text only."
                .to_string(),
        }
    }
}

impl InstructionSet {
    /// The raw template for `stage`.
    pub fn template(&self, stage: Stage) -> &str {
        match stage {
            Stage::Describe => &self.describe,
            Stage::Classify => &self.classify,
            Stage::Extract => &self.extract,
            Stage::Combine => &self.combine,
            Stage::Revise => &self.revise,
            Stage::ConflictAudit => &self.conflict_audit,
            Stage::ClaimValueAudit => &self.claim_value_audit,
            Stage::RequiredDocuments => &self.required_documents,
            Stage::UnreferencedDocuments => &self.unreferenced_documents,
            Stage::Reconstruct => &self.reconstruct,
            Stage::Converse => &self.converse,
            Stage::Checker => &self.checker,
            Stage::Summarize => &self.summarize,
        }
    }

    /// Fill the template for `stage` with `vars`.
    pub fn render(&self, stage: Stage, vars: &[(&str, &str)]) -> String {
        render_template(self.template(stage), vars)
    }
}

/// Replace each `{name}` in `template` with its value from `vars`.
///
/// Substitution is single-pass: text inserted from a variable is never
/// scanned for further placeholders.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (close, *v))
        });
        match replaced {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
