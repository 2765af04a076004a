//! Markdown views of documents and records.
//!
//! These are the context blocks the stage adapters hand to the model, plus a
//! human-readable summary of the working record.

use serde_json::Value;

use claimfill_contracts::document::DocumentUnit;
use claimfill_schema::walker::is_unfilled_scalar;

/// One `## Document n: `id`` section per unit with its description.
///
/// This is the classifier's view: ids are shown so the reply can refer back
/// to them.
pub fn documents_markdown(units: &[&DocumentUnit]) -> String {
    let mut lines = vec!["# Document Descriptions\n".to_string()];
    for (i, unit) in units.iter().enumerate() {
        lines.push(format!("## Document {}: `{}`\n", i + 1, unit.id));
        lines.push(format!(
            "{}\n",
            unit.description.as_deref().unwrap_or("No description available.")
        ));
    }
    lines.join("\n")
}

/// Per-document sections with classification and description, optionally
/// followed by each unit's fragment as a JSON block.
///
/// Combine sees the fragments; Revise and the audits see text only.
pub fn fragments_markdown(units: &[&DocumentUnit], include_json: bool) -> String {
    let total = units.len();
    units
        .iter()
        .enumerate()
        .map(|(i, unit)| {
            let label = unit
                .classification
                .as_ref()
                .map(|c| c.label.as_str())
                .unwrap_or("unclassified");
            let mut section = format!(
                "### Document {} / {}\n**Classification:** `{}`\n**Description:**\n{}\n",
                i + 1,
                total,
                label,
                unit.description.as_deref().unwrap_or_default()
            );
            if include_json {
                let json = unit
                    .fragment
                    .as_ref()
                    .and_then(|f| serde_json::to_string_pretty(f).ok())
                    .unwrap_or_default();
                section.push_str(&format!(
                    "\n\n##### **Structured JSON Output:**\n```json\n{json}\n```"
                ));
            }
            section.trim().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Render `record` following the layout of `template`.
///
/// Top-level sections become `###` headings and nested keys become
/// indented bullets labelled in title case. Leaves the record does not fill
/// are shown as `N/A`; list items are rendered once per record entry.
pub fn record_markdown(template: &Value, record: &Value) -> String {
    let mut out = String::new();
    let Some(sections) = template.as_object() else {
        return out;
    };

    for (key, schema) in sections {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("### {}\n", title_case(key)));
        let data = record.get(key).unwrap_or(&Value::Null);
        match schema {
            Value::Object(_) => render_fields(schema, data, 0, &mut out),
            _ => render_leaf(key, schema, data, 0, &mut out),
        }
    }
    out
}

fn render_fields(schema: &Value, data: &Value, depth: usize, out: &mut String) {
    let Some(fields) = schema.as_object() else {
        return;
    };
    for (key, child_schema) in fields {
        let child = data.get(key).unwrap_or(&Value::Null);
        render_leaf(key, child_schema, child, depth, out);
    }
}

fn render_leaf(key: &str, schema: &Value, data: &Value, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let label = title_case(key);

    match schema {
        Value::Object(_) => {
            out.push_str(&format!("{indent}- **{label}:**\n"));
            render_fields(schema, data, depth + 1, out);
        }
        Value::Array(items) => {
            out.push_str(&format!("{indent}- **{label}:**\n"));
            let entries = data.as_array().filter(|a| !a.is_empty());
            match (items.first(), entries) {
                (Some(rep @ Value::Object(_)), Some(entries)) => {
                    for entry in entries {
                        render_fields(rep, entry, depth + 1, out);
                    }
                }
                (_, Some(entries)) => {
                    for entry in entries {
                        out.push_str(&format!("{indent}  - {}\n", display_value(entry)));
                    }
                }
                (_, None) => out.push_str(&format!("{indent}  - N/A\n")),
            }
        }
        _ => out.push_str(&format!("{indent}- **{label}:** {}\n", display_value(data))),
    }
}

fn display_value(value: &Value) -> String {
    if is_unfilled_scalar(value) {
        return "N/A".to_string();
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        other => other.to_string(),
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use claimfill_contracts::document::{DocumentClassification, DocumentId, PartyLabel};

    use super::*;

    fn unit(id: &str, description: &str) -> DocumentUnit {
        let mut unit = DocumentUnit::ingested(DocumentId(id.to_string()), "doc.md", "text".to_string());
        unit.description = Some(description.to_string());
        unit
    }

    #[test]
    fn documents_markdown_lists_ids_and_descriptions() {
        let a = unit("ab12", "Employment contract");
        let b = unit("cd34", "Termination letter");
        let md = documents_markdown(&[&a, &b]);
        assert!(md.starts_with("# Document Descriptions"));
        assert!(md.contains("## Document 1: `ab12`"));
        assert!(md.contains("## Document 2: `cd34`"));
        assert!(md.contains("Termination letter"));
    }

    #[test]
    fn fragments_markdown_includes_json_only_when_asked() {
        let mut a = unit("ab12", "Employment contract");
        a.classification = Some(DocumentClassification {
            label: PartyLabel::Claimant,
            reason: "signed by both".to_string(),
        });
        a.fragment = Some(json!({ "claimant": { "full_name": "Jane Doe" } }));

        let with_json = fragments_markdown(&[&a], true);
        assert!(with_json.contains("### Document 1 / 1"));
        assert!(with_json.contains("`claimant`"));
        assert!(with_json.contains("```json"));
        assert!(with_json.contains("Jane Doe"));

        let text_only = fragments_markdown(&[&a], false);
        assert!(!text_only.contains("```json"));
    }

    #[test]
    fn record_markdown_follows_template_and_marks_gaps() {
        let template = json!({
            "claimant": {
                "full_name": "",
                "additional_claimants": [{ "full_name": "" }]
            },
            "employment_terms": { "employment_agreement_attached": true },
            "claim_details": { "final_orders_sought": [""] }
        });
        let record = json!({
            "claimant": { "full_name": "Jane Doe", "additional_claimants": [] },
            "employment_terms": { "employment_agreement_attached": false }
        });

        let md = record_markdown(&template, &record);
        assert!(md.contains("### Claimant"));
        assert!(md.contains("- **Full Name:** Jane Doe"));
        assert!(md.contains("- **Additional Claimants:**\n  - N/A"));
        assert!(md.contains("- **Employment Agreement Attached:** No"));
        assert!(md.contains("### Claim Details\n- **Final Orders Sought:**\n  - N/A"));
    }
}
