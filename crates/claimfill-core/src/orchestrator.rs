//! The claimfill pipeline: documents in, one schema-conformant record out.
//!
//! The orchestrator enforces the stage order:
//!
//!   Ingest → Describe → Classify → Extract → Combine → Diff → Revise → Inject
//!     → Verify → Audit → Complete
//!
//! Within Describe and Extract, documents are processed concurrently and
//! their results are applied by position. A failure scoped to one document
//! marks that unit and the run carries on; Classify, Combine and Revise
//! failures abort the run. Every transition is journaled before the next
//! stage starts, and a journal write failure aborts the run as well.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use claimfill_config::{PipelineConfig, PipelineSettings};
use claimfill_contracts::{
    audit::{AuditReport, ClaimValueVerdict},
    document::DocumentUnit,
    error::{ClaimfillError, ClaimfillResult},
    pipeline::{CaseFlags, JournalPhase, PipelineStage, ProcessOutcome, StageOutcome, StageRecord},
    verify::{RecordSchema, VerificationFailure, VerificationReport},
};
use claimfill_schema::{all_keys, find_missing, inject, resolve, validate_template, walker};

use crate::{
    audit::{
        compose_advisory, parse_claim_verdict, parse_conflicts, parse_required_documents,
        parse_unreferenced_documents,
    },
    fanout::ordered,
    ingest::DocumentIngestor,
    render::{documents_markdown, fragments_markdown, record_markdown},
    stages::Stages,
    traits::{DocumentReader, JournalWriter, ModelClient, Verifier},
};

/// The external capabilities a pipeline is built from.
pub struct Collaborators {
    pub model: Arc<dyn ModelClient>,
    pub reader: Arc<dyn DocumentReader>,
    pub journal: Arc<dyn JournalWriter>,
    pub verifier: Arc<dyn Verifier>,
}

/// Drives one case at a time through the document pipeline and the repair
/// loop.
///
/// A `Pipeline` holds no case state. Callers pass the case in and get the
/// updated values back; see `CaseSession` for a single-writer wrapper.
pub struct Pipeline {
    pub(crate) template: Value,
    pub(crate) all_keys: Vec<String>,
    pub(crate) settings: PipelineSettings,
    pub(crate) stages: Stages,
    ingestor: DocumentIngestor,
    pub(crate) journal: Arc<dyn JournalWriter>,
    verifier: Arc<dyn Verifier>,
    schema: RecordSchema,
}

impl Pipeline {
    /// Build a pipeline for one schema template.
    ///
    /// Returns `InvalidTemplate` when the template breaks the template
    /// invariants and `ConfigError` for out-of-range settings.
    pub fn new(
        template: Value,
        config: &PipelineConfig,
        schema: RecordSchema,
        parts: Collaborators,
    ) -> ClaimfillResult<Self> {
        validate_template(&template)?;
        config.validate()?;

        let settings = config.pipeline.clone();
        let ingestor = DocumentIngestor::new(
            parts.reader,
            settings.document_id_length,
            settings.max_concurrency,
            settings.narrative_sentinel.clone(),
        );
        let stages = Stages::new(parts.model, config.instructions.clone(), &template);

        Ok(Self {
            all_keys: all_keys(&template),
            template,
            settings,
            stages,
            ingestor,
            journal: parts.journal,
            verifier: parts.verifier,
            schema,
        })
    }

    pub fn template(&self) -> &Value {
        &self.template
    }

    /// Every leaf path of the template, in declaration order.
    pub fn all_keys(&self) -> &[String] {
        &self.all_keys
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Markdown view of `record` laid out like the template.
    pub fn record_markdown(&self, record: &Value) -> String {
        record_markdown(&self.template, record)
    }

    /// Run the document pipeline over `paths`.
    ///
    /// The narrative, if any, is the path whose file name equals the
    /// configured sentinel.
    pub async fn process(&self, case_id: &str, paths: &[PathBuf]) -> ClaimfillResult<ProcessOutcome> {
        let units = self.ingestor.ingest(paths).await;
        self.run(case_id, units).await
    }

    /// Run the document pipeline with the narrative supplied as text.
    ///
    /// Typed text takes precedence over a narrative file among `paths`.
    pub async fn process_case(
        &self,
        case_id: &str,
        narrative: &str,
        paths: &[PathBuf],
    ) -> ClaimfillResult<ProcessOutcome> {
        let typed = Some(narrative).filter(|text| !text.trim().is_empty());
        let units = self.ingestor.ingest_case(typed, paths).await;
        self.run(case_id, units).await
    }

    async fn run(&self, case_id: &str, mut units: Vec<DocumentUnit>) -> ClaimfillResult<ProcessOutcome> {
        info!(case_id = %case_id, documents = units.len(), "pipeline run starting");

        // ── Ingest ───────────────────────────────────────────────────────────
        let failed = count_failed(&units);
        self.journal_stage(
            case_id,
            PipelineStage::Ingest,
            degraded_if(failed, "documents could not be read"),
            json!({ "documents": units.len(), "failed": failed }),
        )?;

        // ── Describe ─────────────────────────────────────────────────────────
        let descriptions = ordered(
            units.iter().map(|unit| async move {
                if unit.is_failed() {
                    return None;
                }
                Some(self.stages.describe(unit).await)
            }),
            self.settings.max_concurrency,
        )
        .await;
        for (unit, result) in units.iter_mut().zip(descriptions) {
            match result {
                Some(Ok(description)) => unit.description = Some(description),
                Some(Err(e)) => {
                    warn!(case_id = %case_id, document_id = %unit.id, error = %e, "describe failed");
                    unit.fail(e.to_string());
                }
                None => {}
            }
        }
        let failed = count_failed(&units);
        self.journal_stage(
            case_id,
            PipelineStage::Describe,
            degraded_if(failed, "documents have no description"),
            json!({ "described": units.len() - failed, "failed": failed }),
        )?;

        // Narratives sit out Classify and Extract; the last one, which is the
        // typed text when there is any, is the claimant's account of the case.
        let (mut narratives, mut units): (Vec<_>, Vec<_>) = units
            .into_iter()
            .partition(|u| u.is_narrative(&self.settings.narrative_sentinel));
        let narrative = narratives.pop();
        if !narratives.is_empty() {
            warn!(case_id = %case_id, ignored = narratives.len(), "more than one narrative supplied");
        }
        let user_claim = narrative.as_ref().map(user_claim_text).unwrap_or_default();
        debug!(case_id = %case_id, has_narrative = narrative.is_some(), "narrative separated");

        // ── Classify ─────────────────────────────────────────────────────────
        let documents_md = {
            let healthy: Vec<&DocumentUnit> = units.iter().filter(|u| !u.is_failed()).collect();
            if healthy.is_empty() {
                return Err(self.abort(case_id, PipelineStage::Classify, ClaimfillError::NoUsableDocuments));
            }
            documents_markdown(&healthy)
        };
        let analysis = match self.stages.classify(&user_claim, &documents_md).await {
            Ok(analysis) => analysis,
            Err(e) => return Err(self.abort(case_id, PipelineStage::Classify, e)),
        };
        let mut labelled = 0;
        for unit in units.iter_mut().filter(|u| !u.is_failed()) {
            unit.classification = analysis.classification_for(&unit.id);
            if unit.classification.is_some() {
                labelled += 1;
            }
        }
        self.journal_stage(
            case_id,
            PipelineStage::Classify,
            StageOutcome::Completed,
            json!({ "labelled": labelled, "details": analysis.details.len() }),
        )?;
        let case_summary = analysis.case_summary;

        // ── Extract ──────────────────────────────────────────────────────────
        let fragments = ordered(
            units.iter().map(|unit| {
                let case_summary = case_summary.as_str();
                let user_claim = user_claim.as_str();
                async move {
                    if unit.is_failed() {
                        return None;
                    }
                    Some(self.stages.extract(unit, case_summary, user_claim).await)
                }
            }),
            self.settings.max_concurrency,
        )
        .await;
        for (unit, result) in units.iter_mut().zip(fragments) {
            match result {
                Some(Ok(fragment)) => unit.fragment = Some(fragment),
                Some(Err(e)) => {
                    warn!(case_id = %case_id, document_id = %unit.id, error = %e, "extract failed");
                    unit.fail(e.to_string());
                }
                None => {}
            }
        }
        let populated = units.iter().filter(|u| u.fragment.is_some()).count();
        self.journal_stage(
            case_id,
            PipelineStage::Extract,
            degraded_if(units.len() - populated, "documents produced no fragment"),
            json!({ "fragments": populated, "failed": units.len() - populated }),
        )?;

        // ── Combine ──────────────────────────────────────────────────────────
        if populated == 0 {
            return Err(self.abort(case_id, PipelineStage::Combine, ClaimfillError::NoUsableDocuments));
        }
        let fragments_md = {
            let with_fragments: Vec<&DocumentUnit> =
                units.iter().filter(|u| u.fragment.is_some()).collect();
            fragments_markdown(&with_fragments, true)
        };
        let mut record = match self.stages.combine(&fragments_md, &case_summary).await {
            Ok(record) => record,
            Err(e) => return Err(self.abort(case_id, PipelineStage::Combine, e)),
        };
        self.journal_stage(case_id, PipelineStage::Combine, StageOutcome::Completed, json!({ "fragments": populated }))?;

        // ── Diff ─────────────────────────────────────────────────────────────
        let mut missing = find_missing(&self.template, &record, "");
        self.journal_missing(case_id, PipelineStage::Diff, missing.len())?;

        // ── Revise → Inject → Diff ───────────────────────────────────────────
        let corpus = {
            let mut readable: Vec<&DocumentUnit> =
                units.iter().filter(|u| u.description.is_some()).collect();
            readable.extend(narrative.iter().filter(|u| u.description.is_some()));
            fragments_markdown(&readable, false)
        };
        let mut passes = 0;
        while passes < self.settings.revise_passes && !missing.is_empty() {
            let patch = match self.stages.revise(&missing, &corpus).await {
                Ok(patch) => patch,
                Err(e) => return Err(self.abort(case_id, PipelineStage::Revise, e)),
            };
            passes += 1;
            self.journal_stage(
                case_id,
                PipelineStage::Revise,
                StageOutcome::Completed,
                json!({ "pass": passes, "patched": patch.len() }),
            )?;

            record = inject(&patch, &record);
            self.journal_stage(
                case_id,
                PipelineStage::Inject,
                StageOutcome::Completed,
                json!({ "paths": patch.keys().collect::<Vec<_>>() }),
            )?;

            missing = find_missing(&self.template, &record, "");
            self.journal_missing(case_id, PipelineStage::Diff, missing.len())?;
        }
        if passes == 0 {
            self.journal_stage(case_id, PipelineStage::Revise, StageOutcome::Skipped, Value::Null)?;
        }

        // ── Verify ───────────────────────────────────────────────────────────
        let verification = self.verify_record(case_id, &record);
        self.journal_stage(
            case_id,
            PipelineStage::Verify,
            if verification.passed {
                StageOutcome::Completed
            } else {
                StageOutcome::Degraded { reason: "record verification reported findings".to_string() }
            },
            json!({ "findings": verification.failures.len() }),
        )?;

        // ── Audit ────────────────────────────────────────────────────────────
        let audit = self.audit(case_id, &user_claim, &documents_md, &case_summary, &record).await;
        if audit.claim_value.is_conflict() {
            move_to_front(&mut missing, &self.settings.claim_value_path);
        }
        let advisory = compose_advisory(&audit, &verification);
        self.journal_stage(
            case_id,
            PipelineStage::Audit,
            if audit.unavailable.is_empty() {
                StageOutcome::Completed
            } else {
                StageOutcome::Degraded { reason: audit.unavailable.join("; ") }
            },
            json!({
                "conflicts": audit.conflicts.len(),
                "claim_value_conflict": audit.claim_value.is_conflict(),
                "required_documents": audit.required_documents.len(),
                "unreferenced_documents": audit.unreferenced_documents.len(),
            }),
        )?;

        // ── Complete ─────────────────────────────────────────────────────────
        units.extend(narratives);
        units.extend(narrative);
        let flags = CaseFlags {
            documents_total: units.len(),
            documents_failed: count_failed(&units),
            conflicts_detected: !audit.conflicts.is_empty(),
            claim_value_conflict: audit.claim_value.is_conflict(),
            missing_documents: !audit.required_documents.is_empty(),
            unreferenced_documents: !audit.unreferenced_documents.is_empty(),
            schema_findings: verification.failures.len(),
            complete: missing.is_empty(),
        };
        let document_digest = {
            let described: Vec<&DocumentUnit> =
                units.iter().filter(|u| u.description.is_some()).collect();
            documents_markdown(&described)
        };

        self.journal
            .write(
                case_id,
                &StageRecord::new(
                    JournalPhase::Pipeline(PipelineStage::Complete),
                    StageOutcome::Completed,
                    serde_json::to_value(&flags).unwrap_or(Value::Null),
                )
                .with_missing(missing.len()),
            )?;
        self.journal.finalize(case_id)?;

        info!(
            case_id = %case_id,
            missing = missing.len(),
            documents_failed = flags.documents_failed,
            claim_value_conflict = flags.claim_value_conflict,
            "pipeline run complete"
        );

        Ok(ProcessOutcome {
            record,
            missing_keys: missing,
            advisory,
            flags,
            documents: units,
            case_summary,
            document_digest,
        })
    }

    fn verify_record(&self, case_id: &str, record: &Value) -> VerificationReport {
        match self.verifier.verify(record, &self.schema) {
            Ok(report) => report,
            Err(e) => {
                warn!(case_id = %case_id, error = %e, "record verifier failed");
                VerificationReport {
                    passed: false,
                    failures: vec![VerificationFailure {
                        rule_id: "verifier".to_string(),
                        message: e.to_string(),
                    }],
                }
            }
        }
    }

    /// Run the four evaluators concurrently. None of them can fail the run.
    async fn audit(
        &self,
        case_id: &str,
        user_claim: &str,
        documents_md: &str,
        case_summary: &str,
        record: &Value,
    ) -> AuditReport {
        let mut report = AuditReport::default();
        let claim_value = resolve(record, &self.settings.claim_value_path)
            .filter(|v| !walker::is_falsy(v))
            .map(display_value);

        let conflicts = async {
            if user_claim.is_empty() {
                return None;
            }
            Some(self.stages.conflict_audit(user_claim, documents_md).await)
        };
        let claim = async {
            match (&claim_value, user_claim.is_empty()) {
                (Some(value), false) => {
                    Some(self.stages.claim_value_audit(user_claim, value, case_summary).await)
                }
                _ => None,
            }
        };
        let required = self.stages.required_documents(user_claim, documents_md);
        let unreferenced = async {
            if user_claim.is_empty() {
                return None;
            }
            Some(self.stages.unreferenced_documents(user_claim, documents_md).await)
        };

        let (conflicts, claim, required, unreferenced) =
            futures::join!(conflicts, claim, required, unreferenced);

        match conflicts {
            Some(Ok(reply)) => report.conflicts = parse_conflicts(&reply),
            Some(Err(e)) => report.unavailable.push(e.to_string()),
            None => {}
        }

        report.claim_value = match claim {
            Some(Ok(reply)) => parse_claim_verdict(&reply),
            Some(Err(e)) => {
                report.unavailable.push(e.to_string());
                ClaimValueVerdict::Undetermined { reason: "evaluator unavailable".to_string() }
            }
            None if user_claim.is_empty() => {
                ClaimValueVerdict::Undetermined { reason: "no narrative was supplied".to_string() }
            }
            None => ClaimValueVerdict::Undetermined { reason: "claim value is not filled yet".to_string() },
        };

        match required {
            Ok(reply) => report.required_documents = parse_required_documents(&reply),
            Err(e) => report.unavailable.push(e.to_string()),
        }

        match unreferenced {
            Some(Ok(reply)) => report.unreferenced_documents = parse_unreferenced_documents(&reply),
            Some(Err(e)) => report.unavailable.push(e.to_string()),
            None => {}
        }

        if !report.unavailable.is_empty() {
            warn!(case_id = %case_id, unavailable = report.unavailable.len(), "some audit evaluators failed");
        }
        report
    }

    // ── Journal helpers ──────────────────────────────────────────────────────

    fn journal_stage(
        &self,
        case_id: &str,
        stage: PipelineStage,
        outcome: StageOutcome,
        detail: Value,
    ) -> ClaimfillResult<()> {
        debug!(case_id = %case_id, stage = ?stage, outcome = ?outcome, "stage finished");
        self.journal
            .write(case_id, &StageRecord::new(JournalPhase::Pipeline(stage), outcome, detail))
    }

    fn journal_missing(&self, case_id: &str, stage: PipelineStage, missing: usize) -> ClaimfillResult<()> {
        debug!(case_id = %case_id, stage = ?stage, missing, "missing keys computed");
        self.journal.write(
            case_id,
            &StageRecord::new(JournalPhase::Pipeline(stage), StageOutcome::Completed, Value::Null)
                .with_missing(missing),
        )
    }

    /// Journal a fatal stage failure and hand the error back for returning.
    ///
    /// A journal failure here replaces the original error.
    fn abort(&self, case_id: &str, stage: PipelineStage, err: ClaimfillError) -> ClaimfillError {
        warn!(case_id = %case_id, stage = ?stage, error = %err, "pipeline run aborted");
        let record = StageRecord::new(
            JournalPhase::Pipeline(stage),
            StageOutcome::Failed { reason: err.to_string() },
            Value::Null,
        );
        match self.journal.write(case_id, &record) {
            Ok(()) => err,
            Err(journal_err) => journal_err,
        }
    }
}

/// Move `path` to the front of `missing`, dropping any other occurrence.
pub(crate) fn move_to_front(missing: &mut Vec<String>, path: &str) {
    missing.retain(|k| k != path);
    missing.insert(0, path.to_string());
}

fn user_claim_text(unit: &DocumentUnit) -> String {
    unit.description
        .clone()
        .or_else(|| unit.raw_text.clone())
        .unwrap_or_default()
}

fn count_failed(units: &[DocumentUnit]) -> usize {
    units.iter().filter(|u| u.is_failed()).count()
}

fn degraded_if(failed: usize, what: &str) -> StageOutcome {
    if failed == 0 {
        StageOutcome::Completed
    } else {
        StageOutcome::Degraded { reason: format!("{failed} {what}") }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
