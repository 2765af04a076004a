//! Test doubles shared by the orchestrator and repair-loop tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use claimfill_config::PipelineConfig;
use claimfill_contracts::{
    error::{ClaimfillError, ClaimfillResult},
    model::{ModelError, ModelReply, ModelRequest, Stage},
    pipeline::StageRecord,
    verify::{RecordSchema, VerificationReport},
};

use crate::{
    orchestrator::{Collaborators, Pipeline},
    traits::{DocumentReader, JournalWriter, ModelClient, Verifier},
};

type Script = Box<dyn Fn(&ModelRequest) -> Result<ModelReply, ModelError> + Send + Sync>;

/// A model that answers from a closure and counts calls per stage.
pub struct ScriptedModel {
    script: Script,
    calls: Mutex<Vec<Stage>>,
}

impl ScriptedModel {
    pub fn new(
        script: impl Fn(&ModelRequest) -> Result<ModelReply, ModelError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self { script: Box::new(script), calls: Mutex::new(vec![]) })
    }

    pub fn calls(&self, stage: Stage) -> usize {
        self.calls.lock().unwrap().iter().filter(|s| **s == stage).count()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn invoke(&self, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        self.calls.lock().unwrap().push(request.stage);
        (self.script)(request)
    }
}

pub struct MapReader(pub HashMap<PathBuf, String>);

impl MapReader {
    pub fn with(files: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self(files.iter().map(|(p, t)| (PathBuf::from(p), t.to_string())).collect()))
    }
}

#[async_trait]
impl DocumentReader for MapReader {
    async fn read(&self, path: &Path) -> ClaimfillResult<String> {
        self.0.get(path).cloned().ok_or_else(|| ClaimfillError::Ingestion {
            path: path.display().to_string(),
            reason: "unsupported file".to_string(),
        })
    }
}

/// A journal that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingJournal {
    pub records: Mutex<Vec<StageRecord>>,
    pub finalized: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingJournal {
    pub fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true, ..Default::default() })
    }
}

impl JournalWriter for RecordingJournal {
    fn write(&self, _case_id: &str, record: &StageRecord) -> ClaimfillResult<()> {
        if self.fail {
            return Err(ClaimfillError::JournalWriteFailed { reason: "disk full".to_string() });
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn finalize(&self, case_id: &str) -> ClaimfillResult<()> {
        self.finalized.lock().unwrap().push(case_id.to_string());
        Ok(())
    }
}

pub struct PassingVerifier;

impl Verifier for PassingVerifier {
    fn verify(&self, _record: &Value, _schema: &RecordSchema) -> ClaimfillResult<VerificationReport> {
        Ok(VerificationReport { passed: true, failures: vec![] })
    }
}

pub fn template() -> Value {
    json!({
        "claimant": { "full_name": "Full name of the claimant" },
        "defendant": { "full_name": "Full name of the defendant" },
        "claim_details": {
            "claim_value": "Total amount claimed",
            "final_orders_sought": ["Order sought"]
        }
    })
}

pub fn schema() -> RecordSchema {
    RecordSchema { schema_id: "test-record".to_string(), json_schema: Value::Null, rules: vec![] }
}

pub fn text(s: &str) -> Result<ModelReply, ModelError> {
    Ok(ModelReply::Text(s.to_string()))
}

pub fn structured(v: Value) -> Result<ModelReply, ModelError> {
    Ok(ModelReply::Structured(v))
}

pub fn pipeline(
    model: Arc<ScriptedModel>,
    reader: Arc<MapReader>,
    journal: Arc<RecordingJournal>,
) -> Pipeline {
    Pipeline::new(
        template(),
        &PipelineConfig::default(),
        schema(),
        Collaborators { model, reader, journal, verifier: Arc::new(PassingVerifier) },
    )
    .unwrap()
}
