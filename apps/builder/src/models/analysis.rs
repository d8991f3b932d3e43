use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw result of the upstream resume analysis service.
///
/// The shape varies by service version, so it is kept as untyped JSON and only
/// interpreted by `document::normalize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisPayload(pub Value);

impl AnalysisPayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The object holding resume fields: `parsed_data` when the analysis
    /// envelope is present, otherwise the payload itself.
    pub fn fields(&self) -> &Value {
        match self.0.get("parsed_data") {
            Some(inner) if inner.is_object() => inner,
            _ => &self.0,
        }
    }

    pub fn ats_score(&self) -> Option<f64> {
        self.0.get("ats_score").and_then(Value::as_f64)
    }
}

impl From<Value> for AnalysisPayload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
