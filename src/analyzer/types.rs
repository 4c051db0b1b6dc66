use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The record returned by the analysis service. Fields are kept as raw JSON
/// values so one missing or oddly typed field never fails the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub color: Option<Value>,
    #[serde(default)]
    pub shape: Option<Value>,
    #[serde(default)]
    pub size_mm: Option<Value>,
    #[serde(default)]
    pub purity: Option<Value>,
    #[serde(default)]
    pub health: Option<Value>,
    #[serde(default)]
    pub germination_rate: Option<Value>,
    #[serde(default)]
    pub object_name: Option<Value>,
}

impl AnalysisResult {
    /// Every field present and non-null.
    pub fn is_complete(&self) -> bool {
        self.labeled_fields()
            .iter()
            .all(|(_, value)| matches!(value, Some(v) if !v.is_null()))
    }

    /// Display labels paired with their values, in display order.
    pub fn labeled_fields(&self) -> [(&'static str, Option<&Value>); 7] {
        [
            ("Color", self.color.as_ref()),
            ("Shape", self.shape.as_ref()),
            ("Size (mm)", self.size_mm.as_ref()),
            ("Purity", self.purity.as_ref()),
            ("Health", self.health.as_ref()),
            ("Germination Rate (%)", self.germination_rate.as_ref()),
            ("Name", self.object_name.as_ref()),
        ]
    }
}

/// A file picked by the user, held only for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}
