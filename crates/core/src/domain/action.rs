use serde::{Deserialize, Serialize};

/// One admissible next step as reported by the workflow service, before
/// normalization. `value` and `class_name` are frequently missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawWorkflowAction {
    #[serde(rename = "type", alias = "Type")]
    pub kind: String,
    #[serde(rename = "text", alias = "Text", default)]
    pub label: String,
    #[serde(alias = "Value", default)]
    pub value: Option<String>,
    #[serde(rename = "className", alias = "ClassName", default)]
    pub class_name: Option<String>,
}

/// A normalized workflow action: `value` is always populated and the
/// kind has survived the structural exclusion filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowAction {
    pub kind: String,
    pub label: String,
    pub value: String,
    pub class_name: Option<String>,
}

/// Interpreted result of the approval endpoint's string response. A `$`
/// in the raw string separates the status from a secondary message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub status: String,
    pub additional_info: Option<String>,
}

impl SubmitOutcome {
    /// Splits on the first `$` only; later `$` characters stay part of
    /// the secondary message.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('$') {
            Some((status, info)) => Self {
                status: status.trim().to_string(),
                additional_info: Some(info.trim().to_string()).filter(|info| !info.is_empty()),
            },
            None => Self { status: raw.trim().to_string(), additional_info: None },
        }
    }
}
