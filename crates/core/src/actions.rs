//! Normalization of the workflow service's raw action list into the
//! clean, filtered set exposed to the action buttons.

use crate::domain::action::{RawWorkflowAction, WorkflowAction};

/// Action kinds structurally excluded from this workflow surface no
/// matter what the service returns.
const EXCLUDED_KINDS: [&str; 2] = ["send back", "return"];

/// Fixed type→value mapping used when the service omits an action value.
pub fn default_value_for(kind: &str) -> &'static str {
    match normalize_key(kind).as_str() {
        "approve" => "Approve",
        "verify" => "Verify",
        "reject" => "Reject",
        "return" => "Return",
        _ => "Verify",
    }
}

/// Normalizes and filters the raw action list. Idempotent; the result
/// wholesale replaces any previously resolved list.
pub fn resolve_actions(raw: Vec<RawWorkflowAction>) -> Vec<WorkflowAction> {
    raw.into_iter()
        .filter(|action| !is_excluded(&action.kind))
        .map(normalize)
        .collect()
}

fn normalize(raw: RawWorkflowAction) -> WorkflowAction {
    let value = raw
        .value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default_value_for(&raw.kind).to_string());
    let label = if raw.label.trim().is_empty() { value.clone() } else { raw.label.trim().to_string() };

    WorkflowAction { kind: raw.kind, label, value, class_name: raw.class_name }
}

fn is_excluded(kind: &str) -> bool {
    let kind = normalize_key(kind);
    EXCLUDED_KINDS.contains(&kind.as_str())
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{default_value_for, resolve_actions};
    use crate::domain::action::RawWorkflowAction;

    fn raw(kind: &str, value: Option<&str>) -> RawWorkflowAction {
        RawWorkflowAction {
            kind: kind.to_string(),
            label: String::new(),
            value: value.map(str::to_string),
            class_name: None,
        }
    }

    #[test]
    fn missing_values_follow_the_fixed_mapping() {
        assert_eq!(default_value_for("approve"), "Approve");
        assert_eq!(default_value_for("VERIFY "), "Verify");
        assert_eq!(default_value_for("Reject"), "Reject");
        assert_eq!(default_value_for("return"), "Return");
        assert_eq!(default_value_for("escalate"), "Verify");
        assert_eq!(default_value_for(""), "Verify");
    }

    #[test]
    fn send_back_and_return_are_always_filtered_out() {
        let resolved = resolve_actions(vec![
            raw("Approve", None),
            raw("Send Back", None),
            raw("SEND BACK", Some("SendBack")),
            raw("Return", Some("Return")),
            raw("Reject", Some("Reject")),
        ]);

        let kinds: Vec<&str> = resolved.iter().map(|action| action.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Approve", "Reject"]);
    }

    #[test]
    fn service_provided_values_are_kept_and_blanks_are_derived() {
        let resolved = resolve_actions(vec![
            raw("Approve", None),
            raw("Reject", Some("Reject")),
            raw("Verify", Some("   ")),
        ]);

        assert_eq!(resolved[0].value, "Approve");
        assert_eq!(resolved[1].value, "Reject");
        assert_eq!(resolved[2].value, "Verify");
    }

    #[test]
    fn blank_label_falls_back_to_the_resolved_value() {
        let resolved = resolve_actions(vec![raw("approve", None)]);
        assert_eq!(resolved[0].label, "Approve");

        let mut labelled = raw("approve", None);
        labelled.label = "Approve amendment".to_string();
        let resolved = resolve_actions(vec![labelled]);
        assert_eq!(resolved[0].label, "Approve amendment");
    }

    #[test]
    fn resolving_twice_yields_the_same_list() {
        let input = vec![raw("Approve", None), raw("Send Back", None)];
        assert_eq!(resolve_actions(input.clone()), resolve_actions(input));
    }
}
