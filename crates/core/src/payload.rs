//! Approval payload construction. Each module declares its payload as a
//! field-resolution table: per field an ordered list of sources and a
//! terminal safe default, expressed once instead of re-derived with
//! ad-hoc fallback chains at every call site. Resolution never produces
//! a null: every field lands as a string, empty only when the default
//! says so.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::item::{Actor, DetailRecord, PendingItem};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "key", rename_all = "snake_case")]
pub enum FieldSource {
    /// Named field of the detail record.
    Detail(String),
    /// Named field of the originating pending item.
    Item(String),
    /// The detail record's reference/transaction number.
    RefNo,
    /// The module/object id of the detail record (or item when the
    /// detail has not resolved).
    Moid,
    /// The detail record's check amount.
    CheckAmount,
    /// Trimmed verification comment.
    Comment,
    /// The resolved value of the chosen workflow action.
    ActionValue,
    ActorName,
    ActorId,
    ActorRole,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub field: String,
    pub sources: Vec<FieldSource>,
    pub default: String,
}

impl FieldRule {
    pub fn new(
        field: impl Into<String>,
        sources: Vec<FieldSource>,
        default: impl Into<String>,
    ) -> Self {
        Self { field: field.into(), sources, default: default.into() }
    }

    /// Shorthand for the common "detail field, else the same field off
    /// the pending item, else empty" rule.
    pub fn record_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            sources: vec![FieldSource::Detail(field.clone()), FieldSource::Item(field.clone())],
            default: String::new(),
            field,
        }
    }
}

/// Module-specific flattened record submitted to the approval endpoint.
/// Built fresh per submission, never persisted client-side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPayload {
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl ApprovalPayload {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

/// Everything a field table may draw from at dispatch time.
pub struct PayloadContext<'a> {
    pub item: &'a PendingItem,
    pub detail: Option<&'a DetailRecord>,
    pub actor: &'a Actor,
    pub comment: &'a str,
    pub action_value: &'a str,
}

pub fn build_payload(rules: &[FieldRule], ctx: &PayloadContext<'_>) -> ApprovalPayload {
    let fields = rules
        .iter()
        .map(|rule| {
            let value = rule
                .sources
                .iter()
                .find_map(|source| resolve_source(source, ctx))
                .unwrap_or_else(|| rule.default.clone());
            (rule.field.clone(), value)
        })
        .collect();

    ApprovalPayload { fields }
}

fn resolve_source(source: &FieldSource, ctx: &PayloadContext<'_>) -> Option<String> {
    let value = match source {
        FieldSource::Detail(key) => ctx.detail.and_then(|detail| detail.field(key)).map(str::to_string),
        FieldSource::Item(key) => ctx.item.field(key).map(str::to_string),
        FieldSource::RefNo => ctx.detail.and_then(|detail| detail.ref_no.clone()),
        FieldSource::Moid => Some(match ctx.detail {
            Some(detail) => detail.moid.0.clone(),
            None => ctx.item.moid.0.clone(),
        }),
        FieldSource::CheckAmount => ctx.detail.map(|detail| detail.check_amount.to_string()),
        FieldSource::Comment => Some(ctx.comment.trim().to_string()),
        FieldSource::ActionValue => Some(ctx.action_value.to_string()),
        FieldSource::ActorName => Some(ctx.actor.user_name.clone()),
        FieldSource::ActorId => Some(ctx.actor.user_id.clone()),
        FieldSource::ActorRole => Some(ctx.actor.role_id.clone()),
    };

    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use super::{build_payload, FieldRule, FieldSource, PayloadContext};
    use crate::domain::item::{Actor, DetailRecord, ItemKey, Moid, PendingItem};

    fn actor() -> Actor {
        Actor {
            user_id: "u-017".to_string(),
            user_name: "j.tan".to_string(),
            role_id: "finance_verifier".to_string(),
        }
    }

    fn item() -> PendingItem {
        PendingItem {
            key: ItemKey("BA-2031".to_string()),
            moid: Moid("CCBA-2031".to_string()),
            title: "Q3 marketing reallocation".to_string(),
            code: "BA-2031".to_string(),
            amount: None,
            submitted_at: None,
            fields: BTreeMap::from([
                ("CostCenter".to_string(), "MKT-04".to_string()),
                ("TrNo".to_string(), "TR-88".to_string()),
            ]),
        }
    }

    fn detail() -> DetailRecord {
        DetailRecord {
            key: ItemKey("BA-2031".to_string()),
            moid: Moid("CCBA-2031".to_string()),
            ref_no: Some("TR-881".to_string()),
            check_amount: Decimal::new(50_000, 0),
            fields: BTreeMap::from([("CostCenter".to_string(), "MKT-04A".to_string())]),
            collections: BTreeMap::new(),
        }
    }

    #[test]
    fn detail_fields_win_over_item_fields() {
        let item = item();
        let detail = detail();
        let ctx = PayloadContext {
            item: &item,
            detail: Some(&detail),
            actor: &actor(),
            comment: " verified ",
            action_value: "Approve",
        };

        let payload = build_payload(&[FieldRule::record_field("CostCenter")], &ctx);
        assert_eq!(payload.get("CostCenter"), Some("MKT-04A"));
    }

    #[test]
    fn falls_back_to_item_then_terminal_default() {
        let item = item();
        let ctx = PayloadContext {
            item: &item,
            detail: None,
            actor: &actor(),
            comment: "verified",
            action_value: "Approve",
        };

        let rules = [
            FieldRule::record_field("CostCenter"),
            FieldRule::new("Plant", vec![FieldSource::Detail("Plant".to_string())], "N/A"),
            FieldRule::new("CheckAmount", vec![FieldSource::CheckAmount], "0"),
        ];
        let payload = build_payload(&rules, &ctx);

        assert_eq!(payload.get("CostCenter"), Some("MKT-04"));
        assert_eq!(payload.get("Plant"), Some("N/A"));
        assert_eq!(payload.get("CheckAmount"), Some("0"));
    }

    #[test]
    fn actor_comment_and_action_sources_resolve() {
        let item = item();
        let detail = detail();
        let ctx = PayloadContext {
            item: &item,
            detail: Some(&detail),
            actor: &actor(),
            comment: "  totals match  ",
            action_value: "Verify",
        };

        let rules = [
            FieldRule::new("ActionBy", vec![FieldSource::ActorName], "N/A"),
            FieldRule::new("RoleId", vec![FieldSource::ActorRole], ""),
            FieldRule::new("ActionRemarks", vec![FieldSource::Comment], ""),
            FieldRule::new("Action", vec![FieldSource::ActionValue], "Verify"),
            FieldRule::new("TrNo", vec![FieldSource::RefNo, FieldSource::Item("TrNo".to_string())], ""),
            FieldRule::new("MOID", vec![FieldSource::Moid], ""),
        ];
        let payload = build_payload(&rules, &ctx);

        assert_eq!(payload.get("ActionBy"), Some("j.tan"));
        assert_eq!(payload.get("RoleId"), Some("finance_verifier"));
        assert_eq!(payload.get("ActionRemarks"), Some("totals match"));
        assert_eq!(payload.get("Action"), Some("Verify"));
        assert_eq!(payload.get("TrNo"), Some("TR-881"));
        assert_eq!(payload.get("MOID"), Some("CCBA-2031"));
    }

    #[test]
    fn every_declared_field_is_present_and_non_null() {
        let item = item();
        let ctx = PayloadContext {
            item: &item,
            detail: None,
            actor: &actor(),
            comment: "",
            action_value: "",
        };

        let rules = [
            FieldRule::new("Missing", vec![FieldSource::Detail("Nope".to_string())], ""),
            FieldRule::new("AlsoMissing", vec![FieldSource::RefNo], "N/A"),
        ];
        let payload = build_payload(&rules, &ctx);

        assert_eq!(payload.get("Missing"), Some(""));
        assert_eq!(payload.get("AlsoMissing"), Some("N/A"));
        assert_eq!(payload.fields.len(), 2);
    }
}
