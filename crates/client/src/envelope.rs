//! Normalization of the backend's loosely shaped JSON envelopes.
//!
//! The approval endpoints predate any shared response contract: row
//! arrays arrive under `Data`, `data`, `Items` or `Rows` (or as the
//! top-level array itself), field names flip between PascalCase and
//! camelCase per module, numbers arrive as numbers or as strings, and
//! the remarks endpoint returns either structured entries or one legacy
//! trail string. Everything shape-dependent is confined to this module;
//! the rest of the crate only sees the fixed internal types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use greenlight_core::domain::action::RawWorkflowAction;
use greenlight_core::domain::item::{DetailRecord, ItemKey, Moid, PendingItem};
use greenlight_core::domain::remarks::{decode_trail, RemarksEntry};

use crate::ApiError;

const ROW_CONTAINER_KEYS: &[&str] = &["Data", "data", "Items", "items", "Rows", "rows"];
const ACTION_CONTAINER_KEYS: &[&str] = &["actions", "Actions", "Data", "data"];
const ERROR_KEYS: &[&str] = &["Message", "message", "Error", "error", "ErrorMessage"];

const KEY_ALIASES: &[&str] = &["Id", "id", "TrNo", "Key", "ItemKey", "DocNo"];
const MOID_ALIASES: &[&str] = &["MOID", "Moid", "moid", "ModuleId"];
const TITLE_ALIASES: &[&str] = &["Title", "title", "Description", "Name"];
const CODE_ALIASES: &[&str] = &["Code", "code", "DocCode", "TypeCode"];
const AMOUNT_ALIASES: &[&str] = &["Amount", "amount", "TotalAmount", "Value"];
const SUBMITTED_ALIASES: &[&str] = &["SubmittedOn", "SubmittedDate", "CreatedOn", "createdOn"];
const REF_ALIASES: &[&str] = &["TrNo", "RefNo", "TransactionNo", "ReferenceNo"];
const CHECK_AMOUNT_ALIASES: &[&str] = &["CheckAmount", "AmendedValue", "Amount", "TotalAmount"];
const TRAIL_ALIASES: &[&str] = &["ActionRemarks", "Remarks", "Trail", "remarks"];

/// Pulls the row array out of whichever container the endpoint used.
/// A bare top-level array is accepted as-is; a missing container on an
/// otherwise well-formed object reads as zero rows.
pub fn rows(body: &Value) -> Result<Vec<Value>, ApiError> {
    match body {
        Value::Array(rows) => Ok(rows.clone()),
        Value::Object(map) => {
            for key in ROW_CONTAINER_KEYS {
                match map.get(*key) {
                    Some(Value::Array(rows)) => return Ok(rows.clone()),
                    Some(Value::Null) | None => continue,
                    Some(other) => {
                        return Err(ApiError::UnexpectedShape(format!(
                            "container `{key}` is {other_kind}, not an array",
                            other_kind = kind_of(other),
                        )))
                    }
                }
            }
            Ok(Vec::new())
        }
        Value::Null => Ok(Vec::new()),
        other => Err(ApiError::UnexpectedShape(format!(
            "expected an array or envelope object, got {}",
            kind_of(other),
        ))),
    }
}

pub fn pending_item(row: &Value) -> Result<PendingItem, ApiError> {
    let object = as_object(row, "pending row")?;

    let key = first_string(object, KEY_ALIASES)
        .ok_or_else(|| ApiError::UnexpectedShape("pending row has no key field".to_string()))?;
    let moid = first_string(object, MOID_ALIASES)
        .ok_or_else(|| ApiError::UnexpectedShape("pending row has no MOID field".to_string()))?;

    Ok(PendingItem {
        key: ItemKey(key),
        moid: Moid(moid),
        title: first_string(object, TITLE_ALIASES).unwrap_or_default(),
        code: first_string(object, CODE_ALIASES).unwrap_or_default(),
        amount: first_string(object, AMOUNT_ALIASES).and_then(|raw| raw.parse().ok()),
        submitted_at: first_string(object, SUBMITTED_ALIASES).and_then(|raw| parse_date(&raw)),
        fields: string_fields(object),
    })
}

pub fn detail_record(body: &Value, key: &ItemKey) -> Result<DetailRecord, ApiError> {
    // Detail endpoints wrap the record the same way list endpoints wrap
    // rows; a single-element array is the most common shape.
    let record = match body {
        Value::Array(_) => first_row(body)?,
        Value::Object(map) if map.keys().any(|k| ROW_CONTAINER_KEYS.contains(&k.as_str())) => {
            first_row(body)?
        }
        other => other.clone(),
    };
    let object = as_object(&record, "detail record")?;

    let moid = first_string(object, MOID_ALIASES)
        .ok_or_else(|| ApiError::UnexpectedShape("detail record has no MOID field".to_string()))?;
    let check_amount = first_string(object, CHECK_AMOUNT_ALIASES)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(Decimal::ZERO);

    let mut collections = BTreeMap::new();
    for (name, value) in object {
        if matches!(value, Value::Array(_) | Value::Object(_)) {
            collections.insert(name.clone(), value.clone());
        }
    }

    Ok(DetailRecord {
        key: key.clone(),
        moid: Moid(moid),
        ref_no: first_string(object, REF_ALIASES),
        check_amount,
        fields: string_fields(object),
        collections,
    })
}

fn first_row(body: &Value) -> Result<Value, ApiError> {
    rows(body)?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::UnexpectedShape("detail envelope has no record".to_string()))
}

pub fn raw_actions(body: &Value) -> Result<Vec<RawWorkflowAction>, ApiError> {
    let rows = match body {
        Value::Array(_) => rows(body)?,
        Value::Object(map) => {
            let mut found = Vec::new();
            for key in ACTION_CONTAINER_KEYS {
                if let Some(Value::Array(rows)) = map.get(*key) {
                    found = rows.clone();
                    break;
                }
            }
            found
        }
        Value::Null => Vec::new(),
        other => {
            return Err(ApiError::UnexpectedShape(format!(
                "expected an action array, got {}",
                kind_of(other),
            )))
        }
    };

    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|error| ApiError::Decode(error.to_string()))
        })
        .collect()
}

/// Remarks arrive either as structured entry rows or, from the legacy
/// endpoints, as a single concatenated trail string.
pub fn remarks_entries(body: &Value) -> Result<Vec<RemarksEntry>, ApiError> {
    if let Value::String(trail) = body {
        return Ok(decode_trail(trail));
    }
    if let Value::Object(map) = body {
        for key in TRAIL_ALIASES {
            if let Some(Value::String(trail)) = map.get(*key) {
                return Ok(decode_trail(trail));
            }
        }
    }

    rows(body)?
        .into_iter()
        .map(|row| match row {
            Value::String(fragment) => {
                Ok(decode_trail(&fragment).into_iter().next().unwrap_or_default())
            }
            row => serde_json::from_value(row).map_err(|error| ApiError::Decode(error.to_string())),
        })
        .collect()
}

/// Best-effort extraction of a human-readable error message from an
/// error response body.
pub fn error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ERROR_KEYS {
            if let Some(Value::String(message)) = map.get(*key) {
                if !message.trim().is_empty() {
                    return message.trim().to_string();
                }
            }
        }
    }
    body.trim().to_string()
}

fn as_object<'a>(
    value: &'a Value,
    what: &str,
) -> Result<&'a serde_json::Map<String, Value>, ApiError> {
    value.as_object().ok_or_else(|| {
        ApiError::UnexpectedShape(format!("{what} is {}, not an object", kind_of(value)))
    })
}

/// First non-empty value among the aliases, coerced to a string. Numbers
/// and booleans are stringified since modules disagree on which they send.
fn first_string(object: &serde_json::Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| object.get(*alias).and_then(coerce_string))
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Flattens every scalar field of the row into the stringified map that
/// payload field rules read from.
fn string_fields(object: &serde_json::Map<String, Value>) -> BTreeMap<String, String> {
    object
        .iter()
        .filter_map(|(name, value)| coerce_string(value).map(|text| (name.clone(), text)))
        .collect()
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use greenlight_core::domain::item::ItemKey;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{detail_record, error_message, pending_item, raw_actions, remarks_entries, rows};

    #[test]
    fn rows_accepts_every_known_container_and_bare_arrays() {
        let bare = json!([{"Id": "1"}]);
        assert_eq!(rows(&bare).unwrap().len(), 1);

        for key in ["Data", "data", "Items", "Rows"] {
            let wrapped = json!({ key: [{"Id": "1"}, {"Id": "2"}] });
            assert_eq!(rows(&wrapped).unwrap().len(), 2, "container {key}");
        }

        let empty = json!({"Message": "ok"});
        assert!(rows(&empty).unwrap().is_empty());
    }

    #[test]
    fn rows_rejects_non_array_containers() {
        let body = json!({"Data": "not rows"});
        assert!(rows(&body).is_err());
    }

    #[test]
    fn pending_item_resolves_aliases_and_coerces_numbers() {
        let row = json!({
            "TrNo": "AMD-0042",
            "moid": 117,
            "Description": "Budget amendment",
            "Code": "AMD",
            "Amount": "1250.50",
            "Department": "Finance"
        });

        let item = pending_item(&row).unwrap();
        assert_eq!(item.key.0, "AMD-0042");
        assert_eq!(item.moid.0, "117");
        assert_eq!(item.title, "Budget amendment");
        assert_eq!(item.amount, Some(Decimal::new(125050, 2)));
        assert_eq!(item.field("Department"), Some("Finance"));
    }

    #[test]
    fn pending_item_requires_a_key() {
        let row = json!({"MOID": "117", "Title": "No key"});
        assert!(pending_item(&row).is_err());
    }

    #[test]
    fn detail_record_unwraps_single_element_envelopes() {
        let body = json!({
            "Data": [{
                "MOID": "117",
                "RefNo": "TR-9",
                "AmendedValue": 300,
                "Lines": [{"Item": "A"}]
            }]
        });

        let detail = detail_record(&body, &ItemKey("AMD-0042".to_string())).unwrap();
        assert_eq!(detail.key.0, "AMD-0042");
        assert_eq!(detail.ref_no.as_deref(), Some("TR-9"));
        assert_eq!(detail.check_amount, Decimal::from(300));
        assert!(detail.collections.contains_key("Lines"));
    }

    #[test]
    fn detail_record_defaults_check_amount_to_zero() {
        let body = json!({"MOID": "117"});
        let detail = detail_record(&body, &ItemKey("X".to_string())).unwrap();
        assert_eq!(detail.check_amount, Decimal::ZERO);
        assert!(detail.ref_no.is_none());
    }

    #[test]
    fn raw_actions_reads_both_casings() {
        let body = json!({
            "Actions": [
                {"type": "approve", "text": "Approve"},
                {"Type": "reject", "Text": "Reject", "Value": "Reject"}
            ]
        });

        let actions = raw_actions(&body).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind, "approve");
        assert_eq!(actions[1].value.as_deref(), Some("Reject"));
    }

    #[test]
    fn remarks_decode_structured_rows_and_legacy_trails() {
        let structured = json!({
            "Data": [{"ActionBy": "j.tan", "ActionRole": "Verifier", "ActionRemarks": "ok"}]
        });
        let entries = remarks_entries(&structured).unwrap();
        assert_eq!(entries[0].action_by, "j.tan");

        let legacy = json!("Verifier : j.tan : Checked||Manager : a.lee : Approved");
        let entries = remarks_entries(&legacy).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].action_role, "Manager");

        let wrapped = json!({"Remarks": "Verifier : j.tan : Checked"});
        assert_eq!(remarks_entries(&wrapped).unwrap().len(), 1);
    }

    #[test]
    fn error_message_prefers_structured_fields() {
        assert_eq!(error_message(r#"{"Message": "period closed"}"#), "period closed");
        assert_eq!(error_message("plain text failure"), "plain text failure");
    }
}
