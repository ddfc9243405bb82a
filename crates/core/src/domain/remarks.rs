//! Approval history entries. The canonical in-memory form is the
//! structured [`RemarksEntry`]; the legacy pipe-delimited trail string
//! (`Role : User : Comment` entries joined by `||`) is a boundary codec
//! only, decoded on ingest and re-encoded for modules that still submit
//! the concatenated form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ENTRY_DELIMITER: &str = "||";
const FIELD_DELIMITER: &str = " : ";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarksEntry {
    #[serde(alias = "ActionBy", default)]
    pub action_by: String,
    #[serde(alias = "ActionRole", default)]
    pub action_role: String,
    #[serde(alias = "Action", default)]
    pub action: String,
    #[serde(alias = "ActionRemarks", default)]
    pub remarks: String,
    #[serde(alias = "ActionDate", default)]
    pub action_date: Option<DateTime<Utc>>,
}

/// Decodes a legacy trail string into ordered structured entries.
/// Unparseable fragments become comment-only entries rather than being
/// dropped, so the trail never silently shrinks.
pub fn decode_trail(raw: &str) -> Vec<RemarksEntry> {
    raw.split(ENTRY_DELIMITER)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| {
            let mut parts = fragment.splitn(3, FIELD_DELIMITER);
            match (parts.next(), parts.next(), parts.next()) {
                (Some(role), Some(user), Some(comment)) => RemarksEntry {
                    action_by: user.trim().to_string(),
                    action_role: role.trim().to_string(),
                    remarks: comment.trim().to_string(),
                    ..RemarksEntry::default()
                },
                _ => RemarksEntry { remarks: fragment.to_string(), ..RemarksEntry::default() },
            }
        })
        .collect()
}

pub fn encode_entry(entry: &RemarksEntry) -> String {
    format!(
        "{role}{delim}{user}{delim}{comment}",
        role = entry.action_role,
        user = entry.action_by,
        comment = entry.remarks,
        delim = FIELD_DELIMITER,
    )
}

/// Appends a formatted entry onto an existing trail string.
pub fn append_to_trail(existing: &str, entry: &RemarksEntry) -> String {
    let encoded = encode_entry(entry);
    if existing.trim().is_empty() {
        encoded
    } else {
        format!("{existing}{ENTRY_DELIMITER}{encoded}")
    }
}
