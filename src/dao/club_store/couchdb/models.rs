use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MEMBER_PREFIX: &str = "member::";
pub const EVENT_PREFIX: &str = "event::";
pub const ATTENDANCE_PREFIX: &str = "attendance::";
pub const TEAM_CONFIGURATION_PREFIX: &str = "teamconfig::";
pub const MATCH_RESULT_PREFIX: &str = "match::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Any entity wrapped with CouchDB's `_id`/`_rev` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> CouchDocument<T> {
    pub fn new(id: String, body: T) -> Self {
        Self { id, rev: None, body }
    }
}

pub fn member_doc_id(id: &str) -> String {
    format!("{MEMBER_PREFIX}{id}")
}

pub fn event_doc_id(id: &str) -> String {
    format!("{EVENT_PREFIX}{id}")
}

/// Prefix shared by every attendance answer of one event.
pub fn attendance_event_prefix(event_id: &str) -> String {
    format!("{ATTENDANCE_PREFIX}{event_id}:")
}

pub fn attendance_doc_id(event_id: &str, member_name: &str) -> String {
    format!("{}{member_name}", attendance_event_prefix(event_id))
}

pub fn team_configuration_doc_id(event_id: &str) -> String {
    format!("{TEAM_CONFIGURATION_PREFIX}{event_id}")
}

pub fn match_result_doc_id(event_id: &str) -> String {
    format!("{MATCH_RESULT_PREFIX}{event_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{AttendanceEntity, AttendanceStatus};

    #[test]
    fn attendance_ids_group_under_event_prefix() {
        let id = attendance_doc_id("e1", "민수");
        assert!(id.starts_with(&attendance_event_prefix("e1")));
        assert!(!id.starts_with(&attendance_event_prefix("e10")));
    }

    #[test]
    fn envelope_flattens_entity_fields() {
        let doc = CouchDocument::new(
            attendance_doc_id("e1", "kim"),
            AttendanceEntity {
                event_id: "e1".into(),
                member_name: "kim".into(),
                status: AttendanceStatus::Attending,
            },
        );
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["_id"], "attendance::e1:kim");
        assert_eq!(json["status"], "attending");
        assert!(json.get("_rev").is_none());

        let raw = serde_json::json!({
            "_id": "attendance::e1:lee",
            "_rev": "1-abc",
            "event_id": "e1",
            "member_name": "lee",
            "status": "불참석"
        });
        let parsed: CouchDocument<AttendanceEntity> = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.body.status, AttendanceStatus::NotAttending);
        assert_eq!(parsed.rev.as_deref(), Some("1-abc"));
    }
}
