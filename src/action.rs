use serde::{Deserialize, Serialize};

use crate::models::{AttendanceRecord, Class, RiskAlert, Student, Teacher};

/// A mutation request for the store.
///
/// On the wire an action is `{"type": "ADD_STUDENT", "payload": {...}}`.
/// Kinds the store does not know deserialize to [`Action::Unknown`] and are
/// ignored by the reducer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddStudent(Student),
    UpdateStudent(Student),
    DeleteStudent { id: String },
    AddTeacher(Teacher),
    UpdateTeacher(Teacher),
    DeleteTeacher { id: String },
    AddClass(Class),
    UpdateClass(Class),
    DeleteClass { id: String },
    AddAttendanceRecord(AttendanceRecord),
    AddRiskAlert(RiskAlert),
    ResolveRiskAlert { id: String },
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Wire names of every kind the reducer handles.
    pub const KINDS: [&'static str; 12] = [
        "ADD_STUDENT",
        "UPDATE_STUDENT",
        "DELETE_STUDENT",
        "ADD_TEACHER",
        "UPDATE_TEACHER",
        "DELETE_TEACHER",
        "ADD_CLASS",
        "UPDATE_CLASS",
        "DELETE_CLASS",
        "ADD_ATTENDANCE_RECORD",
        "ADD_RISK_ALERT",
        "RESOLVE_RISK_ALERT",
    ];

    /// Parses a wire action, mapping unrecognized kinds to [`Action::Unknown`]
    /// whatever payload they carry. Known kinds with a bad payload still fail.
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        let unrecognized = value
            .get("type")
            .and_then(|kind| kind.as_str())
            .is_some_and(|kind| !Self::KINDS.contains(&kind));
        if unrecognized {
            return Ok(Action::Unknown);
        }
        serde_json::from_value(value)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::AddStudent(_) => "ADD_STUDENT",
            Action::UpdateStudent(_) => "UPDATE_STUDENT",
            Action::DeleteStudent { .. } => "DELETE_STUDENT",
            Action::AddTeacher(_) => "ADD_TEACHER",
            Action::UpdateTeacher(_) => "UPDATE_TEACHER",
            Action::DeleteTeacher { .. } => "DELETE_TEACHER",
            Action::AddClass(_) => "ADD_CLASS",
            Action::UpdateClass(_) => "UPDATE_CLASS",
            Action::DeleteClass { .. } => "DELETE_CLASS",
            Action::AddAttendanceRecord(_) => "ADD_ATTENDANCE_RECORD",
            Action::AddRiskAlert(_) => "ADD_RISK_ALERT",
            Action::ResolveRiskAlert { .. } => "RESOLVE_RISK_ALERT",
            Action::Unknown => "UNKNOWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_delete_payload() {
        let action: Action =
            serde_json::from_str(r#"{"type":"DELETE_STUDENT","payload":{"id":"s9"}}"#).unwrap();
        assert_eq!(
            action,
            Action::DeleteStudent {
                id: "s9".to_string()
            }
        );
        assert_eq!(action.kind(), "DELETE_STUDENT");
    }

    #[test]
    fn unrecognized_kind_becomes_unknown() {
        let action: Action = serde_json::from_str(r#"{"type":"ARCHIVE_SCHOOL"}"#).unwrap();
        assert_eq!(action, Action::Unknown);
    }

    #[test]
    fn unknown_kind_with_payload_is_ignored() {
        let value = serde_json::json!({"type": "PROMOTE_EVERYONE", "payload": {"grade": 9}});
        assert_eq!(Action::from_json(value).unwrap(), Action::Unknown);

        let bad = serde_json::json!({"type": "DELETE_CLASS", "payload": {"name": "9-A"}});
        assert!(Action::from_json(bad).is_err());
        assert!(Action::from_json(serde_json::json!({"payload": {}})).is_err());
    }

    #[test]
    fn kinds_cover_every_known_variant() {
        let action = Action::ResolveRiskAlert { id: "a".to_string() };
        assert!(Action::KINDS.contains(&action.kind()));
        assert!(!Action::KINDS.contains(&Action::Unknown.kind()));
    }

    #[test]
    fn parses_class_payload() {
        let action: Action = serde_json::from_str(
            r#"{"type":"ADD_CLASS","payload":{"id":"c7","grade":"7","section":"B"}}"#,
        )
        .unwrap();
        match action {
            Action::AddClass(class) => {
                assert_eq!(class.label(), "7-B");
                assert!(class.class_teacher_id.is_none());
            }
            other => panic!("unexpected action {other:?}"),
        }
    }
}
