use anyhow::Context;
use chrono::{NaiveDate, TimeZone, Utc};

use crate::models::{
    AttendanceRecord, Class, EntityType, RiskAlert, RiskType, Student, StudentStatus, Teacher,
    TeacherStatus,
};
use crate::state::AdminState;

fn date(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).context("invalid date")
}

/// Snapshot a fresh session starts from when no database is configured.
pub fn seed_state() -> anyhow::Result<AdminState> {
    let teachers = vec![
        (
            "t-001",
            "Priya Nair",
            "priya.nair@northfield.edu",
            "555-0142",
            &["Mathematics", "Physics"][..],
            TeacherStatus::Active,
            date(2019, 8, 12)?,
        ),
        (
            "t-002",
            "Marcus Bell",
            "marcus.bell@northfield.edu",
            "555-0178",
            &["English"][..],
            TeacherStatus::Active,
            date(2021, 1, 4)?,
        ),
        (
            "t-003",
            "Helena Ortiz",
            "helena.ortiz@northfield.edu",
            "555-0116",
            &["Biology", "Chemistry"][..],
            TeacherStatus::OnLeave,
            date(2016, 8, 29)?,
        ),
    ]
    .into_iter()
    .map(|(id, name, email, phone, subjects, status, join_date)| Teacher {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        subjects: subjects.iter().map(|s| s.to_string()).collect(),
        status,
        join_date,
    })
    .collect();

    let classes = vec![
        ("c-9a", "9", "A", Some("t-001")),
        ("c-9b", "9", "B", Some("t-002")),
        ("c-10a", "10", "A", None),
    ]
    .into_iter()
    .map(|(id, grade, section, teacher)| Class {
        id: id.to_string(),
        grade: grade.to_string(),
        section: section.to_string(),
        class_teacher_id: teacher.map(str::to_string),
    })
    .collect();

    let students = vec![
        ("s-001", "Avery Lee", 1, "c-9a", 96.0, 88.0, StudentStatus::Active),
        ("s-002", "Jules Moreno", 2, "c-9a", 71.0, 64.0, StudentStatus::AtRisk),
        ("s-003", "Kiara Patel", 3, "c-9b", 89.5, 92.0, StudentStatus::Active),
        ("s-004", "Noah Fischer", 4, "c-9b", 83.0, 55.0, StudentStatus::AtRisk),
        ("s-005", "Mei Tanaka", 5, "c-10a", 98.0, 95.5, StudentStatus::Active),
    ]
    .into_iter()
    .map(
        |(id, name, roll_number, class_id, attendance, performance, status)| Student {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@students.northfield.edu", id),
            roll_number,
            class_id: Some(class_id.to_string()),
            parent_contact: format!("parent.{}@mail.example", id),
            attendance_percentage: attendance,
            performance_score: performance,
            status,
        },
    )
    .collect();

    let attendance = vec![
        AttendanceRecord {
            class_id: "c-9a".to_string(),
            date: date(2026, 2, 2)?,
            present_count: 24,
            absent_count: 3,
            late_count: 1,
        },
        AttendanceRecord {
            class_id: "c-9b".to_string(),
            date: date(2026, 2, 2)?,
            present_count: 19,
            absent_count: 7,
            late_count: 2,
        },
    ];

    let created = |day: u32| {
        Utc.with_ymd_and_hms(2026, 2, day, 8, 0, 0)
            .single()
            .context("invalid timestamp")
    };
    let risk_alerts = vec![
        RiskAlert {
            id: "ra-001".to_string(),
            entity_type: EntityType::Student,
            entity_id: "s-002".to_string(),
            alert_type: RiskType::LowAttendance,
            reason: "Missed last two weeks of sessions".to_string(),
            created_at: created(3)?,
            resolved_at: None,
        },
        RiskAlert {
            id: "ra-002".to_string(),
            entity_type: EntityType::Student,
            entity_id: "s-004".to_string(),
            alert_type: RiskType::LowPerformance,
            reason: "Reported grade dip in mid-term assessments".to_string(),
            created_at: created(5)?,
            resolved_at: None,
        },
        RiskAlert {
            id: "ra-003".to_string(),
            entity_type: EntityType::Class,
            entity_id: "c-9b".to_string(),
            alert_type: RiskType::LowAttendance,
            reason: "Class attendance dipped during flu week".to_string(),
            created_at: created(1)?,
            resolved_at: Some(created(9)?),
        },
    ];

    Ok(AdminState::from_parts(
        students,
        teachers,
        classes,
        attendance,
        risk_alerts,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;

    #[test]
    fn seed_is_consistent() {
        let state = seed_state().unwrap();
        assert_eq!(state.students.len(), 5);
        assert_eq!(state.teachers.len(), 3);
        for student in state.students.iter() {
            let class_id = student.class_id.as_deref().unwrap();
            assert!(state.class(class_id).is_some(), "dangling class {class_id}");
        }
        assert_eq!(metrics::unresolved_alerts(&state.risk_alerts, None).len(), 2);
    }
}
