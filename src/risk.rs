use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use uuid::Uuid;

use crate::action::Action;
use crate::config::RiskThresholds;
use crate::metrics::class_attendance_rate;
use crate::models::{
    AttendanceRecord, EntityType, RiskAlert, RiskType, Student, StudentStatus,
};
use crate::state::AdminState;

/// First day inside the window; saturates at `NaiveDate::MIN` for windows
/// reaching past the calendar.
pub fn cutoff_date(now: DateTime<Utc>, window_days: i64) -> NaiveDate {
    TimeDelta::try_days(window_days.max(1))
        .and_then(|window| now.date_naive().checked_sub_signed(window))
        .unwrap_or(NaiveDate::MIN)
}

/// Actions that raise new alerts for students and classes under the
/// thresholds and mark the affected students `AtRisk`.
///
/// Entities that already carry an active alert of the same type are skipped,
/// so running a scan twice raises nothing new.
pub fn scan(state: &AdminState, thresholds: &RiskThresholds, now: DateTime<Utc>) -> Vec<Action> {
    let open: HashSet<(EntityType, &str, RiskType)> = state
        .risk_alerts
        .iter()
        .filter(|a| a.is_active())
        .map(|a| (a.entity_type, a.entity_id.as_str(), a.alert_type))
        .collect();

    let mut actions = Vec::new();
    for student in state.students.iter() {
        let mut flagged = false;
        for (risk, reason) in student_risks(student, thresholds) {
            flagged = true;
            if open.contains(&(EntityType::Student, student.id.as_str(), risk)) {
                continue;
            }
            actions.push(Action::AddRiskAlert(new_alert(
                EntityType::Student,
                &student.id,
                risk,
                reason,
                now,
            )));
        }
        if flagged && student.status != StudentStatus::AtRisk {
            let mut updated = student.clone();
            updated.status = StudentStatus::AtRisk;
            actions.push(Action::UpdateStudent(updated));
        }
    }

    let recent = recent_records(&state.attendance, cutoff_date(now, thresholds.window_days));
    for class in state.classes.iter() {
        if !recent.iter().any(|r| r.class_id == class.id) {
            continue;
        }
        let rate = class_attendance_rate(&recent, &class.id);
        if rate >= thresholds.min_attendance
            || open.contains(&(EntityType::Class, class.id.as_str(), RiskType::LowAttendance))
        {
            continue;
        }
        actions.push(Action::AddRiskAlert(new_alert(
            EntityType::Class,
            &class.id,
            RiskType::LowAttendance,
            format!(
                "Class {} attendance {:.1}% over the last {} days is below {:.0}%",
                class.label(),
                rate,
                thresholds.window_days,
                thresholds.min_attendance
            ),
            now,
        )));
    }

    actions
}

pub fn student_risks(student: &Student, thresholds: &RiskThresholds) -> Vec<(RiskType, String)> {
    let mut risks = Vec::new();
    if student.attendance_percentage < thresholds.min_attendance {
        risks.push((
            RiskType::LowAttendance,
            format!(
                "{} attendance {:.1}% is below {:.0}%",
                student.name, student.attendance_percentage, thresholds.min_attendance
            ),
        ));
    }
    if student.performance_score < thresholds.min_performance {
        risks.push((
            RiskType::LowPerformance,
            format!(
                "{} performance {:.1} is below {:.0}",
                student.name, student.performance_score, thresholds.min_performance
            ),
        ));
    }
    risks
}

fn recent_records(records: &[AttendanceRecord], cutoff: NaiveDate) -> Vec<AttendanceRecord> {
    records
        .iter()
        .filter(|r| r.date >= cutoff)
        .cloned()
        .collect()
}

fn new_alert(
    entity_type: EntityType,
    entity_id: &str,
    alert_type: RiskType,
    reason: String,
    now: DateTime<Utc>,
) -> RiskAlert {
    RiskAlert {
        id: Uuid::new_v4().to_string(),
        entity_type,
        entity_id: entity_id.to_string(),
        alert_type,
        reason,
        created_at: now,
        resolved_at: None,
    }
}
