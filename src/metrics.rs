use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{AttendanceRecord, Class, RiskAlert, Student, StudentStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCount {
    pub class_id: String,
    pub section: String,
    pub student_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeBucket {
    pub grade: String,
    pub student_count: usize,
    pub classes: Vec<ClassCount>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDistribution {
    pub buckets: Vec<GradeBucket>,
    /// Students with no class, or whose class no longer exists.
    pub unassigned: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub active: usize,
    pub at_risk: usize,
}

pub fn average_attendance(students: &[Student]) -> f64 {
    mean(students.iter().map(|s| s.attendance_percentage))
}

pub fn average_performance(students: &[Student]) -> f64 {
    mean(students.iter().map(|s| s.performance_score))
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (count, total) = values.fold((0usize, 0.0), |(count, total), v| (count + 1, total + v));
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

pub fn class_distribution(classes: &[Class], students: &[Student]) -> ClassDistribution {
    let mut per_class: BTreeMap<&str, usize> = BTreeMap::new();
    for class in classes {
        per_class.entry(class.id.as_str()).or_insert(0);
    }

    let mut unassigned = 0usize;
    for student in students {
        match student
            .class_id
            .as_deref()
            .and_then(|id| per_class.get_mut(id))
        {
            Some(count) => *count += 1,
            None => unassigned += 1,
        }
    }

    let mut grades: BTreeMap<GradeKey, GradeBucket> = BTreeMap::new();
    for class in classes {
        let student_count = per_class.get(class.id.as_str()).copied().unwrap_or(0);
        let bucket = grades
            .entry(GradeKey::new(&class.grade))
            .or_insert_with(|| GradeBucket {
                grade: class.grade.clone(),
                student_count: 0,
                classes: Vec::new(),
            });
        bucket.student_count += student_count;
        bucket.classes.push(ClassCount {
            class_id: class.id.clone(),
            section: class.section.clone(),
            student_count,
        });
    }

    let mut buckets: Vec<GradeBucket> = grades.into_values().collect();
    for bucket in buckets.iter_mut() {
        bucket.classes.sort_by(|a, b| a.section.cmp(&b.section));
    }

    ClassDistribution {
        buckets,
        unassigned,
    }
}

/// Orders "2" before "10" while still accepting grades like "KG".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum GradeKey {
    Numeric(u32),
    Named(String),
}

impl GradeKey {
    fn new(grade: &str) -> Self {
        match grade.trim().parse::<u32>() {
            Ok(n) => GradeKey::Numeric(n),
            Err(_) => GradeKey::Named(grade.trim().to_string()),
        }
    }
}

/// Active alerts, newest first, truncated to `limit` when given.
pub fn unresolved_alerts(alerts: &[RiskAlert], limit: Option<usize>) -> Vec<RiskAlert> {
    let mut active: Vec<RiskAlert> = alerts.iter().filter(|a| a.is_active()).cloned().collect();
    active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    if let Some(limit) = limit {
        active.truncate(limit);
    }
    active
}

pub fn status_counts(students: &[Student]) -> StatusCounts {
    students
        .iter()
        .fold(StatusCounts::default(), |mut counts, s| {
            match s.status {
                StudentStatus::Active => counts.active += 1,
                StudentStatus::AtRisk => counts.at_risk += 1,
            }
            counts
        })
}

/// Share of marks (present or late) over all marks for a class, in percent.
pub fn class_attendance_rate(records: &[AttendanceRecord], class_id: &str) -> f64 {
    let (attended, total) = records
        .iter()
        .filter(|r| r.class_id == class_id)
        .fold((0u64, 0u64), |(attended, total), r| {
            (
                attended + u64::from(r.present_count) + u64::from(r.late_count),
                total + r.total(),
            )
        });
    if total == 0 {
        0.0
    } else {
        attended as f64 * 100.0 / total as f64
    }
}

/// Students ordered from weakest to strongest performance.
pub fn lowest_performers(students: &[Student], limit: usize) -> Vec<&Student> {
    let mut ranked: Vec<&Student> = students.iter().collect();
    ranked.sort_by(|a, b| {
        a.performance_score
            .partial_cmp(&b.performance_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityType, RiskType};
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn student(id: &str, class_id: Option<&str>, attendance: f64, performance: f64) -> Student {
        Student {
            id: id.to_string(),
            name: id.to_uppercase(),
            email: format!("{id}@example.com"),
            roll_number: 1,
            class_id: class_id.map(str::to_string),
            parent_contact: String::new(),
            attendance_percentage: attendance,
            performance_score: performance,
            status: StudentStatus::Active,
        }
    }

    fn class(id: &str, grade: &str, section: &str) -> Class {
        Class {
            id: id.to_string(),
            grade: grade.to_string(),
            section: section.to_string(),
            class_teacher_id: None,
        }
    }

    #[test]
    fn averages_of_three_students() {
        let students = vec![
            student("s1", None, 90.0, 70.0),
            student("s2", None, 80.0, 60.0),
            student("s3", None, 70.0, 95.0),
        ];
        assert_eq!(average_attendance(&students), 80.0);
        assert!((average_performance(&students) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn averages_of_empty_collection_are_zero() {
        assert_eq!(average_attendance(&[]), 0.0);
        assert_eq!(average_performance(&[]), 0.0);
    }

    #[test]
    fn averages_stay_within_bounds() {
        let students: Vec<Student> = (0..25)
            .map(|i| student(&format!("s{i}"), None, (i * 4) as f64, 100.0 - i as f64))
            .collect();
        for value in [average_attendance(&students), average_performance(&students)] {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn distribution_groups_by_grade() {
        let classes = vec![
            class("c10a", "10", "A"),
            class("c2b", "2", "B"),
            class("c2a", "2", "A"),
        ];
        let students = vec![
            student("s1", Some("c2a"), 90.0, 90.0),
            student("s2", Some("c2b"), 90.0, 90.0),
            student("s3", Some("c2b"), 90.0, 90.0),
            student("s4", Some("c10a"), 90.0, 90.0),
            student("s5", Some("gone"), 90.0, 90.0),
            student("s6", None, 90.0, 90.0),
        ];

        let distribution = class_distribution(&classes, &students);

        assert_eq!(distribution.unassigned, 2);
        let grades: Vec<(&str, usize)> = distribution
            .buckets
            .iter()
            .map(|b| (b.grade.as_str(), b.student_count))
            .collect();
        assert_eq!(grades, vec![("2", 3), ("10", 1)]);
        let sections: Vec<&str> = distribution.buckets[0]
            .classes
            .iter()
            .map(|c| c.section.as_str())
            .collect();
        assert_eq!(sections, vec!["A", "B"]);
    }

    #[test]
    fn unresolved_alerts_newest_first() {
        let base = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let alert = |id: &str, days: i64, resolved: bool| RiskAlert {
            id: id.to_string(),
            entity_type: EntityType::Student,
            entity_id: "s1".to_string(),
            alert_type: RiskType::LowAttendance,
            reason: String::new(),
            created_at: base + Duration::days(days),
            resolved_at: resolved.then_some(base + Duration::days(30)),
        };
        let alerts = vec![
            alert("old", 0, false),
            alert("done", 5, true),
            alert("newest", 9, false),
            alert("middle", 3, false),
        ];

        let ids: Vec<String> = unresolved_alerts(&alerts, None)
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["newest", "middle", "old"]);

        let top = unresolved_alerts(&alerts, Some(2));
        assert_eq!(top.len(), 2);
        assert_eq!(unresolved_alerts(&alerts, Some(2)), top);
    }

    #[test]
    fn one_open_and_one_resolved_alert() {
        let at = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let open = RiskAlert {
            id: "open".to_string(),
            entity_type: EntityType::Class,
            entity_id: "c1".to_string(),
            alert_type: RiskType::LowAttendance,
            reason: String::new(),
            created_at: at,
            resolved_at: None,
        };
        let closed = RiskAlert {
            id: "closed".to_string(),
            resolved_at: Some(at),
            ..open.clone()
        };
        assert_eq!(unresolved_alerts(&[open.clone(), closed], None), vec![open]);
    }

    #[test]
    fn attendance_rate_counts_late_as_attended() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        let records = vec![
            AttendanceRecord {
                class_id: "c1".to_string(),
                date,
                present_count: 15,
                absent_count: 4,
                late_count: 1,
            },
            AttendanceRecord {
                class_id: "c2".to_string(),
                date,
                present_count: 0,
                absent_count: 20,
                late_count: 0,
            },
        ];
        assert_eq!(class_attendance_rate(&records, "c1"), 80.0);
        assert_eq!(class_attendance_rate(&records, "missing"), 0.0);
    }

    #[test]
    fn attendance_rate_handles_counts_near_u32_max() {
        let records = vec![AttendanceRecord {
            class_id: "c-9a".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            present_count: 4_000_000_000,
            absent_count: 400_000_000,
            late_count: u32::MAX,
        }];
        let expected = (4_000_000_000f64 + u32::MAX as f64) * 100.0
            / (4_400_000_000f64 + u32::MAX as f64);
        let rate = class_attendance_rate(&records, "c-9a");
        assert!((rate - expected).abs() < 1e-9);
        assert_eq!(records[0].total(), 4_400_000_000 + u64::from(u32::MAX));
    }

    #[test]
    fn lowest_performers_sorted_ascending() {
        let students = vec![
            student("s1", None, 90.0, 70.0),
            student("s2", None, 90.0, 40.0),
            student("s3", None, 90.0, 55.0),
        ];
        let ids: Vec<&str> = lowest_performers(&students, 2)
            .into_iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["s2", "s3"]);
        assert_eq!(status_counts(&students).active, 3);
    }
}
