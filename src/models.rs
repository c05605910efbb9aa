use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentStatus {
    Active,
    AtRisk,
}

impl StudentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Active => "Active",
            StudentStatus::AtRisk => "AtRisk",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Active" => Some(StudentStatus::Active),
            "AtRisk" => Some(StudentStatus::AtRisk),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeacherStatus {
    Active,
    OnLeave,
}

impl TeacherStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeacherStatus::Active => "Active",
            TeacherStatus::OnLeave => "OnLeave",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Active" => Some(TeacherStatus::Active),
            "OnLeave" => Some(TeacherStatus::OnLeave),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Student,
    Class,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Student => "student",
            EntityType::Class => "class",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(EntityType::Student),
            "class" => Some(EntityType::Class),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskType {
    LowAttendance,
    LowPerformance,
}

impl RiskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskType::LowAttendance => "LowAttendance",
            RiskType::LowPerformance => "LowPerformance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LowAttendance" => Some(RiskType::LowAttendance),
            "LowPerformance" => Some(RiskType::LowPerformance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub roll_number: u32,
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub parent_contact: String,
    pub attendance_percentage: f64,
    pub performance_score: f64,
    pub status: StudentStatus,
}

impl Student {
    /// Returns the record with both percentage fields forced into `0..=100`.
    pub fn clamped(mut self) -> Self {
        self.attendance_percentage = clamp_percentage(self.attendance_percentage);
        self.performance_score = clamp_percentage(self.performance_score);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub subjects: BTreeSet<String>,
    pub status: TeacherStatus,
    pub join_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub grade: String,
    pub section: String,
    #[serde(default)]
    pub class_teacher_id: Option<String>,
}

impl Class {
    pub fn label(&self) -> String {
        format!("{}-{}", self.grade, self.section)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub class_id: String,
    pub date: NaiveDate,
    pub present_count: u32,
    pub absent_count: u32,
    pub late_count: u32,
}

impl AttendanceRecord {
    pub fn total(&self) -> u64 {
        u64::from(self.present_count) + u64::from(self.absent_count) + u64::from(self.late_count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAlert {
    pub id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    #[serde(rename = "type")]
    pub alert_type: RiskType,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl RiskAlert {
    pub fn is_active(&self) -> bool {
        self.resolved_at.is_none()
    }
}

pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
