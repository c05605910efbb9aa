use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use tracing::info;

use crate::models::{
    AttendanceRecord, Class, EntityType, RiskAlert, RiskType, Student, StudentStatus, Teacher,
    TeacherStatus,
};
use crate::state::AdminState;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn to_u32(value: i32, field: &str) -> anyhow::Result<u32> {
    u32::try_from(value).with_context(|| format!("{field} must not be negative, got {value}"))
}

fn to_i32(value: u32, field: &str) -> anyhow::Result<i32> {
    i32::try_from(value).with_context(|| format!("{field} is too large: {value}"))
}

/// Loads every collection into a fresh snapshot.
pub async fn load_state(pool: &PgPool) -> anyhow::Result<AdminState> {
    let mut students = Vec::new();
    for row in sqlx::query(
        "SELECT id, name, email, roll_number, class_id, parent_contact, \
         attendance_percentage, performance_score, status \
         FROM school_admin.students ORDER BY roll_number, id",
    )
    .fetch_all(pool)
    .await?
    {
        let status: String = row.get("status");
        students.push(Student {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            roll_number: to_u32(row.get("roll_number"), "roll_number")?,
            class_id: row.get("class_id"),
            parent_contact: row.get("parent_contact"),
            attendance_percentage: row.get("attendance_percentage"),
            performance_score: row.get("performance_score"),
            status: StudentStatus::parse(&status)
                .with_context(|| format!("unknown student status {status}"))?,
        });
    }

    let mut teachers = Vec::new();
    for row in sqlx::query(
        "SELECT id, name, email, phone, subjects, status, join_date \
         FROM school_admin.teachers ORDER BY id",
    )
    .fetch_all(pool)
    .await?
    {
        let status: String = row.get("status");
        let subjects: Vec<String> = row.get("subjects");
        let join_date: NaiveDate = row.get("join_date");
        teachers.push(Teacher {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            phone: row.get("phone"),
            subjects: subjects.into_iter().collect(),
            status: TeacherStatus::parse(&status)
                .with_context(|| format!("unknown teacher status {status}"))?,
            join_date,
        });
    }

    let classes = sqlx::query(
        "SELECT id, grade, section, class_teacher_id FROM school_admin.classes ORDER BY id",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| Class {
        id: row.get("id"),
        grade: row.get("grade"),
        section: row.get("section"),
        class_teacher_id: row.get("class_teacher_id"),
    })
    .collect();

    let mut attendance = Vec::new();
    for row in sqlx::query(
        "SELECT class_id, record_date, present_count, absent_count, late_count \
         FROM school_admin.attendance_records ORDER BY record_date, class_id",
    )
    .fetch_all(pool)
    .await?
    {
        attendance.push(AttendanceRecord {
            class_id: row.get("class_id"),
            date: row.get("record_date"),
            present_count: to_u32(row.get("present_count"), "present_count")?,
            absent_count: to_u32(row.get("absent_count"), "absent_count")?,
            late_count: to_u32(row.get("late_count"), "late_count")?,
        });
    }

    let mut risk_alerts = Vec::new();
    for row in sqlx::query(
        "SELECT id, entity_type, entity_id, alert_type, reason, created_at, resolved_at \
         FROM school_admin.risk_alerts ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?
    {
        let entity_type: String = row.get("entity_type");
        let alert_type: String = row.get("alert_type");
        let created_at: DateTime<Utc> = row.get("created_at");
        let resolved_at: Option<DateTime<Utc>> = row.get("resolved_at");
        risk_alerts.push(RiskAlert {
            id: row.get("id"),
            entity_type: EntityType::parse(&entity_type)
                .with_context(|| format!("unknown entity type {entity_type}"))?,
            entity_id: row.get("entity_id"),
            alert_type: RiskType::parse(&alert_type)
                .with_context(|| format!("unknown alert type {alert_type}"))?,
            reason: row.get("reason"),
            created_at,
            resolved_at,
        });
    }

    let state = AdminState::from_parts(students, teachers, classes, attendance, risk_alerts)
        .context("stored snapshot violates store invariants")?;
    info!(
        students = state.students.len(),
        classes = state.classes.len(),
        "loaded snapshot from postgres"
    );
    Ok(state)
}

/// Replaces the stored snapshot with `state` in a single transaction.
pub async fn save_state(pool: &PgPool, state: &AdminState) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;

    for table in [
        "risk_alerts",
        "attendance_records",
        "students",
        "classes",
        "teachers",
    ] {
        sqlx::query(&format!("DELETE FROM school_admin.{table}"))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to clear {table}"))?;
    }

    for teacher in state.teachers.iter() {
        let subjects: Vec<String> = teacher.subjects.iter().cloned().collect();
        sqlx::query(
            r#"
            INSERT INTO school_admin.teachers (id, name, email, phone, subjects, status, join_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&teacher.id)
        .bind(&teacher.name)
        .bind(&teacher.email)
        .bind(&teacher.phone)
        .bind(subjects)
        .bind(teacher.status.as_str())
        .bind(teacher.join_date)
        .execute(&mut *tx)
        .await?;
    }

    for class in state.classes.iter() {
        sqlx::query(
            r#"
            INSERT INTO school_admin.classes (id, grade, section, class_teacher_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&class.id)
        .bind(&class.grade)
        .bind(&class.section)
        .bind(&class.class_teacher_id)
        .execute(&mut *tx)
        .await?;
    }

    for student in state.students.iter() {
        sqlx::query(
            r#"
            INSERT INTO school_admin.students
            (id, name, email, roll_number, class_id, parent_contact,
             attendance_percentage, performance_score, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&student.id)
        .bind(&student.name)
        .bind(&student.email)
        .bind(to_i32(student.roll_number, "roll_number")?)
        .bind(&student.class_id)
        .bind(&student.parent_contact)
        .bind(student.attendance_percentage)
        .bind(student.performance_score)
        .bind(student.status.as_str())
        .execute(&mut *tx)
        .await?;
    }

    for record in state.attendance.iter() {
        sqlx::query(
            r#"
            INSERT INTO school_admin.attendance_records
            (class_id, record_date, present_count, absent_count, late_count)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&record.class_id)
        .bind(record.date)
        .bind(to_i32(record.present_count, "present_count")?)
        .bind(to_i32(record.absent_count, "absent_count")?)
        .bind(to_i32(record.late_count, "late_count")?)
        .execute(&mut *tx)
        .await?;
    }

    for alert in state.risk_alerts.iter() {
        sqlx::query(
            r#"
            INSERT INTO school_admin.risk_alerts
            (id, entity_type, entity_id, alert_type, reason, created_at, resolved_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&alert.id)
        .bind(alert.entity_type.as_str())
        .bind(&alert.entity_id)
        .bind(alert.alert_type.as_str())
        .bind(&alert.reason)
        .bind(alert.created_at)
        .bind(alert.resolved_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!(
        students = state.students.len(),
        alerts = state.risk_alerts.len(),
        "saved snapshot to postgres"
    );
    Ok(())
}
