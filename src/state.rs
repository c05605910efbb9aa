use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::action::Action;
use crate::error::{StoreError, StoreResult};
use crate::models::{AttendanceRecord, Class, EntityType, RiskAlert, Student, Teacher};

/// Immutable snapshot of every admin-visible collection.
///
/// Collections are shared slices; a transition rebuilds only the collections
/// it touches and clones the `Arc` for the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminState {
    pub students: Arc<[Student]>,
    pub teachers: Arc<[Teacher]>,
    pub classes: Arc<[Class]>,
    pub attendance: Arc<[AttendanceRecord]>,
    pub risk_alerts: Arc<[RiskAlert]>,
}

impl Default for AdminState {
    fn default() -> Self {
        Self {
            students: Vec::new().into(),
            teachers: Vec::new().into(),
            classes: Vec::new().into(),
            attendance: Vec::new().into(),
            risk_alerts: Vec::new().into(),
        }
    }
}

impl AdminState {
    /// Builds a snapshot from owned collections, enforcing the same id
    /// uniqueness and score bounds that dispatch enforces.
    pub fn from_parts(
        students: Vec<Student>,
        teachers: Vec<Teacher>,
        classes: Vec<Class>,
        attendance: Vec<AttendanceRecord>,
        risk_alerts: Vec<RiskAlert>,
    ) -> StoreResult<Self> {
        ensure_unique(&students)?;
        ensure_unique(&teachers)?;
        ensure_unique(&classes)?;
        ensure_unique(&risk_alerts)?;
        Ok(Self {
            students: students.into_iter().map(Student::clamped).collect(),
            teachers: teachers.into(),
            classes: classes.into(),
            attendance: attendance.into(),
            risk_alerts: risk_alerts.into(),
        })
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn teacher(&self, id: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == id)
    }

    pub fn class(&self, id: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn alert(&self, id: &str) -> Option<&RiskAlert> {
        self.risk_alerts.iter().find(|a| a.id == id)
    }
}

/// Result of reducing one action.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Applied(AdminState),
    Unchanged,
}

/// Records addressed by a unique id inside their collection.
pub trait Keyed {
    const COLLECTION: &'static str;

    fn key(&self) -> &str;
}

impl Keyed for Student {
    const COLLECTION: &'static str = "students";

    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Teacher {
    const COLLECTION: &'static str = "teachers";

    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Class {
    const COLLECTION: &'static str = "classes";

    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for RiskAlert {
    const COLLECTION: &'static str = "risk_alerts";

    fn key(&self) -> &str {
        &self.id
    }
}

/// Applies `action` to `state` without touching it.
///
/// Adding a record whose id is already present fails. Updating, deleting or
/// resolving an id that is absent yields [`Transition::Unchanged`], as does
/// resolving an alert that is already resolved.
pub fn reduce(state: &AdminState, action: Action, now: DateTime<Utc>) -> StoreResult<Transition> {
    let mut next = state.clone();
    match action {
        Action::AddStudent(student) => {
            next.students = appended(&state.students, student.clamped())?;
        }
        Action::UpdateStudent(student) => match replaced(&state.students, student.clamped()) {
            Some(students) => next.students = students,
            None => return Ok(Transition::Unchanged),
        },
        Action::DeleteStudent { id } => {
            let Some(students) = removed(&state.students, &id) else {
                return Ok(Transition::Unchanged);
            };
            next.students = students;
            next.risk_alerts = without_alerts_for(&state.risk_alerts, &id, |a| {
                a.entity_type == EntityType::Student
            });
        }
        Action::AddTeacher(teacher) => {
            next.teachers = appended(&state.teachers, teacher)?;
        }
        Action::UpdateTeacher(teacher) => match replaced(&state.teachers, teacher) {
            Some(teachers) => next.teachers = teachers,
            None => return Ok(Transition::Unchanged),
        },
        Action::DeleteTeacher { id } => {
            let Some(teachers) = removed(&state.teachers, &id) else {
                return Ok(Transition::Unchanged);
            };
            next.teachers = teachers;
            if state
                .classes
                .iter()
                .any(|c| c.class_teacher_id.as_deref() == Some(id.as_str()))
            {
                next.classes = state
                    .classes
                    .iter()
                    .cloned()
                    .map(|mut class| {
                        if class.class_teacher_id.as_deref() == Some(id.as_str()) {
                            class.class_teacher_id = None;
                        }
                        class
                    })
                    .collect();
            }
        }
        Action::AddClass(class) => {
            next.classes = appended(&state.classes, class)?;
        }
        Action::UpdateClass(class) => match replaced(&state.classes, class) {
            Some(classes) => next.classes = classes,
            None => return Ok(Transition::Unchanged),
        },
        Action::DeleteClass { id } => {
            let Some(classes) = removed(&state.classes, &id) else {
                return Ok(Transition::Unchanged);
            };
            next.classes = classes;
            if state
                .students
                .iter()
                .any(|s| s.class_id.as_deref() == Some(id.as_str()))
            {
                next.students = state
                    .students
                    .iter()
                    .cloned()
                    .map(|mut student| {
                        if student.class_id.as_deref() == Some(id.as_str()) {
                            student.class_id = None;
                        }
                        student
                    })
                    .collect();
            }
            if state.attendance.iter().any(|r| r.class_id == id) {
                next.attendance = state
                    .attendance
                    .iter()
                    .filter(|r| r.class_id != id)
                    .cloned()
                    .collect();
            }
            next.risk_alerts = without_alerts_for(&state.risk_alerts, &id, |a| {
                a.entity_type == EntityType::Class
            });
        }
        Action::AddAttendanceRecord(record) => {
            if state.class(&record.class_id).is_none() {
                return Ok(Transition::Unchanged);
            }
            let mut records: Vec<AttendanceRecord> = state
                .attendance
                .iter()
                .filter(|r| !(r.class_id == record.class_id && r.date == record.date))
                .cloned()
                .collect();
            records.push(record);
            next.attendance = records.into();
        }
        Action::AddRiskAlert(alert) => {
            next.risk_alerts = appended(&state.risk_alerts, alert)?;
        }
        Action::ResolveRiskAlert { id } => {
            if !state.risk_alerts.iter().any(|a| a.id == id && a.is_active()) {
                return Ok(Transition::Unchanged);
            }
            next.risk_alerts = state
                .risk_alerts
                .iter()
                .cloned()
                .map(|mut alert| {
                    if alert.id == id {
                        alert.resolved_at = Some(now);
                    }
                    alert
                })
                .collect();
        }
        Action::Unknown => return Ok(Transition::Unchanged),
    }
    Ok(Transition::Applied(next))
}

fn ensure_unique<T: Keyed>(items: &[T]) -> StoreResult<()> {
    let mut seen = std::collections::HashSet::new();
    for item in items {
        if !seen.insert(item.key()) {
            return Err(StoreError::DuplicateId {
                collection: T::COLLECTION,
                id: item.key().to_string(),
            });
        }
    }
    Ok(())
}

fn appended<T: Keyed + Clone>(items: &[T], item: T) -> StoreResult<Arc<[T]>> {
    if items.iter().any(|existing| existing.key() == item.key()) {
        return Err(StoreError::DuplicateId {
            collection: T::COLLECTION,
            id: item.key().to_string(),
        });
    }
    Ok(items.iter().cloned().chain(std::iter::once(item)).collect())
}

fn replaced<T: Keyed + Clone>(items: &[T], item: T) -> Option<Arc<[T]>> {
    let index = items.iter().position(|existing| existing.key() == item.key())?;
    let mut next = items.to_vec();
    next[index] = item;
    Some(next.into())
}

fn removed<T: Keyed + Clone>(items: &[T], id: &str) -> Option<Arc<[T]>> {
    if !items.iter().any(|existing| existing.key() == id) {
        return None;
    }
    Some(items.iter().filter(|existing| existing.key() != id).cloned().collect())
}

fn without_alerts_for(
    alerts: &Arc<[RiskAlert]>,
    entity_id: &str,
    matches_type: impl Fn(&RiskAlert) -> bool,
) -> Arc<[RiskAlert]> {
    if !alerts
        .iter()
        .any(|a| a.entity_id == entity_id && matches_type(a))
    {
        return Arc::clone(alerts);
    }
    alerts
        .iter()
        .filter(|a| !(a.entity_id == entity_id && matches_type(a)))
        .cloned()
        .collect()
}
