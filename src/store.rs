use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::action::Action;
use crate::error::StoreResult;
use crate::state::{reduce, AdminState, Transition};

/// Source of "now" for actions that stamp time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied { version: u64 },
    Unchanged,
}

impl DispatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied { .. })
    }
}

/// Owns the current admin snapshot; every mutation goes through
/// [`Store::dispatch`].
pub struct Store<C: Clock = SystemClock> {
    state: Arc<AdminState>,
    version: u64,
    clock: C,
}

impl Store<SystemClock> {
    pub fn new(initial: AdminState) -> Self {
        Self::with_clock(initial, SystemClock)
    }
}

impl<C: Clock> Store<C> {
    pub fn with_clock(initial: AdminState, clock: C) -> Self {
        info!(
            students = initial.students.len(),
            teachers = initial.teachers.len(),
            classes = initial.classes.len(),
            alerts = initial.risk_alerts.len(),
            "admin store initialized"
        );
        Self {
            state: Arc::new(initial),
            version: 0,
            clock,
        }
    }

    /// Cheap handle to the current snapshot. Later dispatches never change a
    /// snapshot that was already handed out.
    pub fn snapshot(&self) -> Arc<AdminState> {
        Arc::clone(&self.state)
    }

    pub fn state(&self) -> &AdminState {
        &self.state
    }

    /// Incremented once per applied action; usable as a cache key.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn dispatch(&mut self, action: Action) -> StoreResult<DispatchOutcome> {
        let kind = action.kind();
        match reduce(&self.state, action, self.clock.now())? {
            Transition::Applied(next) => {
                self.state = Arc::new(next);
                self.version += 1;
                debug!(action = kind, version = self.version, "action applied");
                Ok(DispatchOutcome::Applied {
                    version: self.version,
                })
            }
            Transition::Unchanged => {
                debug!(action = kind, "action left state unchanged");
                Ok(DispatchOutcome::Unchanged)
            }
        }
    }

    /// Ends the session, handing back the final snapshot.
    pub fn into_state(self) -> AdminState {
        info!(version = self.version, "admin store closed");
        Arc::try_unwrap(self.state).unwrap_or_else(|shared| (*shared).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::{EntityType, RiskAlert, RiskType, Student, StudentStatus};
    use chrono::{Duration, TimeZone};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 4, 10, 14, 0, 0).unwrap())
    }

    fn student(id: &str) -> Student {
        Student {
            id: id.to_string(),
            name: "Jules Moreno".to_string(),
            email: "jules@example.com".to_string(),
            roll_number: 12,
            class_id: None,
            parent_contact: "555-0199".to_string(),
            attendance_percentage: 93.0,
            performance_score: 81.0,
            status: StudentStatus::Active,
        }
    }

    fn open_alert(id: &str) -> RiskAlert {
        RiskAlert {
            id: id.to_string(),
            entity_type: EntityType::Student,
            entity_id: "s1".to_string(),
            alert_type: RiskType::LowPerformance,
            reason: "performance below 60".to_string(),
            created_at: clock().0 - Duration::days(2),
            resolved_at: None,
        }
    }

    #[test]
    fn add_then_delete_restores_students() {
        let mut store = Store::with_clock(AdminState::default(), clock());
        let before = store.snapshot();

        store.dispatch(Action::AddStudent(student("s1"))).unwrap();
        assert_eq!(store.state().students.len(), 1);
        store
            .dispatch(Action::DeleteStudent {
                id: "s1".to_string(),
            })
            .unwrap();

        assert_eq!(store.state().students, before.students);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn update_then_reads_new_status() {
        let mut store = Store::with_clock(AdminState::default(), clock());
        store.dispatch(Action::AddStudent(student("s1"))).unwrap();
        let mut changed = student("s1");
        changed.status = StudentStatus::AtRisk;
        store.dispatch(Action::UpdateStudent(changed)).unwrap();

        assert_eq!(
            store.state().student("s1").unwrap().status,
            StudentStatus::AtRisk
        );
    }

    #[test]
    fn update_of_missing_student_is_a_no_op() {
        let mut store = Store::with_clock(AdminState::default(), clock());
        store.dispatch(Action::AddStudent(student("s1"))).unwrap();
        let before = store.snapshot();

        let outcome = store.dispatch(Action::UpdateStudent(student("ghost"))).unwrap();

        assert_eq!(outcome, DispatchOutcome::Unchanged);
        assert_eq!(store.state().students, before.students);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn duplicate_add_fails_and_keeps_state() {
        let mut store = Store::with_clock(AdminState::default(), clock());
        store.dispatch(Action::AddStudent(student("s1"))).unwrap();

        let err = store.dispatch(Action::AddStudent(student("s1"))).unwrap_err();

        assert!(matches!(err, StoreError::DuplicateId { .. }));
        assert_eq!(store.state().students.len(), 1);
    }

    #[test]
    fn resolving_twice_keeps_first_timestamp() {
        let initial =
            AdminState::from_parts(vec![], vec![], vec![], vec![], vec![open_alert("a1")]).unwrap();
        let mut store = Store::with_clock(initial, clock());

        let first = store
            .dispatch(Action::ResolveRiskAlert {
                id: "a1".to_string(),
            })
            .unwrap();
        let resolved_at = store.state().alert("a1").unwrap().resolved_at;
        let second = store
            .dispatch(Action::ResolveRiskAlert {
                id: "a1".to_string(),
            })
            .unwrap();

        assert!(first.is_applied());
        assert_eq!(second, DispatchOutcome::Unchanged);
        assert_eq!(resolved_at, Some(clock().0));
        assert_eq!(store.state().alert("a1").unwrap().resolved_at, resolved_at);
    }

    #[test]
    fn handed_out_snapshots_do_not_change() {
        let mut store = Store::with_clock(AdminState::default(), clock());
        let before = store.snapshot();
        store.dispatch(Action::AddStudent(student("s1"))).unwrap();
        assert!(before.students.is_empty());
        assert_eq!(store.into_state().students.len(), 1);
    }
}
