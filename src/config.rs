use anyhow::ensure;

pub const DEFAULT_MIN_ATTENDANCE: f64 = 75.0;
pub const DEFAULT_MIN_PERFORMANCE: f64 = 60.0;
pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Cut-offs below which a student or class is flagged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskThresholds {
    pub min_attendance: f64,
    pub min_performance: f64,
    /// Attendance records older than this many days are ignored for classes.
    pub window_days: i64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            min_attendance: DEFAULT_MIN_ATTENDANCE,
            min_performance: DEFAULT_MIN_PERFORMANCE,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl RiskThresholds {
    pub fn new(min_attendance: f64, min_performance: f64, window_days: i64) -> anyhow::Result<Self> {
        ensure!(
            (0.0..=100.0).contains(&min_attendance),
            "minimum attendance must be between 0 and 100, got {min_attendance}"
        );
        ensure!(
            (0.0..=100.0).contains(&min_performance),
            "minimum performance must be between 0 and 100, got {min_performance}"
        );
        ensure!(
            window_days <= MAX_WINDOW_DAYS,
            "window must be at most {MAX_WINDOW_DAYS} days, got {window_days}"
        );
        Ok(Self {
            min_attendance,
            min_performance,
            window_days: window_days.max(1),
        })
    }
}
