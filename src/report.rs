use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::metrics;
use crate::state::AdminState;

/// Renders a markdown overview of the snapshot.
pub fn build_report(state: &AdminState, generated_at: DateTime<Utc>, alert_limit: usize) -> String {
    let mut output = String::new();
    let statuses = metrics::status_counts(&state.students);

    let _ = writeln!(output, "# School Admin Report");
    let _ = writeln!(output, "Generated {}", generated_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(
        output,
        "- Students: {} ({} active, {} at risk)",
        state.students.len(),
        statuses.active,
        statuses.at_risk
    );
    let _ = writeln!(output, "- Teachers: {}", state.teachers.len());
    let _ = writeln!(output, "- Classes: {}", state.classes.len());
    let _ = writeln!(
        output,
        "- Average attendance: {:.1}%",
        metrics::average_attendance(&state.students)
    );
    let _ = writeln!(
        output,
        "- Average performance: {:.1}",
        metrics::average_performance(&state.students)
    );

    let distribution = metrics::class_distribution(&state.classes, &state.students);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Class Distribution");

    if distribution.buckets.is_empty() {
        let _ = writeln!(output, "No classes configured.");
    } else {
        for bucket in distribution.buckets.iter() {
            let sections: Vec<String> = bucket
                .classes
                .iter()
                .map(|c| {
                    let rate = metrics::class_attendance_rate(&state.attendance, &c.class_id);
                    if rate > 0.0 {
                        format!("{} {} ({:.0}% attendance)", c.section, c.student_count, rate)
                    } else {
                        format!("{} {}", c.section, c.student_count)
                    }
                })
                .collect();
            let _ = writeln!(
                output,
                "- Grade {}: {} students [{}]",
                bucket.grade,
                bucket.student_count,
                sections.join(", ")
            );
        }
    }
    if distribution.unassigned > 0 {
        let _ = writeln!(output, "- Unassigned: {} students", distribution.unassigned);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Open Risk Alerts");
    let alerts = metrics::unresolved_alerts(&state.risk_alerts, Some(alert_limit));

    if alerts.is_empty() {
        let _ = writeln!(output, "No open alerts.");
    } else {
        for alert in alerts.iter() {
            let _ = writeln!(
                output,
                "- [{}] {} {} on {}: {}",
                alert.alert_type.as_str(),
                alert.entity_type.as_str(),
                alert.entity_id,
                alert.created_at.date_naive(),
                alert.reason
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Lowest Performers");
    let lowest = metrics::lowest_performers(&state.students, 5);

    if lowest.is_empty() {
        let _ = writeln!(output, "No students enrolled.");
    } else {
        for student in lowest {
            let class = student
                .class_id
                .as_deref()
                .and_then(|id| state.class(id))
                .map(|c| c.label())
                .unwrap_or_else(|| "unassigned".to_string());
            let _ = writeln!(
                output,
                "- {} ({}, roll {}) performance {:.1}, attendance {:.1}%",
                student.name,
                class,
                student.roll_number,
                student.performance_score,
                student.attendance_percentage
            );
        }
    }

    output
}
