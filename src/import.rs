use std::io::BufRead;
use std::path::Path;

use anyhow::Context;

use crate::action::Action;
use crate::models::{Student, StudentStatus};

/// Reads enrollment rows; each row becomes an `ADD_STUDENT` action.
pub fn read_students_csv(csv_path: &Path) -> anyhow::Result<Vec<Action>> {
    let reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    students_from_reader(reader)
}

fn students_from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> anyhow::Result<Vec<Action>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        id: String,
        name: String,
        email: String,
        roll_number: u32,
        class_id: Option<String>,
        parent_contact: Option<String>,
        attendance_percentage: f64,
        performance_score: f64,
        status: Option<String>,
    }

    let mut actions = Vec::new();
    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid student row {}", index + 1))?;
        let status = match row.status.as_deref().map(str::trim) {
            None | Some("") => StudentStatus::Active,
            Some(value) => StudentStatus::parse(value)
                .with_context(|| format!("row {}: unknown status {value}", index + 1))?,
        };
        actions.push(Action::AddStudent(Student {
            id: row.id,
            name: row.name,
            email: row.email,
            roll_number: row.roll_number,
            class_id: row.class_id.filter(|id| !id.trim().is_empty()),
            parent_contact: row.parent_contact.unwrap_or_default(),
            attendance_percentage: row.attendance_percentage,
            performance_score: row.performance_score,
            status,
        }));
    }
    Ok(actions)
}

/// Reads one JSON action per line. Blank lines and `#` comments are skipped.
pub fn read_action_script(path: &Path) -> anyhow::Result<Vec<Action>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    parse_action_lines(std::io::BufReader::new(file))
}

pub fn parse_action_lines<R: BufRead>(reader: R) -> anyhow::Result<Vec<Action>> {
    let mut actions = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let action = serde_json::from_str(trimmed)
            .and_then(Action::from_json)
            .with_context(|| format!("line {}: invalid action", index + 1))?;
        actions.push(action);
    }
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn reads_students_with_optional_columns() {
        let data = "\
id,name,email,roll_number,class_id,parent_contact,attendance_percentage,performance_score,status
s-100,Ada Brooks,ada@example.com,7,c-9a,555-0101,91.5,84,
s-101,Ben Okafor,ben@example.com,8,,,62,48,AtRisk
";
        let actions = students_from_reader(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(actions.len(), 2);
        match &actions[1] {
            Action::AddStudent(student) => {
                assert_eq!(student.class_id, None);
                assert_eq!(student.parent_contact, "");
                assert_eq!(student.status, StudentStatus::AtRisk);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_status() {
        let data = "\
id,name,email,roll_number,class_id,parent_contact,attendance_percentage,performance_score,status
s-100,Ada Brooks,ada@example.com,7,c-9a,555-0101,91.5,84,Graduated
";
        let err = students_from_reader(csv::Reader::from_reader(data.as_bytes())).unwrap_err();
        assert!(err.to_string().contains("unknown status"));
    }

    #[test]
    fn action_script_skips_comments_and_reports_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# session script").unwrap();
        writeln!(file, r#"{{"type":"DELETE_CLASS","payload":{{"id":"c-10a"}}}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"type":"RESOLVE_RISK_ALERT","payload":{{"id":"ra-001"}}}}"#).unwrap();

        let actions = read_action_script(file.path()).unwrap();
        assert_eq!(
            actions,
            vec![
                Action::DeleteClass {
                    id: "c-10a".to_string()
                },
                Action::ResolveRiskAlert {
                    id: "ra-001".to_string()
                },
            ]
        );

        let err = parse_action_lines("\n{not json}\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
