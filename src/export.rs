use std::path::Path;

use crate::api::{Student, StudentPerformance};

/// Standard CSV escaping: wrap in double quotes when the field carries a
/// comma, quote, or line break, doubling embedded quotes.
pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn fmt_opt_f64(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.1}")).unwrap_or_default()
}

pub fn students_csv(students: &[Student]) -> String {
    let mut csv = String::from("id,name,email,dob,branch,courses\n");
    for s in students {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            s.id.map(|id| id.to_string()).unwrap_or_default(),
            csv_quote(&s.name),
            csv_quote(s.email.as_deref().unwrap_or("")),
            csv_quote(s.dob.as_deref().unwrap_or("")),
            csv_quote(s.branch.as_deref().unwrap_or("")),
            csv_quote(&s.course_names.as_deref().unwrap_or(&[]).join("; ")),
        ));
    }
    csv
}

pub fn performance_csv(rows: &[StudentPerformance]) -> String {
    let mut csv =
        String::from("studentId,studentName,branch,percentage,averageScore,totalAssessments\n");
    for r in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            r.student_id.map(|id| id.to_string()).unwrap_or_default(),
            csv_quote(r.student_name.as_deref().unwrap_or("")),
            csv_quote(r.branch.as_deref().unwrap_or("")),
            fmt_opt_f64(r.percentage),
            fmt_opt_f64(r.average_score),
            r.total_assessments
                .map(|n| n.to_string())
                .unwrap_or_default(),
        ));
    }
    csv
}

pub fn write_text_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)?;
    Ok(())
}
