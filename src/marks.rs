use serde::Serialize;

use crate::api::{Student, StudentMark};

/// Per-subject rollup of a student's recorded assessment scores, derived on
/// demand from the enrolled course list plus the mark list. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<i64>,
    pub subject: String,
    pub total_score: f64,
    pub total_max_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    pub assessments: usize,
}

fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

fn squash_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Merges the student's enrolled courses with the recorded marks into one
/// summary row per distinct subject.
///
/// Rows are seeded from the course list so subjects without marks still
/// appear. Each mark folds into the exact normalized-name match first, then
/// a whitespace-insensitive match, and failing both opens a new row under
/// the mark's own subject text. The fuzzy fallback can merge distinct
/// subjects whose names differ only in spacing; there is no canonical
/// subject key upstream, so that ambiguity is accepted as-is.
pub fn aggregate_marks_by_subject(student: &Student, marks: &[StudentMark]) -> Vec<SubjectSummary> {
    let course_ids = student.course_ids.as_deref().unwrap_or(&[]);
    let course_names = student.course_names.as_deref().unwrap_or(&[]);

    let mut keys: Vec<String> = Vec::new();
    let mut rows: Vec<SubjectSummary> = Vec::new();

    for (index, name) in course_names.iter().enumerate() {
        let course_id = course_ids.get(index).copied();
        let display_name = if name.trim().is_empty() {
            match course_id {
                Some(id) => format!("Course {id}"),
                None => format!("Course {}", index + 1),
            }
        } else {
            name.clone()
        };
        let key = normalize_key(&display_name);
        if keys.contains(&key) {
            continue;
        }
        keys.push(key);
        rows.push(SubjectSummary {
            course_id,
            subject: display_name,
            total_score: 0.0,
            total_max_score: 0.0,
            percentage: None,
            assessments: 0,
        });
    }

    for mark in marks {
        let raw_subject = mark
            .subject
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Unknown");
        let normalized = normalize_key(raw_subject);

        let mut slot = keys.iter().position(|k| *k == normalized);
        if slot.is_none() {
            let squashed = squash_whitespace(&normalized);
            slot = keys
                .iter()
                .position(|k| squash_whitespace(k) == squashed);
        }
        let slot = match slot {
            Some(i) => i,
            None => {
                keys.push(normalized);
                rows.push(SubjectSummary {
                    course_id: None,
                    subject: raw_subject.to_string(),
                    total_score: 0.0,
                    total_max_score: 0.0,
                    percentage: None,
                    assessments: 0,
                });
                rows.len() - 1
            }
        };

        let row = &mut rows[slot];
        row.total_score += mark.score.unwrap_or(0.0);
        row.total_max_score += mark.max_score.unwrap_or(0.0);
        row.assessments += 1;
        row.percentage = if row.total_max_score > 0.0 {
            Some(row.total_score / row.total_max_score * 100.0)
        } else {
            None
        };
    }

    // Stable sort: ties keep seed/arrival order. Undefined percentage ranks
    // as zero.
    rows.sort_by(|a, b| {
        b.percentage
            .unwrap_or(0.0)
            .partial_cmp(&a.percentage.unwrap_or(0.0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows
}

/// One bar of the marks-card performance chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardChartRow {
    pub label: String,
    pub percent: f64,
}

/// Fixed percent axis of the marks-card chart, largest first.
pub const CARD_PERCENT_TICKS: [u32; 6] = [100, 80, 60, 40, 20, 0];

/// Chart rows for a marks card: one bar per mark that has a positive max
/// score, as a clamped percentage, best first with an alphabetical
/// tie-break so equal bars render deterministically.
pub fn card_chart_rows(marks: &[StudentMark]) -> Vec<CardChartRow> {
    let mut rows: Vec<CardChartRow> = marks
        .iter()
        .filter(|m| m.max_score.map(|max| max > 0.0).unwrap_or(false))
        .map(|m| {
            let max = m.max_score.unwrap_or(1.0);
            let percent = (m.score.unwrap_or(0.0) / max * 100.0).clamp(0.0, 100.0);
            CardChartRow {
                label: m.subject.clone().unwrap_or_default(),
                percent,
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.percent
            .partial_cmp(&a.percent)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    rows
}
