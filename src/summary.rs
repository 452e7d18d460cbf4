//! Dashboard aggregates, computed from the store on every call.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{HealthRecord, ResponseStatus};
use crate::store::Store;

/// At or above this the dashboards count a reading as high.
pub const HIGH_TEMPERATURE_C: f64 = 37.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub kelas: String,
    pub student_count: usize,
    pub record_count: usize,
    pub complaint_count: usize,
    pub unanswered_complaints: usize,
    pub average_temperature: Option<f64>,
    pub normal_temperature: usize,
    pub high_temperature: usize,
    pub submitted_today: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary<'a> {
    pub today: Option<&'a HealthRecord>,
    pub record_count: usize,
    pub answered_count: usize,
    pub latest: Option<&'a HealthRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub student_count: usize,
    pub teacher_count: usize,
    pub record_count: usize,
    pub complaint_count: usize,
    pub unanswered_complaints: usize,
    pub classes: Vec<ClassSummary>,
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn is_open_complaint(r: &HealthRecord) -> bool {
    r.has_complaint() && r.status == ResponseStatus::Unanswered
}

pub fn class_summary(store: &Store, class_label: &str, today: NaiveDate) -> ClassSummary {
    let records = store.records_by_class(class_label);
    let high = records
        .iter()
        .filter(|r| r.vitals.temperature_c >= HIGH_TEMPERATURE_C)
        .count();
    let average_temperature = if records.is_empty() {
        None
    } else {
        let sum: f64 = records.iter().map(|r| r.vitals.temperature_c).sum();
        Some(round1(sum / records.len() as f64))
    };

    ClassSummary {
        kelas: class_label.to_string(),
        student_count: store.students_by_class(class_label).len(),
        record_count: records.len(),
        complaint_count: records.iter().filter(|r| r.has_complaint()).count(),
        unanswered_complaints: records.iter().filter(|r| is_open_complaint(r)).count(),
        average_temperature,
        normal_temperature: records.len() - high,
        high_temperature: high,
        submitted_today: records.iter().filter(|r| r.date == today).count(),
    }
}

pub fn student_summary<'a>(store: &'a Store, student_id: &str, today: NaiveDate) -> StudentSummary<'a> {
    let records = store.records_by_student(student_id);
    let latest = records
        .iter()
        .copied()
        .max_by(|a, b| a.date.cmp(&b.date).then(a.timestamp.cmp(&b.timestamp)));
    StudentSummary {
        today: store.record_for_day(student_id, today),
        record_count: records.len(),
        answered_count: records
            .iter()
            .filter(|r| r.status == ResponseStatus::Answered)
            .count(),
        latest,
    }
}

pub fn admin_summary(store: &Store, today: NaiveDate) -> AdminSummary {
    let records = store.all_records();
    AdminSummary {
        student_count: store.all_students().len(),
        teacher_count: store.all_teachers().len(),
        record_count: records.len(),
        complaint_count: records.iter().filter(|r| r.has_complaint()).count(),
        unanswered_complaints: records.iter().filter(|r| is_open_complaint(r)).count(),
        classes: store
            .class_labels()
            .iter()
            .map(|c| class_summary(store, c, today))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{demo_store, SeedOptions};

    fn june(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn class_summary_over_seed() {
        let store = demo_store(SeedOptions::default());
        let s = class_summary(&store, "6A", june(10));
        assert_eq!(s.student_count, 2);
        assert_eq!(s.record_count, 3);
        assert_eq!(s.complaint_count, 3);
        assert_eq!(s.unanswered_complaints, 1);
        // (36.8 + 37.2 + 36.5) / 3
        assert_eq!(s.average_temperature, Some(36.8));
        assert_eq!(s.high_temperature, 0);
        assert_eq!(s.normal_temperature, 3);
        assert_eq!(s.submitted_today, 2);
    }

    #[test]
    fn empty_class_has_no_average() {
        let store = demo_store(SeedOptions { records: false });
        let s = class_summary(&store, "6B", june(10));
        assert_eq!(s.record_count, 0);
        assert_eq!(s.average_temperature, None);
        let v = serde_json::to_value(&s).unwrap();
        assert!(v["averageTemperature"].is_null());
    }

    #[test]
    fn student_summary_picks_latest_by_date() {
        let store = demo_store(SeedOptions::default());
        let s = student_summary(&store, "1", june(11));
        assert!(s.today.is_none());
        assert_eq!(s.record_count, 2);
        assert_eq!(s.answered_count, 2);
        assert_eq!(s.latest.map(|r| r.id.as_str()), Some("1"));
    }

    #[test]
    fn admin_summary_covers_every_class() {
        let store = demo_store(SeedOptions::default());
        let s = admin_summary(&store, june(10));
        assert_eq!(s.student_count, 4);
        assert_eq!(s.teacher_count, 2);
        assert_eq!(s.unanswered_complaints, 2);
        let labels: Vec<_> = s.classes.iter().map(|c| c.kelas.as_str()).collect();
        assert_eq!(labels, vec!["6A", "6B"]);
    }
}
