//! Demo data loaded once at start-up.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::model::{
    Account, Admin, ClassSetting, Gender, HealthRecord, Identity, MonthlyReport, Notification,
    NotificationKind, ResponseStatus, Role, Student, Teacher, Vitals,
};
use crate::store::Store;

#[derive(Debug, Clone, Copy)]
pub struct SeedOptions {
    /// Load the sample health records. Off gives an empty check-in history.
    pub records: bool,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self { records: true }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("seed date is a valid calendar date")
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .expect("seed timestamp is unambiguous")
}

/// Login table. Ids here are session ids and follow the login screen, not the
/// per-role directories (the teacher account is "2", the teacher directory id is "1").
fn accounts() -> Vec<Account> {
    vec![
        Account {
            identity: Identity::Student {
                id: "1".into(),
                name: "Budi Santoso".into(),
                username: "siswa".into(),
                class_label: "6A".into(),
                nis: "12345".into(),
            },
            password: "siswa123".into(),
        },
        Account {
            identity: Identity::Teacher {
                id: "2".into(),
                name: "Ibu Dewi".into(),
                username: "guru".into(),
                class_label: "6A".into(),
                nip: "98765".into(),
            },
            password: "guru123".into(),
        },
        Account {
            identity: Identity::Admin {
                id: "3".into(),
                name: "Pak Agus".into(),
                username: "admin".into(),
            },
            password: "admin123".into(),
        },
    ]
}

#[allow(clippy::too_many_arguments)]
fn student(
    id: &str,
    name: &str,
    nis: &str,
    class_label: &str,
    gender: Gender,
    birth: NaiveDate,
    address: &str,
    parent: &str,
    phone: &str,
    username: &str,
) -> Student {
    Student {
        id: id.into(),
        name: name.into(),
        nis: nis.into(),
        class_label: class_label.into(),
        gender,
        birth_date: Some(birth),
        address: address.into(),
        parent_name: parent.into(),
        parent_phone: phone.into(),
        username: username.into(),
        role: Role::Student,
    }
}

fn students() -> Vec<Student> {
    vec![
        student(
            "1",
            "Budi Santoso",
            "12345",
            "6A",
            Gender::L,
            date(2013, 5, 10),
            "Jl. Melati No. 123, Jakarta",
            "Agus Santoso",
            "081234567890",
            "siswa",
        ),
        student(
            "2",
            "Siti Nuraini",
            "12346",
            "6A",
            Gender::P,
            date(2013, 7, 15),
            "Jl. Kenanga No. 45, Jakarta",
            "Budi Nuraini",
            "081234567891",
            "siti",
        ),
        student(
            "3",
            "Doni Pratama",
            "12347",
            "6B",
            Gender::L,
            date(2013, 3, 20),
            "Jl. Anggrek No. 78, Jakarta",
            "Joko Pratama",
            "081234567892",
            "doni",
        ),
        student(
            "4",
            "Rina Fitriani",
            "12348",
            "6B",
            Gender::P,
            date(2013, 11, 5),
            "Jl. Dahlia No. 90, Jakarta",
            "Hendra Fitriani",
            "081234567893",
            "rina",
        ),
    ]
}

fn teachers() -> Vec<Teacher> {
    vec![
        Teacher {
            id: "1".into(),
            name: "Ibu Dewi".into(),
            nip: "98765".into(),
            class_label: "6A".into(),
            gender: Gender::P,
            phone: "087654321098".into(),
            address: "Jl. Cendana No. 45, Jakarta".into(),
            username: "guru".into(),
            role: Role::Teacher,
        },
        Teacher {
            id: "2".into(),
            name: "Pak Hendra".into(),
            nip: "98766".into(),
            class_label: "6B".into(),
            gender: Gender::L,
            phone: "087654321099".into(),
            address: "Jl. Beringin No. 32, Jakarta".into(),
            username: "hendra".into(),
            role: Role::Teacher,
        },
    ]
}

fn admins() -> Vec<Admin> {
    vec![Admin {
        id: "1".into(),
        name: "Pak Agus".into(),
        username: "admin".into(),
        role: Role::Admin,
    }]
}

fn records() -> Vec<HealthRecord> {
    vec![
        HealthRecord {
            id: "1".into(),
            student_id: "1".into(),
            student_name: "Budi Santoso".into(),
            class_label: "6A".into(),
            date: date(2025, 6, 10),
            vitals: Vitals {
                temperature_c: 36.8,
                weight_kg: 35.5,
                height_cm: 145.0,
            },
            complaint: "Saya merasa pusing dan batuk ringan sejak kemarin.".into(),
            response: Some(
                "Sebaiknya istirahat yang cukup dan banyak minum air putih. Jika berlanjut, perlu diperiksa ke dokter."
                    .into(),
            ),
            status: ResponseStatus::Answered,
            timestamp: at(2025, 6, 10, 8, 30),
        },
        HealthRecord {
            id: "2".into(),
            student_id: "1".into(),
            student_name: "Budi Santoso".into(),
            class_label: "6A".into(),
            date: date(2025, 6, 9),
            vitals: Vitals {
                temperature_c: 37.2,
                weight_kg: 35.5,
                height_cm: 145.0,
            },
            complaint: "Saya mulai merasa tidak enak badan.".into(),
            response: Some(
                "Perhatikan suhu tubuh, mungkin sedang tidak enak badan. Istirahat yang cukup."
                    .into(),
            ),
            status: ResponseStatus::Answered,
            timestamp: at(2025, 6, 9, 8, 45),
        },
        HealthRecord {
            id: "3".into(),
            student_id: "2".into(),
            student_name: "Siti Nuraini".into(),
            class_label: "6A".into(),
            date: date(2025, 6, 10),
            vitals: Vitals {
                temperature_c: 36.5,
                weight_kg: 32.0,
                height_cm: 140.0,
            },
            complaint: "Tidak ada keluhan, kondisi baik.".into(),
            response: None,
            status: ResponseStatus::Unanswered,
            timestamp: at(2025, 6, 10, 8, 50),
        },
        HealthRecord {
            id: "4".into(),
            student_id: "3".into(),
            student_name: "Doni Pratama".into(),
            class_label: "6B".into(),
            date: date(2025, 6, 10),
            vitals: Vitals {
                temperature_c: 36.7,
                weight_kg: 36.0,
                height_cm: 148.0,
            },
            complaint: "Saya mengalami sakit perut ringan sejak tadi pagi.".into(),
            response: None,
            status: ResponseStatus::Unanswered,
            timestamp: at(2025, 6, 10, 8, 15),
        },
    ]
}

fn notifications() -> Vec<Notification> {
    vec![
        Notification {
            id: "1".into(),
            user_id: "1".into(),
            recipient_role: Role::Teacher,
            title: "Keluhan Baru".into(),
            message: "Budi Santoso melaporkan keluhan kesehatan baru".into(),
            read: false,
            timestamp: at(2025, 6, 10, 8, 35),
            kind: NotificationKind::Complaint,
        },
        Notification {
            id: "2".into(),
            user_id: "1".into(),
            recipient_role: Role::Teacher,
            title: "Keluhan Baru".into(),
            message: "Siti Nuraini melaporkan keluhan kesehatan baru".into(),
            read: true,
            timestamp: at(2025, 6, 10, 8, 55),
            kind: NotificationKind::Complaint,
        },
        Notification {
            id: "3".into(),
            user_id: "2".into(),
            recipient_role: Role::Student,
            title: "Tanggapan Guru".into(),
            message: "Ibu Dewi telah menanggapi keluhan kesehatan Anda".into(),
            read: false,
            timestamp: at(2025, 6, 10, 10, 15),
            kind: NotificationKind::Info,
        },
        Notification {
            id: "4".into(),
            user_id: "1".into(),
            recipient_role: Role::Admin,
            title: "Laporan Bulanan".into(),
            message: "Laporan kesehatan bulan Mei sudah tersedia".into(),
            read: true,
            timestamp: at(2025, 6, 1, 7, 0),
            kind: NotificationKind::Announcement,
        },
    ]
}

fn report(
    id: &str,
    month: &str,
    class_label: &str,
    students: u32,
    complaints: u32,
    attendance: f64,
    issues: &[&str],
) -> MonthlyReport {
    MonthlyReport {
        id: id.into(),
        month: month.into(),
        year: 2025,
        class_label: class_label.into(),
        student_count: students,
        complaint_count: complaints,
        attendance_percent: attendance,
        common_issues: issues.iter().map(|s| s.to_string()).collect(),
    }
}

fn monthly_reports() -> Vec<MonthlyReport> {
    vec![
        report("1", "Mei", "6A", 30, 12, 95.0, &["Pilek", "Batuk", "Demam"]),
        report("2", "Juni", "6A", 30, 8, 97.0, &["Pilek", "Sakit perut"]),
        report("3", "Mei", "6B", 28, 10, 94.0, &["Batuk", "Pusing", "Alergi"]),
    ]
}

fn classes() -> Vec<ClassSetting> {
    [("1", "6A", "6"), ("2", "6B", "6"), ("3", "5A", "5"), ("4", "5B", "5")]
        .into_iter()
        .map(|(id, name, grade)| ClassSetting {
            id: id.into(),
            name: name.into(),
            grade: grade.into(),
            active: true,
        })
        .collect()
}

pub fn demo_store(opts: SeedOptions) -> Store {
    Store::from_parts(
        accounts(),
        students(),
        teachers(),
        admins(),
        if opts.records { records() } else { Vec::new() },
        notifications(),
        monthly_reports(),
        classes(),
    )
}
