//! In-memory entity store. One owner, passed by reference to the accessors and
//! by `&mut` to the mutations; every read observes the latest write.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::model::{
    Account, Admin, ClassSetting, Gender, HealthRecord, Identity, MonthlyReport, Notification,
    ResponseStatus, Role, Student, Teacher, Vitals,
};
use crate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

/// A validated "add user" form.
#[derive(Debug, Clone)]
pub enum NewUser {
    Student {
        name: String,
        nis: String,
        class_label: String,
        gender: Gender,
        birth_date: Option<NaiveDate>,
        address: String,
        parent_name: String,
        parent_phone: String,
        username: String,
        password: String,
    },
    Teacher {
        name: String,
        nip: String,
        class_label: String,
        gender: Gender,
        phone: String,
        address: String,
        username: String,
        password: String,
    },
    Admin {
        name: String,
        username: String,
        password: String,
    },
}

impl NewUser {
    fn username(&self) -> &str {
        match self {
            Self::Student { username, .. }
            | Self::Teacher { username, .. }
            | Self::Admin { username, .. } => username,
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    accounts: Vec<Account>,
    students: Vec<Student>,
    teachers: Vec<Teacher>,
    admins: Vec<Admin>,
    records: Vec<HealthRecord>,
    notifications: Vec<Notification>,
    reports: Vec<MonthlyReport>,
    classes: Vec<ClassSetting>,
}

impl Store {
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        accounts: Vec<Account>,
        students: Vec<Student>,
        teachers: Vec<Teacher>,
        admins: Vec<Admin>,
        records: Vec<HealthRecord>,
        notifications: Vec<Notification>,
        reports: Vec<MonthlyReport>,
        classes: Vec<ClassSetting>,
    ) -> Self {
        Self {
            accounts,
            students,
            teachers,
            admins,
            records,
            notifications,
            reports,
            classes,
        }
    }

    // ---- accessors ----

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn all_students(&self) -> Vec<&Student> {
        self.students.iter().collect()
    }

    pub fn all_teachers(&self) -> Vec<&Teacher> {
        self.teachers.iter().collect()
    }

    pub fn students_by_class(&self, class_label: &str) -> Vec<&Student> {
        self.students
            .iter()
            .filter(|s| s.class_label == class_label)
            .collect()
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    /// Directory entry behind a session identity, matched on username.
    pub fn directory_id(&self, identity: &Identity) -> Option<&str> {
        let username = identity.username();
        match identity.role() {
            Role::Student => self
                .students
                .iter()
                .find(|s| s.username == username)
                .map(|s| s.id.as_str()),
            Role::Teacher => self
                .teachers
                .iter()
                .find(|t| t.username == username)
                .map(|t| t.id.as_str()),
            Role::Admin => self
                .admins
                .iter()
                .find(|a| a.username == username)
                .map(|a| a.id.as_str()),
        }
    }

    pub fn all_records(&self) -> Vec<&HealthRecord> {
        self.records.iter().collect()
    }

    /// Store order, not date order.
    pub fn records_by_student(&self, student_id: &str) -> Vec<&HealthRecord> {
        self.records
            .iter()
            .filter(|r| r.student_id == student_id)
            .collect()
    }

    pub fn records_by_class(&self, class_label: &str) -> Vec<&HealthRecord> {
        self.records
            .iter()
            .filter(|r| r.class_label == class_label)
            .collect()
    }

    pub fn record(&self, id: &str) -> Option<&HealthRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn record_for_day(&self, student_id: &str, date: NaiveDate) -> Option<&HealthRecord> {
        self.records
            .iter()
            .find(|r| r.student_id == student_id && r.date == date)
    }

    pub fn notifications_for(&self, role: Role, user_id: &str) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|n| n.recipient_role == role && n.user_id == user_id)
            .collect()
    }

    pub fn monthly_reports(&self, class_label: Option<&str>, year: Option<i32>) -> Vec<&MonthlyReport> {
        self.reports
            .iter()
            .filter(|r| class_label.map_or(true, |c| r.class_label == c))
            .filter(|r| year.map_or(true, |y| r.year == y))
            .collect()
    }

    pub fn classes(&self) -> &[ClassSetting] {
        &self.classes
    }

    /// Distinct class labels across students and teachers, sorted.
    pub fn class_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .students
            .iter()
            .map(|s| s.class_label.clone())
            .chain(self.teachers.iter().map(|t| t.class_label.clone()))
            .collect();
        labels.sort();
        labels.dedup();
        labels
    }

    // ---- health records ----

    /// One record per (student, date): an existing one has its vitals and complaint
    /// overwritten in place, keeping id, response and status.
    pub fn upsert_daily_record(
        &mut self,
        student_id: &str,
        date: NaiveDate,
        vitals: Vitals,
        complaint: &str,
        now: DateTime<Utc>,
    ) -> AppResult<(Upsert, &HealthRecord)> {
        validate::check_vitals(&vitals)?;

        if let Some(idx) = self.day_index(student_id, date) {
            let rec = &mut self.records[idx];
            rec.vitals = vitals;
            rec.complaint = complaint.to_string();
            rec.timestamp = now;
            return Ok((Upsert::Updated, &self.records[idx]));
        }

        let rec = self.new_record(student_id, date, vitals, complaint, now)?;
        self.records.push(rec);
        Ok((Upsert::Created, &self.records[self.records.len() - 1]))
    }

    /// Complaint-only submission. Replacing the complaint reopens the record, so any
    /// previous response is dropped along with the answered status.
    pub fn submit_complaint(
        &mut self,
        student_id: &str,
        date: NaiveDate,
        text: &str,
        now: DateTime<Utc>,
    ) -> AppResult<(Upsert, &HealthRecord)> {
        if text.trim().is_empty() {
            return Err(AppError::EmptyComplaint);
        }

        if let Some(idx) = self.day_index(student_id, date) {
            let rec = &mut self.records[idx];
            rec.complaint = text.to_string();
            rec.response = None;
            rec.status = ResponseStatus::Unanswered;
            rec.timestamp = now;
            return Ok((Upsert::Updated, &self.records[idx]));
        }

        let rec = self.new_record(student_id, date, Vitals::COMPLAINT_DEFAULT, text, now)?;
        self.records.push(rec);
        Ok((Upsert::Created, &self.records[self.records.len() - 1]))
    }

    /// Attach (or overwrite) a teacher response. No history is kept.
    pub fn respond_to_record(&mut self, record_id: &str, text: &str) -> AppResult<&HealthRecord> {
        if text.trim().is_empty() {
            return Err(AppError::EmptyResponse);
        }
        let rec = self
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| AppError::not_found("record", record_id))?;
        rec.response = Some(text.to_string());
        rec.status = ResponseStatus::Answered;
        Ok(rec)
    }

    fn day_index(&self, student_id: &str, date: NaiveDate) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.student_id == student_id && r.date == date)
    }

    fn new_record(
        &self,
        student_id: &str,
        date: NaiveDate,
        vitals: Vitals,
        complaint: &str,
        now: DateTime<Utc>,
    ) -> AppResult<HealthRecord> {
        let student = self
            .student(student_id)
            .ok_or_else(|| AppError::not_found("student", student_id))?;
        Ok(HealthRecord {
            id: Uuid::new_v4().to_string(),
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            class_label: student.class_label.clone(),
            date,
            vitals,
            complaint: complaint.to_string(),
            response: None,
            status: ResponseStatus::Unanswered,
            timestamp: now,
        })
    }

    // ---- users ----

    fn username_in_use(&self, username: &str) -> bool {
        self.accounts
            .iter()
            .any(|a| a.identity.username() == username)
            || self.students.iter().any(|s| s.username == username)
            || self.teachers.iter().any(|t| t.username == username)
            || self.admins.iter().any(|a| a.username == username)
    }

    /// Adds the directory entry and a matching login.
    pub fn create_user(&mut self, user: NewUser) -> AppResult<Identity> {
        if self.username_in_use(user.username()) {
            return Err(AppError::UsernameTaken(user.username().to_string()));
        }
        let id = Uuid::new_v4().to_string();

        let (identity, password) = match user {
            NewUser::Student {
                name,
                nis,
                class_label,
                gender,
                birth_date,
                address,
                parent_name,
                parent_phone,
                username,
                password,
            } => {
                self.students.push(Student {
                    id: id.clone(),
                    name: name.clone(),
                    nis: nis.clone(),
                    class_label: class_label.clone(),
                    gender,
                    birth_date,
                    address,
                    parent_name,
                    parent_phone,
                    username: username.clone(),
                    role: Role::Student,
                });
                (
                    Identity::Student {
                        id,
                        name,
                        username,
                        class_label,
                        nis,
                    },
                    password,
                )
            }
            NewUser::Teacher {
                name,
                nip,
                class_label,
                gender,
                phone,
                address,
                username,
                password,
            } => {
                self.teachers.push(Teacher {
                    id: id.clone(),
                    name: name.clone(),
                    nip: nip.clone(),
                    class_label: class_label.clone(),
                    gender,
                    phone,
                    address,
                    username: username.clone(),
                    role: Role::Teacher,
                });
                (
                    Identity::Teacher {
                        id,
                        name,
                        username,
                        class_label,
                        nip,
                    },
                    password,
                )
            }
            NewUser::Admin {
                name,
                username,
                password,
            } => {
                self.admins.push(Admin {
                    id: id.clone(),
                    name: name.clone(),
                    username: username.clone(),
                    role: Role::Admin,
                });
                (Identity::Admin { id, name, username }, password)
            }
        };

        self.accounts.push(Account {
            identity: identity.clone(),
            password,
        });
        Ok(identity)
    }

    /// Removes a student or teacher from the directory. The login table is left
    /// as is, so a removed user can still authenticate.
    pub fn delete_user(&mut self, role: Role, id: &str) -> AppResult<String> {
        match role {
            Role::Student => {
                let idx = self
                    .students
                    .iter()
                    .position(|s| s.id == id)
                    .ok_or_else(|| AppError::not_found("student", id))?;
                Ok(self.students.remove(idx).username)
            }
            Role::Teacher => {
                let idx = self
                    .teachers
                    .iter()
                    .position(|t| t.id == id)
                    .ok_or_else(|| AppError::not_found("teacher", id))?;
                Ok(self.teachers.remove(idx).username)
            }
            Role::Admin => Err(AppError::BadParams(
                "admin accounts cannot be deleted".into(),
            )),
        }
    }

    pub fn has_account(&self, username: &str) -> bool {
        self.accounts
            .iter()
            .any(|a| a.identity.username() == username)
    }

    pub fn change_password(
        &mut self,
        username: &str,
        old_password: &str,
        new_password: &str,
        confirmation: &str,
    ) -> AppResult<()> {
        if old_password.is_empty() {
            return Err(AppError::required("oldPassword"));
        }
        if new_password.is_empty() {
            return Err(AppError::required("newPassword"));
        }
        if confirmation.is_empty() {
            return Err(AppError::required("confirmPassword"));
        }
        let account = self
            .accounts
            .iter_mut()
            .find(|a| a.identity.username() == username)
            .ok_or_else(|| AppError::not_found("account", username))?;
        if account.password != old_password {
            return Err(AppError::IncorrectPassword);
        }
        validate::confirm_password(new_password, confirmation)?;
        account.password = new_password.to_string();
        Ok(())
    }

    // ---- classes ----

    pub fn create_class(&mut self, name: &str, grade: &str) -> AppResult<&ClassSetting> {
        let name = validate::required_text(Some(name), "nama")?;
        let next_id = self
            .classes
            .last()
            .and_then(|c| c.id.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        self.classes.push(ClassSetting {
            id: next_id.to_string(),
            name,
            grade: grade.trim().to_string(),
            active: true,
        });
        Ok(&self.classes[self.classes.len() - 1])
    }

    pub fn toggle_class(&mut self, id: &str) -> AppResult<&ClassSetting> {
        let class = self
            .classes
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::not_found("class", id))?;
        class.active = !class.active;
        Ok(class)
    }
}
