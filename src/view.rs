//! List-screen pipeline: categorical filter, then search, then a stable sort.

use std::borrow::Cow;
use std::cmp::Ordering;

use crate::error::{AppError, AppResult};
use crate::model::{HealthRecord, Student, Teacher};
use crate::validate::DATE_FORMAT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn parse(s: &str) -> AppResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(AppError::BadParams(format!(
                "sortDir must be asc or desc, got {other}"
            ))),
        }
    }
}

/// A row type a list screen can filter, search and sort.
pub trait Viewable {
    /// Columns accepted as sort key or categorical filter.
    const COLUMNS: &'static [&'static str];
    /// Columns matched by the search box.
    const SEARCH: &'static [&'static str];

    fn column(&self, name: &str) -> Option<Cow<'_, str>>;
}

#[derive(Debug, Clone, Default)]
pub struct ViewQuery {
    /// (column, value); a sentinel value disables it.
    pub filter: Option<(String, String)>,
    pub search: String,
    pub sort: Option<(String, SortDir)>,
}

/// "semua", "all" and "" all mean "no filter".
pub fn is_no_filter(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case("semua") || v.eq_ignore_ascii_case("all")
}

/// Case-insensitive first; exact bytes break ties so the order is total.
///
/// Folding is by `to_lowercase` only, with no collation table: accented letters
/// sort by code point, so "Ádi" lands after "Zaki". Directory names in the
/// school data are plain ASCII.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

fn known_column<T: Viewable>(name: &str) -> AppResult<()> {
    if T::COLUMNS.contains(&name) {
        Ok(())
    } else {
        Err(AppError::UnknownField(name.to_string()))
    }
}

pub fn apply_view<'a, T: Viewable>(base: Vec<&'a T>, q: &ViewQuery) -> AppResult<Vec<&'a T>> {
    if let Some((col, _)) = &q.filter {
        known_column::<T>(col)?;
    }
    if let Some((col, _)) = &q.sort {
        known_column::<T>(col)?;
    }

    let mut rows = base;

    if let Some((col, value)) = &q.filter {
        if !is_no_filter(value) {
            rows.retain(|row| row.column(col).as_deref() == Some(value.as_str()));
        }
    }

    if !q.search.is_empty() {
        let needle = q.search.to_lowercase();
        rows.retain(|row| {
            T::SEARCH.iter().any(|f| {
                row.column(f)
                    .map(|v| v.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        });
    }

    if let Some((col, dir)) = &q.sort {
        // sort_by is stable; Desc reverses the comparator, not the output, so ties
        // keep their prior order in both directions.
        rows.sort_by(|a, b| {
            let ka = a.column(col).unwrap_or_default();
            let kb = b.column(col).unwrap_or_default();
            let ord = locale_cmp(&ka, &kb);
            match dir {
                SortDir::Asc => ord,
                SortDir::Desc => ord.reverse(),
            }
        });
    }

    Ok(rows)
}

impl Viewable for Student {
    const COLUMNS: &'static [&'static str] = &["nama", "nis", "kelas"];
    const SEARCH: &'static [&'static str] = &["nama", "nis"];

    fn column(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "nama" => Some(Cow::Borrowed(&self.name)),
            "nis" => Some(Cow::Borrowed(&self.nis)),
            "kelas" => Some(Cow::Borrowed(&self.class_label)),
            _ => None,
        }
    }
}

impl Viewable for Teacher {
    const COLUMNS: &'static [&'static str] = &["nama", "nip", "kelas"];
    const SEARCH: &'static [&'static str] = &["nama", "nip"];

    fn column(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "nama" => Some(Cow::Borrowed(&self.name)),
            "nip" => Some(Cow::Borrowed(&self.nip)),
            "kelas" => Some(Cow::Borrowed(&self.class_label)),
            _ => None,
        }
    }
}

impl Viewable for HealthRecord {
    const COLUMNS: &'static [&'static str] = &["tanggal", "namaSiswa", "kelas", "status"];
    const SEARCH: &'static [&'static str] = &["namaSiswa", "keluhan"];

    fn column(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "tanggal" => Some(Cow::Owned(self.date.format(DATE_FORMAT).to_string())),
            "namaSiswa" => Some(Cow::Borrowed(&self.student_name)),
            "kelas" => Some(Cow::Borrowed(&self.class_label)),
            "status" => Some(Cow::Borrowed(self.status.as_str())),
            "keluhan" => Some(Cow::Borrowed(&self.complaint)),
            _ => None,
        }
    }
}
