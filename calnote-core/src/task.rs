//! The unit of dedup state: one calendar event reduced to a checklist task.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A `(name, due_date)` pair. Two records with the same pair are the same task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub due_date: NaiveDate,
}

impl TaskRecord {
    /// Build a record from a raw event title. Line breaks inside the title
    /// become single spaces so the task always renders on one line, then
    /// surrounding whitespace is trimmed.
    pub fn new(name: &str, due_date: NaiveDate) -> Self {
        TaskRecord {
            name: single_line(name).trim().to_string(),
            due_date,
        }
    }

    /// `YYYY-MM-DD`, the form the due date is stored and rendered in.
    pub fn due_date_key(&self) -> String {
        self.due_date.format("%Y-%m-%d").to_string()
    }

    /// The checklist line appended to a daily note.
    pub fn checklist_line(&self) -> String {
        format!("- [ ] {}(@{})", self.name, self.due_date_key())
    }
}

fn single_line(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_break = false;
    for c in name.chars() {
        if c == '\r' || c == '\n' {
            if !in_break {
                out.push(' ');
            }
            in_break = true;
        } else {
            out.push(c);
            in_break = false;
        }
    }
    out
}

impl fmt::Display for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (@{})", self.name, self.due_date_key())
    }
}
