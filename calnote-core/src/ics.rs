//! Calendar parsing using the icalendar crate's parser.
//!
//! Only the two things a task needs are read from each VEVENT: its title
//! (`SUMMARY`) and the calendar date of its start (`DTSTART`).

use chrono::NaiveDate;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, read_calendar, unfold},
};

use crate::error::{CalNoteError, CalNoteResult};
use crate::task::TaskRecord;

/// Parse a calendar document into tasks, in document order.
///
/// Events without a usable title or start are skipped with a warning; a body
/// that is not an iCalendar document at all is an error.
pub fn parse_tasks(content: &str) -> CalNoteResult<Vec<TaskRecord>> {
    let unfolded = unfold(content);
    if !unfolded.to_ascii_uppercase().contains("BEGIN:VCALENDAR") {
        return Err(CalNoteError::IcsParse(
            "response is not an iCalendar document".into(),
        ));
    }

    let calendar = read_calendar(&unfolded).map_err(|e| CalNoteError::IcsParse(e.to_string()))?;

    let mut vevents = Vec::new();
    collect_vevents(&calendar.components, &mut vevents);

    let tasks = vevents
        .into_iter()
        .filter_map(|vevent| match task_from_vevent(vevent) {
            Ok(task) => Some(task),
            Err(e) => {
                tracing::warn!("Skipping event: {e}");
                None
            }
        })
        .collect();

    Ok(tasks)
}

/// Depth-first walk so VEVENTs nested under VCALENDAR are found in order.
fn collect_vevents<'a>(components: &'a [Component<'a>], out: &mut Vec<&'a Component<'a>>) {
    for component in components {
        if component.name == "VEVENT" {
            out.push(component);
        } else {
            collect_vevents(&component.components, out);
        }
    }
}

fn task_from_vevent(vevent: &Component) -> CalNoteResult<TaskRecord> {
    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| "(no UID)".to_string());

    let name = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CalNoteError::MalformedEvent(format!("{uid}: missing SUMMARY")))?;

    let dtstart = vevent
        .find_prop("DTSTART")
        .ok_or_else(|| CalNoteError::MalformedEvent(format!("{uid}: missing DTSTART")))?;
    let start = DatePerhapsTime::try_from(dtstart)
        .map_err(|_| CalNoteError::MalformedEvent(format!("{uid}: unreadable DTSTART")))?;

    Ok(TaskRecord::new(&name, start_date(start)))
}

/// The date as written in the calendar. No timezone conversion is applied.
fn start_date(start: DatePerhapsTime) -> NaiveDate {
    match start {
        DatePerhapsTime::Date(d) => d,
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => dt.date_naive(),
            CalendarDateTime::Floating(naive) => naive.date(),
            CalendarDateTime::WithTimezone { date_time, .. } => date_time.date(),
        },
    }
}
