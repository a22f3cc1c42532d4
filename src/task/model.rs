#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;
use time::macros::format_description;

use crate::error::KanbanError;

mod iso_date {
    use serde::{Deserialize as _, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).map_err(serde::de::Error::custom)
    }
}

/// Board column a task currently sits in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Status {
    #[serde(rename = "To do")]
    Todo,
    #[serde(rename = "Doing")]
    Doing,
    #[serde(rename = "Done")]
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::Doing, Status::Done];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Status::Todo => "To do",
            Status::Doing => "Doing",
            Status::Done => "Done",
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Status::Todo => "○",
            Status::Doing => "●",
            Status::Done => "✓",
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Status::Todo => 0,
            Status::Doing => 1,
            Status::Done => 2,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = KanbanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "to do" | "todo" | "to-do" => Ok(Status::Todo),
            "doing" => Ok(Status::Doing),
            "done" => Ok(Status::Done),
            _ => Err(KanbanError::InvalidStatus(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub status: Status,
    #[serde(with = "iso_date")]
    pub date: Date,
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<Date, KanbanError> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        KanbanError::InvalidDate {
            input: input.to_owned(),
        }
    })
}

#[must_use]
pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

/// Today's date in the local timezone, or UTC when the offset is unknown.
#[must_use]
pub fn today() -> Date {
    time::OffsetDateTime::now_local()
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc())
        .date()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn status_serializes_to_column_labels() {
        let s = serde_json::to_string(&Status::ALL).unwrap();
        assert_eq!(s, r#"["To do","Doing","Done"]"#);
    }

    #[test]
    fn status_parses_short_forms() {
        assert_eq!("todo".parse::<Status>().unwrap(), Status::Todo);
        assert_eq!("To do".parse::<Status>().unwrap(), Status::Todo);
        assert_eq!(" DOING ".parse::<Status>().unwrap(), Status::Doing);
        assert_eq!("done".parse::<Status>().unwrap(), Status::Done);
        assert!(matches!(
            "later".parse::<Status>(),
            Err(KanbanError::InvalidStatus(_))
        ));
    }

    #[test]
    fn unknown_status_is_rejected_on_deserialize() {
        let raw = r#"{"id":1,"title":"x","status":"Blocked","date":"2024-01-01"}"#;
        assert!(serde_json::from_str::<Task>(raw).is_err());
    }

    #[test]
    fn extra_record_keys_are_rejected() {
        let raw = r#"{"id":1,"title":"x","status":"Done","date":"2024-01-01","owner":"me"}"#;
        assert!(serde_json::from_str::<Task>(raw).is_err());
    }

    #[test]
    fn invalid_status_message_lists_accepted_forms() {
        let msg = "later".parse::<Status>().unwrap_err().to_string();
        for form in ["To do", "Doing", "Done", "todo", "to-do", "doing", "done"] {
            assert!(msg.contains(form), "{msg} is missing {form}");
        }
    }

    #[test]
    fn task_uses_iso_date_on_the_wire() {
        let task = Task {
            id: 7,
            title: "Write spec".to_owned(),
            status: Status::Doing,
            date: date!(2024 - 03 - 09),
        };
        let v = serde_json::to_value(&task).unwrap();
        assert_eq!(v["date"], "2024-03-09");
        assert_eq!(v["status"], "Doing");
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(parse_date("2024-02-29").unwrap(), date!(2024 - 02 - 29));
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("01/02/2024").is_err());
        assert_eq!(format_date(date!(2024 - 01 - 02)), "2024-01-02");
    }
}
