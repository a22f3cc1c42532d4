#![forbid(unsafe_code)]

use std::io;

use crate::board::Columns;
use crate::output::table::Table;
use crate::task::model::{Status, Task, format_date};

/// Lays the three columns out side by side, one card per cell.
#[must_use]
pub fn board_table(columns: &Columns) -> Table {
    let mut t = Table::new(
        Status::ALL.map(|s| format!("{} ({})", s.label().to_uppercase(), columns.get(s).len())),
    );
    let depth = Status::ALL
        .iter()
        .map(|s| columns.get(*s).len())
        .max()
        .unwrap_or(0);
    for i in 0..depth {
        t.row(Status::ALL.map(|s| columns.get(s).get(i).map(card).unwrap_or_default()));
    }
    t
}

pub fn write_board(columns: &Columns, out: impl io::Write) -> io::Result<()> {
    board_table(columns).write_to(out)
}

fn card(task: &Task) -> String {
    format!("#{} {} ({})", task.id, task.title, format_date(task.date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn task(id: u64, title: &str, status: Status) -> Task {
        Task {
            id,
            title: title.to_owned(),
            status,
            date: date!(2024 - 01 - 01),
        }
    }

    #[test]
    fn shorter_columns_are_left_blank() {
        let cols = Columns {
            todo: vec![task(2, "Review", Status::Todo), task(3, "Ship", Status::Todo)],
            doing: vec![task(1, "Write spec", Status::Doing)],
            done: Vec::new(),
        };
        let mut buf = Vec::new();
        write_board(&cols, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("TO DO (2)"));
        assert!(lines[0].contains("DOING (1)"));
        assert!(lines[0].ends_with("DONE (0)"));
        assert!(lines[1].contains("#2 Review (2024-01-01)"));
        assert!(lines[1].contains("#1 Write spec (2024-01-01)"));
        assert_eq!(lines[2], "#3 Ship (2024-01-01)");
    }

    #[test]
    fn empty_board_prints_only_headers() {
        let mut buf = Vec::new();
        write_board(&Columns::default(), &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "TO DO (0)  DOING (0)  DONE (0)\n"
        );
    }
}
