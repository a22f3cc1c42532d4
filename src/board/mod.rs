#![forbid(unsafe_code)]

//! Board controller shared by the CLI and the terminal board.
//!
//! Owns the user-facing policy the store does not: title validation, the
//! starting column for new cards, and which moves a card offers.

use time::Date;

use crate::error::KanbanError;
use crate::task::model::{self, Status, Task};
use crate::task::storage::{Outcome, TaskStore};

#[derive(Debug)]
pub struct Board {
    store: TaskStore,
}

/// The board split into its three columns, each in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Columns {
    pub todo: Vec<Task>,
    pub doing: Vec<Task>,
    pub done: Vec<Task>,
}

impl Columns {
    #[must_use]
    pub fn get(&self, status: Status) -> &[Task] {
        match status {
            Status::Todo => &self.todo,
            Status::Doing => &self.doing,
            Status::Done => &self.done,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.todo.len() + self.doing.len() + self.done.len()
    }
}

impl Board {
    #[must_use]
    pub fn new(store: TaskStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Adds a card to "To do". `date` defaults to today.
    pub fn add(&mut self, title: &str, date: Option<Date>) -> Result<Task, KanbanError> {
        if title.trim().is_empty() {
            return Err(KanbanError::EmptyTitle);
        }
        let date = date.unwrap_or_else(model::today);
        self.store.add(title, Status::Todo, date)
    }

    pub fn move_task(&mut self, id: u64, status: Status) -> Result<Outcome, KanbanError> {
        self.store.update_status(id, status)
    }

    pub fn delete(&mut self, id: u64) -> Result<Outcome, KanbanError> {
        self.store.delete(id)
    }

    #[must_use]
    pub fn columns(&self) -> Columns {
        Columns {
            todo: self.store.query_by_status(Status::Todo),
            doing: self.store.query_by_status(Status::Doing),
            done: self.store.query_by_status(Status::Done),
        }
    }
}

/// Columns a card in `status` can be moved to.
#[must_use]
pub fn move_targets(status: Status) -> [Status; 2] {
    match status {
        Status::Todo => [Status::Doing, Status::Done],
        Status::Doing => [Status::Todo, Status::Done],
        Status::Done => [Status::Todo, Status::Doing],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn board_in(dir: &tempfile::TempDir) -> Board {
        Board::new(TaskStore::load(dir.path().join("tasks.json")).expect("load"))
    }

    #[test]
    fn new_cards_start_in_todo() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut board = board_in(&dir);
        let task = board
            .add("  Write spec  ", Some(date!(2024 - 01 - 01)))
            .unwrap();
        assert_eq!(task.title, "Write spec");
        assert_eq!(task.status, Status::Todo);
        assert_eq!(board.columns().todo, vec![task]);
    }

    #[test]
    fn empty_title_never_reaches_the_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut board = board_in(&dir);
        assert!(matches!(
            board.add("\t ", None),
            Err(KanbanError::EmptyTitle)
        ));
        assert!(board.store().is_empty());
        assert!(!board.store().path().exists());
    }

    #[test]
    fn missing_date_defaults_to_today() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut board = board_in(&dir);
        let before = model::today();
        let task = board.add("today", None).unwrap();
        let after = model::today();
        assert!(task.date >= before && task.date <= after);
    }

    #[test]
    fn columns_partition_the_board() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut board = board_in(&dir);
        for title in ["a", "b", "c", "d"] {
            board.add(title, Some(date!(2024 - 05 - 01))).unwrap();
        }
        let _ = board.move_task(2, Status::Doing).unwrap();
        let _ = board.move_task(4, Status::Done).unwrap();
        let _ = board.move_task(1, Status::Done).unwrap();

        let cols = board.columns();
        let ids = |tasks: &[Task]| tasks.iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids(cols.get(Status::Todo)), vec![3]);
        assert_eq!(ids(cols.get(Status::Doing)), vec![2]);
        assert_eq!(ids(cols.get(Status::Done)), vec![1, 4]);
        assert_eq!(cols.total(), 4);
    }

    #[test]
    fn move_targets_exclude_the_current_column() {
        for status in Status::ALL {
            let targets = move_targets(status);
            assert!(!targets.contains(&status));
            assert_ne!(targets[0], targets[1]);
        }
    }
}
