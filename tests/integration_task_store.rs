use kanban::board::Board;
use kanban::error::KanbanError;
use kanban::task::{Outcome, Status, TaskStore};
use time::macros::date;

#[test]
fn board_survives_a_restart() {
    let td = tempfile::tempdir().expect("tempdir");
    let path = td.path().join("boards").join("home.json");

    {
        let mut board = Board::new(TaskStore::load(&path).expect("load"));
        let spec = board
            .add("Write spec", Some(date!(2024 - 01 - 01)))
            .expect("add");
        let review = board
            .add("Review", Some(date!(2024 - 01 - 02)))
            .expect("add");
        assert_eq!((spec.id, review.id), (1, 2));
        assert_eq!(
            board.move_task(spec.id, Status::Doing).expect("move"),
            Outcome::Applied
        );
    }

    let mut board = Board::new(TaskStore::load(&path).expect("reload"));
    let cols = board.columns();
    assert_eq!(cols.todo.len(), 1);
    assert_eq!(cols.todo[0].title, "Review");
    assert_eq!(cols.doing.len(), 1);
    assert_eq!(cols.doing[0].title, "Write spec");
    assert!(cols.done.is_empty());

    assert_eq!(board.delete(2).expect("delete"), Outcome::Applied);
    assert_eq!(board.delete(2).expect("delete"), Outcome::NotFound);
    assert!(board.columns().todo.is_empty());

    let next = board.add("Ship", None).expect("add");
    assert_eq!(next.id, 3);
}

#[test]
fn file_without_counter_sidecar_loads() {
    let td = tempfile::tempdir().expect("tempdir");
    let path = td.path().join("tasks.json");
    std::fs::write(
        &path,
        r#"[
    {
        "id": 1,
        "title": "Buy milk",
        "status": "Done",
        "date": "2024-06-01"
    },
    {
        "id": 2,
        "title": "Call bank",
        "status": "To do",
        "date": "2024-06-02"
    }
]"#,
    )
    .expect("write");

    let store = TaskStore::load(&path).expect("load");
    assert_eq!(store.query_by_status(Status::Done)[0].title, "Buy milk");
    assert_eq!(store.query_by_status(Status::Todo)[0].id, 2);
    assert_eq!(store.next_id(), 3);
}

#[test]
fn corrupt_file_is_reported_not_replaced() {
    let td = tempfile::tempdir().expect("tempdir");
    let path = td.path().join("tasks.json");
    std::fs::write(&path, "[{\"id\": 1,").expect("write");

    let err = TaskStore::load(&path).expect_err("should fail");
    assert!(matches!(err, KanbanError::Malformed { .. }));
    assert!(err.to_string().contains("tasks.json"));
    assert_eq!(std::fs::read_to_string(&path).expect("read"), "[{\"id\": 1,");
}
