#![forbid(unsafe_code)]

pub mod model;
pub mod storage;

pub use model::{Status, Task};
pub use storage::{Outcome, TaskStore};
