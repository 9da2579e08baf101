pub mod memory;
pub mod sqlite;

pub use memory::MemoryTodoStore;
pub use sqlite::SqliteTodoStore;

use async_trait::async_trait;
use crate::core::{AppError, NewTodo, Todo};

/// Persistence for the `todo` table.
///
/// `find_by_id` reports a missing row as [`AppError::NotFound`], distinct from
/// driver or timeout failures. `list_done` makes no ordering promise.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Drops the `todo` table and recreates it empty.
    async fn reset_schema(&self) -> Result<(), AppError>;
    /// Inserts a row and returns its generated id.
    async fn insert(&self, todo: &NewTodo) -> Result<i64, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Todo, AppError>;
    async fn list_done(&self) -> Result<Vec<Todo>, AppError>;
}
