use tracing::info;

use crate::core::{AppError, NewTodo, Todo};
use crate::storage::TodoStore;

pub const SEED_DESCRIPTION: &str = "Wash my socks";

/// What the startup sequence wrote and read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub id: i64,
    pub seeded: Todo,
    pub done: Vec<Todo>,
}

/// Recreates the todo table, inserts the seed row and reads it back both by
/// id and through the done filter. Intended to run once before serving.
pub async fn run_demo<S: TodoStore + ?Sized>(store: &S) -> Result<SeedReport, AppError> {
    store.reset_schema().await?;

    let id = store.insert(&NewTodo::new(SEED_DESCRIPTION)).await?;
    info!(id, "seed todo inserted");

    let seeded = store.find_by_id(id).await?;
    info!(description = %seeded.description, is_done = seeded.is_done, "seed todo read back");

    let done = store.list_done().await?;
    info!(count = done.len(), todos = ?done, "done todos");

    Ok(SeedReport { id, seeded, done })
}
