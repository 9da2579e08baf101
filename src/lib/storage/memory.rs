use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::core::{AppError, MAX_DESCRIPTION_LEN, NewTodo, Todo};

use super::TodoStore;

#[derive(Default)]
struct Table {
    rows: BTreeMap<i64, Todo>,
    last_id: i64,
}

/// In-process stand-in for [`super::SqliteTodoStore`] with the same
/// constraint and not-found behavior.
#[derive(Default)]
pub struct MemoryTodoStore {
    table: RwLock<Table>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn reset_schema(&self) -> Result<(), AppError> {
        *self.table.write().await = Table::default();
        Ok(())
    }

    async fn insert(&self, todo: &NewTodo) -> Result<i64, AppError> {
        let len = todo.description.chars().count();
        if len == 0 || len > MAX_DESCRIPTION_LEN {
            return Err(AppError::Validation(format!(
                "description must be 1 to {MAX_DESCRIPTION_LEN} characters, got {len}"
            )));
        }
        let mut table = self.table.write().await;
        table.last_id += 1;
        let id = table.last_id;
        table.rows.insert(
            id,
            Todo {
                id,
                description: todo.description.clone(),
                is_done: todo.is_done,
                created: Utc::now().naive_utc(),
            },
        );
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> Result<Todo, AppError> {
        self.table
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("no todo with id {id}")))
    }

    async fn list_done(&self) -> Result<Vec<Todo>, AppError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|todo| todo.is_done)
            .cloned()
            .collect())
    }
}
