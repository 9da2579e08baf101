use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Upper bound on `description`, mirrored by the `todo` table's CHECK constraint.
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// A persisted todo row. `id` and `created` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: i64,
    pub description: String,
    pub is_done: bool,
    pub created: NaiveDateTime,
}

/// Insert payload for [`crate::storage::TodoStore::insert`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    pub description: String,
    #[serde(default)]
    pub is_done: bool,
}

impl NewTodo {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            is_done: false,
        }
    }

    pub fn done(mut self, is_done: bool) -> Self {
        self.is_done = is_done;
        self
    }
}
