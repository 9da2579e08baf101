use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::core::{AppError, NewTodo, Todo};
use crate::storage::TodoStore;

const DROP_TODO_TABLE: &str = "DROP TABLE IF EXISTS todo";

const CREATE_TODO_TABLE: &str = "CREATE TABLE IF NOT EXISTS todo (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        description VARCHAR(200) NOT NULL CHECK (length(description) BETWEEN 1 AND 200),
        is_done BOOLEAN NOT NULL DEFAULT FALSE,
        created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )";

const INSERT_TODO: &str = "INSERT INTO todo (description, is_done) VALUES (?, ?) RETURNING id";

const SELECT_TODO_BY_ID: &str =
    "SELECT id, description, is_done, created FROM todo WHERE id = ?";

const SELECT_DONE_TODOS: &str =
    "SELECT id, description, is_done, created FROM todo WHERE is_done = TRUE";

#[derive(Clone)]
pub struct SqliteTodoStore {
    pool: SqlitePool,
    timeout: Duration,
}

impl SqliteTodoStore {
    /// Every statement issued through this store is bounded by `timeout`.
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Opens a pool for `config.database_url`, creating the database file first
    /// when it does not exist yet.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let url = config.database_url.as_str();
        if url.contains(":memory:") {
            return Self::new_memory(config.db_timeout).await;
        }
        if !Sqlite::database_exists(url).await? {
            info!(url = %url, "creating database");
            Sqlite::create_database(url).await?;
        } else {
            debug!(url = %url, "database already exists");
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_timeout)
            .connect(url)
            .await?;
        Ok(Self::new(pool, config.db_timeout))
    }

    /// A private in-memory database. The pool holds a single connection that is
    /// never recycled, since the data lives only as long as that connection.
    pub async fn new_memory(timeout: Duration) -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(timeout)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self::new(pool, timeout))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        // The pool's acquire timeout races the outer deadline; both mean the
        // call ran out of time.
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Err(sqlx::Error::PoolTimedOut)) | Err(_) => Err(AppError::Timeout(self.timeout)),
            Ok(result) => result.map_err(AppError::from),
        }
    }
}

#[async_trait]
impl TodoStore for SqliteTodoStore {
    #[instrument(skip(self))]
    async fn reset_schema(&self) -> Result<(), AppError> {
        self.bounded(sqlx::query(DROP_TODO_TABLE).execute(&self.pool))
            .await?;
        self.bounded(sqlx::query(CREATE_TODO_TABLE).execute(&self.pool))
            .await?;
        debug!("todo table recreated");
        Ok(())
    }

    #[instrument(skip(self, todo), fields(is_done = todo.is_done))]
    async fn insert(&self, todo: &NewTodo) -> Result<i64, AppError> {
        let id: i64 = self
            .bounded(
                sqlx::query_scalar(INSERT_TODO)
                    .bind(&todo.description)
                    .bind(todo.is_done)
                    .fetch_one(&self.pool),
            )
            .await?;
        debug!(id, "todo inserted");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Todo, AppError> {
        self.bounded(
            sqlx::query_as::<_, Todo>(SELECT_TODO_BY_ID)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no todo with id {id}")))
    }

    #[instrument(skip(self))]
    async fn list_done(&self) -> Result<Vec<Todo>, AppError> {
        let todos = self
            .bounded(sqlx::query_as::<_, Todo>(SELECT_DONE_TODOS).fetch_all(&self.pool))
            .await?;
        debug!(count = todos.len(), "done todos fetched");
        Ok(todos)
    }
}
