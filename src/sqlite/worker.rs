use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::error::SqlMapperError;
use crate::model::Model;
use crate::types::SqlValue;

use super::config::ConnectionOptions;
use super::connection::Connection;

/// Async handle to a [`Connection`] owned by a dedicated worker thread.
///
/// Every request runs on the worker in the order it was sent, so callers on
/// different tasks never touch the connection concurrently. Clones share the
/// same worker; it shuts down when the last clone is dropped.
#[derive(Clone)]
pub struct AsyncConnection {
    worker: Arc<Worker>,
}

impl AsyncConnection {
    /// Open a connection on a new worker thread.
    ///
    /// # Errors
    /// Returns the error from [`Connection::open`], or
    /// `SqlMapperError::ConnectionError` if the worker thread cannot be spawned.
    pub async fn open(options: ConnectionOptions) -> Result<Self, SqlMapperError> {
        let worker = Worker::spawn(options).await?;
        Ok(Self {
            worker: Arc::new(worker),
        })
    }

    /// Run `func` against the worker-owned connection and return its result.
    ///
    /// # Errors
    /// Propagates the error returned by `func`, or
    /// `SqlMapperError::ConnectionError` if the worker has gone away.
    pub async fn interact<F, R>(&self, func: F) -> Result<R, SqlMapperError>
    where
        F: FnOnce(&Connection) -> Result<R, SqlMapperError> + Send + 'static,
        R: Send + 'static,
    {
        self.worker.interact(func).await
    }

    /// # Errors
    /// See [`Connection::create_table`].
    pub async fn create_table<M: Model>(&self) -> Result<(), SqlMapperError> {
        self.interact(|conn| conn.create_table::<M>()).await
    }

    /// Insert `obj` and hand it back with its generated key filled in.
    ///
    /// # Errors
    /// See [`Connection::insert`].
    pub async fn insert<M: Model>(&self, mut obj: M) -> Result<M, SqlMapperError> {
        self.interact(move |conn| {
            conn.insert(&mut obj)?;
            Ok(obj)
        })
        .await
    }

    /// # Errors
    /// See [`Connection::insert_all`].
    pub async fn insert_all<M: Model>(&self, mut objs: Vec<M>) -> Result<Vec<M>, SqlMapperError> {
        self.interact(move |conn| {
            conn.insert_all(&mut objs)?;
            Ok(objs)
        })
        .await
    }

    /// # Errors
    /// See [`Connection::get`].
    pub async fn get<M: Model>(&self, key: SqlValue) -> Result<Option<M>, SqlMapperError> {
        self.interact(move |conn| conn.get::<M>(key)).await
    }

    /// Row count of `M`'s table; 0 if the count fails.
    ///
    /// # Errors
    /// Returns `SqlMapperError::ConnectionError` if the worker has gone away.
    pub async fn count<M: Model>(&self) -> Result<usize, SqlMapperError> {
        self.interact(|conn| Ok(conn.table::<M>().count())).await
    }

    /// # Errors
    /// See [`TableQuery::to_list`](crate::query_builder::TableQuery::to_list).
    pub async fn to_list<M: Model>(&self) -> Result<Vec<M>, SqlMapperError> {
        self.interact(|conn| conn.table::<M>().to_list()).await
    }

    /// # Errors
    /// See [`Connection::execute`].
    pub async fn execute(
        &self,
        sql: String,
        params: Vec<SqlValue>,
    ) -> Result<usize, SqlMapperError> {
        self.interact(move |conn| conn.execute(&sql, &params)).await
    }
}

impl fmt::Debug for AsyncConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncConnection")
            .field("db_path", &self.worker.db_path)
            .finish()
    }
}

struct Worker {
    sender: Sender<Request>,
    db_path: String,
}

impl Worker {
    async fn spawn(options: ConnectionOptions) -> Result<Self, SqlMapperError> {
        let (sender, receiver) = mpsc::channel::<Request>();
        let (ready_tx, ready_rx) = oneshot::channel();
        let db_path = options.db_path.clone();
        thread::Builder::new()
            .name("sql-mapper-worker".into())
            .spawn(move || match Connection::open(options) {
                Ok(conn) => {
                    let _ = ready_tx.send(Ok(()));
                    run_worker(&conn, &receiver);
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })
            .map_err(|err| {
                SqlMapperError::ConnectionError(format!("failed to spawn sqlite worker thread: {err}"))
            })?;
        ready_rx.await.map_err(|_| {
            SqlMapperError::ConnectionError("sqlite worker exited while opening".into())
        })??;
        info!(path = %db_path, "sqlite worker started");
        Ok(Self { sender, db_path })
    }

    async fn interact<F, R>(&self, func: F) -> Result<R, SqlMapperError>
    where
        F: FnOnce(&Connection) -> Result<R, SqlMapperError> + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let callback: BoxedCallback =
            Box::new(move |conn| func(conn).map(|value| Box::new(value) as Box<dyn Any + Send>));
        self.sender
            .send(Request::Interact {
                callback,
                respond_to: tx,
            })
            .map_err(|_| SqlMapperError::ConnectionError("sqlite worker closed".into()))?;
        match rx.await {
            Ok(Ok(payload)) => payload.downcast::<R>().map(|boxed| *boxed).map_err(|_| {
                SqlMapperError::ConnectionError("sqlite worker response downcast failure".into())
            }),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(SqlMapperError::ConnectionError(
                "sqlite worker dropped while handling request".into(),
            )),
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let _ = self.sender.send(Request::Shutdown);
    }
}

type BoxedResponse = Result<Box<dyn Any + Send>, SqlMapperError>;
type BoxedCallback = Box<dyn FnOnce(&Connection) -> BoxedResponse + Send>;

enum Request {
    Interact {
        callback: BoxedCallback,
        respond_to: oneshot::Sender<BoxedResponse>,
    },
    Shutdown,
}

fn run_worker(conn: &Connection, receiver: &Receiver<Request>) {
    while let Ok(request) = receiver.recv() {
        match request {
            Request::Interact {
                callback,
                respond_to,
            } => {
                let _ = respond_to.send(callback(conn));
            }
            Request::Shutdown => break,
        }
    }
    debug!(open_statements = conn.outstanding_statements(), "sqlite worker stopped");
}
