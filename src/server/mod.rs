//! HTTP server exposing a [`KvsEngine`](crate::KvsEngine).
//!
//! | Method | Path       | Operation |
//! |--------|------------|-----------|
//! | POST   | `/kv/:key` | upsert, body `{"value": "..."}` |
//! | GET    | `/kv/:key` | get       |
//! | GET    | `/kv/`     | list      |
//! | DELETE | `/kv/:key` | delete    |
//!
//! Missing keys answer `404 {"detail": "Key not found"}`.

mod error;
mod handlers;

pub use error::ApiError;

use axum::routing::get;
use axum::Router;
use log::{error, info};

use self::handlers::{handle_delete, handle_get, handle_list, handle_upsert, AppState};
use crate::KvsEngine;

/// Represents a database server instance, wrapping a datastore, accepting
/// incoming connections.
#[derive(Clone)]
pub struct Server<E: KvsEngine> {
    engine: E,
}

impl<E: KvsEngine> Server<E> {
    /// Construct a new server around an opened engine.
    pub fn new(engine: E) -> Server<E> {
        Server { engine }
    }

    /// The routes of the server, usable without binding a socket.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/kv/", get(handle_list::<E>))
            .route(
                "/kv/:key",
                get(handle_get::<E>)
                    .post(handle_upsert::<E>)
                    .delete(handle_delete::<E>),
            )
            .with_state(AppState {
                engine: self.engine.clone(),
            })
    }

    /// Listen on the given address until ctrl-c, then flush the engine.
    pub async fn listen(&self, addr: &str) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Listening on '{}'.", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Shutting down, flushing engine.");
        self.engine.flush()?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}

type Result<T> = std::result::Result<T, ServerError>;

/// Error type for the server.
#[derive(Debug, Fail)]
pub enum ServerError {
    /// KvStore error wrapper.
    #[fail(display = "{}", _0)]
    KvStore(#[cause] crate::KvStoreError),
    /// Io error wrapper.
    #[fail(display = "{}", _0)]
    Io(#[cause] std::io::Error),
}

impl From<crate::KvStoreError> for ServerError {
    fn from(err: crate::KvStoreError) -> ServerError {
        ServerError::KvStore(err)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> ServerError {
        ServerError::Io(err)
    }
}
