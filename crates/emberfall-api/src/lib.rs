//! HTTP surface of the Emberfall backend: account registration/login, token
//! verification and per-account character storage, all answering with the
//! `{error, message, code, data}` envelope.

pub mod auth;
pub mod characters;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod token;
pub mod validation;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
