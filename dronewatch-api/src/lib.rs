//! # Dronewatch API Services
//!
//! The mock detection backend and the client the dashboard uses to reach it.
//!
//! ### Components:
//! - `schema`: JSON bodies shared by server and client
//! - `http`: minimal HTTP/1.1 framing over tokio streams
//! - `store`: in-memory detections with OUI resolution and pagination
//! - `routes`: request routing for `/api/v1/*` and `/metrics`
//! - `server`: TCP accept loop
//! - `client`: `Backend` trait and its HTTP implementation

pub mod client;
pub mod error;
pub mod http;
pub mod routes;
pub mod schema;
pub mod server;
pub mod store;

pub use client::{Backend, HttpBackend};
pub use error::{ApiError, HttpError, StoreError};
pub use routes::Router;
pub use schema::{Deleted, ErrorBody, Page, PageRequest};
pub use server::ApiServer;
pub use store::MockStore;
