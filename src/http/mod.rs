//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Intake service
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → intake.rs (parse body, validate, open span)
//!     → upstream::resolver (network hop, trace context in headers)
//!     → relay body, or response.rs maps the failure
//!
//! Resolver service
//!     → server.rs → request.rs
//!     → resolver.rs (validate path, continue caller's trace)
//!     → lookup engine (directory → weather → conversion)
//!     → JSON report, or response.rs maps the failure
//! ```

pub mod intake;
pub mod request;
pub mod resolver;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::ApiError;
pub use server::HttpServer;
