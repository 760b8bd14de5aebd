// Application layer - use cases and orchestration over the repository.
// The CLI talks only to `LedgerService`; everything below it is reusable
// from any other front end.

pub mod config;
pub mod error;
pub mod service;
pub mod verifier;

pub use config::*;
pub use error::*;
pub use service::*;
pub use verifier::*;
