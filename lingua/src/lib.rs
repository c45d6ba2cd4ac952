//! # lingua
//!
//! Feature-level entry point for exercise generation.
//!
//! Wires a [`ChainRegistry`](lingua_extraction::ChainRegistry) of per-feature
//! provider chains, the backend adapters that serve them, and the
//! learning-context sampler behind a single [`Client`](client::Client).
//!
//! ## Example
//!
//! ```no_run
//! # use lingua::prelude::*;
//! # use std::sync::Arc;
//! # #[derive(serde::Deserialize)]
//! # struct Exercise { sentence: String }
//! # async fn example(gemini: Arc<dyn Backend>) -> Result<(), Error> {
//! let chains = ChainRegistry::from_path("chains.json")?;
//!
//! let client = Client::builder()
//!     .chains(chains)
//!     .backend(BackendKind::Gemini, gemini)
//!     .build();
//!
//! let outcome = client
//!     .extract::<Exercise>("translation", ExtractionRequest::new("Write one Spanish sentence."))
//!     .await?;
//! if let Some(exercise) = outcome.data() {
//!     println!("{}", exercise.sentence);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

/// Feature-level client.
pub mod client;

/// Shared client configuration.
pub mod config;

/// Public error types.
pub mod errors;

/// Commonly used types and traits.
pub mod prelude;

pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use errors::Error;
