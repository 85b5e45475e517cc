#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

//! Client library for the Igbo API dictionary lookup service.
//!
//! `igbo_core` provides:
//! - the lookup facade via [`client`]
//! - the pluggable HTTP seam via [`transport`]
//! - request construction via [`request`]
//! - response body draining via [`drain`]
//! - payload decoding via [`decode`]
//! - shared record and configuration types via [`types`]
//!
//! # Quick Start
//!
//! ```no_run
//! use igbo_core::client::Client;
//! use igbo_core::transport::ReqwestTransport;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new("my-api-key", ReqwestTransport::new())?;
//! for entry in client.lookup("health").await? {
//!     println!("{} ({}): {:?}", entry.headword(), entry.word_class, entry.definitions);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod decode;
pub mod drain;
pub mod request;
pub mod transport;
pub mod types;

pub use client::{Client, ClientError, LookupError};
pub use types::{LexicalEntry, TriState};
