//! Multi-provider chat assistant: provider router, HTTP API, conversation
//! store and UI preferences.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(non_camel_case_types)]
#![deny(unused_must_use)]
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_in_result)]
#![deny(overflowing_literals)]

/// Environment-driven configuration.
pub mod config;
/// Conversation store and send lifecycle.
pub mod conversations;
/// Upstream chat-completion clients.
pub mod llm;
/// Theme and sidebar preferences behind a storage capability.
pub mod preferences;
/// Logical model to provider dispatch.
pub mod router;
/// HTTP server and API routes.
#[allow(clippy::missing_errors_doc)]
pub mod server;
/// Process startup.
pub mod startup;
