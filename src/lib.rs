//! gemchat is a terminal chat client for the Gemini `generateContent` API.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation transcript, the completion client with its
//!   rate-limit retry and cancellation, the chat session that ties them
//!   together, and configuration.
//! - [`api`] defines the request/response payloads of the endpoint.
//! - [`cli`] parses arguments and runs the interactive chat loop or one-shot
//!   commands.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod utils;
