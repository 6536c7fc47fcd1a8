pub mod cancel;
pub mod completion;
pub mod config;
pub mod message;
pub mod session;
pub mod transcript;
