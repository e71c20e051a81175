//! Core library for iCoder.
//!
//! Contains the form schemas and their validation, the two document
//! collections (contact submissions and accounts), and the Argon2id
//! credential hasher. This crate depends on `icoder-storage` for the storage
//! backend trait and knows nothing about HTTP, sessions, or rendering.

pub mod account;
pub mod contact;
pub mod error;
pub mod forms;
pub mod password;
