//! Core abstractions for Signbook: the user record model, the record store
//! contract, and the outcome/error vocabulary of the account operations.
//! This crate is intentionally small to keep dependency surface minimal.

pub mod accounts;
pub mod records;
pub mod store;
