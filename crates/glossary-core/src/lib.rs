//! # Glossary Core
//!
//! Pure logic for Glossary Harness: term and category models, keyword
//! relevance ranking, category tree assembly, the alphabetical index, term
//! filters, and the store abstraction.
//!
//! This crate contains no tokio, sqlx, network, or filesystem code. Every
//! algorithm is a synchronous transformation over slices already loaded
//! from a store, so it is safe to call from any number of request handlers
//! at once.

pub mod alphabet;
pub mod filter;
pub mod models;
pub mod rank;
pub mod store;
pub mod tree;
