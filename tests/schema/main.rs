//! Schema Integration Tests
//!
//! Whole-record layouts built through the public schema API: reference
//! scenarios, nested and recursive records, derived schemas and options.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test schema
//! ```

#[path = "../common/mod.rs"]
mod common;

mod derive;
mod nesting;
mod scenarios;
