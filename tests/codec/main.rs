//! Codec Integration Tests
//!
//! Exercises the codec algebra through the public API: primitive merging
//! under every byte order, arrays, byte strings and unions over buffers
//! and streams.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test codec
//! RUST_LOG=structpack=trace cargo test --test codec unions::
//! ```

#[path = "../common/mod.rs"]
mod common;

mod arrays;
mod strings;
mod unions;
