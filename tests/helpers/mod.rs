// Shared test infrastructure
//
// In-memory implementations of the storage and identity traits with the
// same conditional-write semantics as the MySQL ones, plus fixture data.
//
// Usage from a test crate:
//   #[path = "../helpers/mod.rs"]
//   mod helpers;
//   use helpers::*;

#![allow(dead_code)]


pub use in_memory::*;
pub use test_data::*;
