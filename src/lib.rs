//! Quote builder service library
//!
//! Quote pricing (line totals, discount modes, tax, category subtotals), the
//! quote approval lifecycle and the per-quote revision ledger, served over
//! an actix-web JSON API backed by MySQL.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use modules::catalog;
pub use modules::pricing;
pub use modules::quotes;
