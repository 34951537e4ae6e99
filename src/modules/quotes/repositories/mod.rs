pub mod quote_repository;
pub mod revision_repository;

pub use quote_repository::{MySqlQuoteRepository, QuoteRepository};
pub use revision_repository::{MySqlRevisionRepository, RevisionRepository};
