// Quotes module

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Quote, QuoteDraft, QuoteItem, QuoteRevision, QuoteStatus};
pub use repositories::{QuoteRepository, RevisionRepository};
pub use services::{QuoteLifecycle, QuoteService};
