pub mod lifecycle;
pub mod quote_number;
pub mod quote_service;

pub use lifecycle::{QuoteEvent, QuoteLifecycle, Transition};
pub use quote_number::QuoteNumberGenerator;
pub use quote_service::QuoteService;
