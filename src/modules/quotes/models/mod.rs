mod draft;
mod policy_clause;
mod quote;
mod quote_item;
mod quote_status;
mod revision;

pub use draft::{DraftItem, DraftPolicy, QuoteDraft};
pub use policy_clause::PolicyClause;
pub use quote::{Quote, QuoteContent, QuoteFilter, QuotePreview};
pub use quote_item::{Dimensions, QuoteItem};
pub use quote_status::QuoteStatus;
pub use revision::{QuoteRevision, QuoteSnapshot};
