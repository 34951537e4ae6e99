pub mod auth;
pub mod error_handler;
pub mod request_id;

pub use auth::{
    hash_token, BearerAuth, Capabilities, IdentityResolver, MySqlIdentityResolver, Principal,
    SharedIdentityResolver,
};
pub use error_handler::{configure_extractors, json_error_handler, query_error_handler};
pub use request_id::{CorrelationId, RequestId};
