use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Issues human-readable quote numbers: `{PREFIX}-{YYYYMMDD}-{SUFFIX}`
///
/// The suffix is six upper-case hex digits from a fresh v4 UUID. The store
/// carries a unique index on the number; a collision fails the insert and
/// the caller draws again (see [`QuoteNumberGenerator::MAX_ATTEMPTS`]).
#[derive(Debug, Clone)]
pub struct QuoteNumberGenerator {
    prefix: String,
    suffix: fn() -> String,
}

impl QuoteNumberGenerator {
    pub const DEFAULT_PREFIX: &'static str = "QT";

    /// Numbers drawn per create before a collision is reported
    pub const MAX_ATTEMPTS: usize = 5;

    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_suffix_source(prefix, random_suffix)
    }

    /// Generator with a caller-supplied suffix source
    pub fn with_suffix_source(prefix: impl Into<String>, suffix: fn() -> String) -> Self {
        Self {
            prefix: prefix.into(),
            suffix,
        }
    }

    pub fn next(&self, now: DateTime<Utc>) -> String {
        format!("{}-{}-{}", self.prefix, now.format("%Y%m%d"), (self.suffix)())
    }
}

fn random_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_uppercase()
}

impl Default for QuoteNumberGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}
