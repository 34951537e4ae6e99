pub mod catalog;
pub mod health;
pub mod pricing;
pub mod quotes;
