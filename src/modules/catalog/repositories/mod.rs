pub mod client_directory;
pub mod product_catalog;

pub use client_directory::{ClientDirectory, MySqlClientDirectory};
pub use product_catalog::{MySqlProductCatalog, ProductCatalog};
