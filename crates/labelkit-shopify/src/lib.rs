pub mod client;
pub mod error;
mod rate_limit;
pub mod types;

pub use client::{graphql_url, title_filter, AdminClient};
pub use error::ShopifyError;
pub use types::{AdminProduct, ProductPage, ProductQuery};
