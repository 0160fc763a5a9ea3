pub mod client;
pub mod offers;
pub mod products;

pub use client::{ApiRequestError, StorefrontApi, StorefrontClient};
pub use offers::{Offer, OfferError, OfferFetcher};
pub use products::CreatedProduct;
