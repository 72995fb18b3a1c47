pub mod catalog_source;
pub mod combination;
pub mod listing_normalizer;
pub mod listing_source;

pub use catalog_source::{CatalogSource, ChromiumLauncher};
pub use combination::aggregate;
pub use listing_normalizer::ListingNormalizer;
pub use listing_source::{ListingSource, SourceLauncher};
