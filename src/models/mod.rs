pub mod listing;
pub mod search_term;

pub use listing::{
    AggregatedResponse, CombinationBundle, Listing, RawListing, TermListings, TermResult,
};
pub use search_term::SearchTerm;
