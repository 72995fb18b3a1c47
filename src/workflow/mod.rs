pub mod term_ctx;
pub mod term_fetcher;

pub use term_ctx::TermCtx;
pub use term_fetcher::TermFetcher;
