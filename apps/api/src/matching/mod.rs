// Matching pipeline: fetch profiles → score dimensions → aggregate → report.
// Handlers and admin commands go through `MatchService`; nothing else calls the store.

pub mod aggregator;
pub mod cache;
pub mod error;
pub mod fetcher;
pub mod handlers;
pub mod reporter;
pub mod scorer;
pub mod service;
pub mod weights;
