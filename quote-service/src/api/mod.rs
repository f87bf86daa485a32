mod awesome;

pub use awesome::QuoteFetcher;
