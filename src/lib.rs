pub mod config;
pub mod parser;
pub mod normalize;
pub mod filter;
pub mod similarity;
pub mod cluster;
pub mod source;
pub mod trending;

pub use cluster::{rank, QueryCount, RankedQuery};
pub use filter::filter;
pub use parser::SearchLogEntry;

#[cfg(test)]
mod timestamp_tests;
