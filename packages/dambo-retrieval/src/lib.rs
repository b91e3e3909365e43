//! Hybrid retrieval over the clause embeddings: a natural-language query
//! mapper backed by database catalogs, a typed filter builder, the ANN
//! retriever with its fallback ladder and keyword boost, and the context
//! assembler that turns ranked hits into citation-ready text.

pub mod catalogs;
pub mod context;
pub mod filter;
pub mod query;
pub mod retriever;

mod error;
pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
