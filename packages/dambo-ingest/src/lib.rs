pub mod artifacts;
pub mod benefits;
pub mod checkpoint;
pub mod conditions;
pub mod convert;
pub mod coverage;
pub mod embed;
pub mod link;
pub mod parsers;
pub mod persist;
pub mod pipeline;
pub mod plan;
pub mod risk_events;
pub mod source;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
