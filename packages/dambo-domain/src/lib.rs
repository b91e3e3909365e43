pub mod amount;
pub mod coverage;
pub mod fuzzy;
pub mod query;
