pub mod config;
pub mod counters;
pub mod error;
pub mod model;
pub mod parser;
pub mod rule;

pub use config::*;
pub use counters::Counters;
pub use error::*;
pub use model::*;
pub use parser::*;
pub use rule::*;
