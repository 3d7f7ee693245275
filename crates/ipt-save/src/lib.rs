pub mod command;
pub mod stream;

pub use command::*;
pub use stream::*;
