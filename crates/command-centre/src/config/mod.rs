pub mod cli;
pub mod monitor;

pub use cli::*;
pub use monitor::*;
