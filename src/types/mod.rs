pub mod args;
pub mod errors;
pub mod metadata;

pub use args::*;
pub use errors::*;
pub use metadata::*;
