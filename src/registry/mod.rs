pub mod cache;
pub mod record;

pub use cache::*;
pub use record::*;
