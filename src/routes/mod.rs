pub mod analysis;
pub mod articles;

pub use analysis::*;
pub use articles::*;
