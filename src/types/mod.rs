mod catalog;
mod identity;
pub mod patch;
mod report;

pub use catalog::*;
pub use identity::*;
pub use report::*;
