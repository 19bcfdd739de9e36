mod category;
mod gallery;
mod queue;
mod stats;
mod task;

pub use category::*;
pub use gallery::*;
pub use queue::*;
pub use stats::*;
pub use task::*;
