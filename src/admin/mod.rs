mod dashboard;
mod form;
mod lifecycle;
mod poller;

pub use dashboard::*;
pub use form::*;
pub use lifecycle::*;
pub use poller::*;
