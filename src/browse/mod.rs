//! Gallery browsing state: filters, the locally derived page view and the
//! pagination strip. Only `category`, `tag`, `min_fav` and `language` reach
//! the service; `min_rating` and sort are applied to the fetched page.

mod filters;
mod pagination;
mod session;
mod view;

pub use filters::*;
pub use pagination::*;
pub use session::*;
pub use view::*;
