pub use context::RequestContext;
pub use errors::render_failures;
pub use timeout::{enforce_deadline, RequestDeadline, REQUEST_ID_HEADER};

mod context;
mod errors;
mod timeout;
