//! HTTP middleware components.

pub mod logging;
pub mod metrics;
pub mod security_headers;
pub mod session;
pub mod trace_id;

pub use logging::init_logging;
pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use security_headers::{security_headers_middleware, SecurityHeaders};
pub use session::{
    require_admin, require_ministry_admin, require_session, require_super_admin, Access,
};
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
