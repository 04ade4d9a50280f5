//! Session publisher port
//!
//! A debate run publishes its events to a caller-established
//! publish/subscribe binding identified by the session id. The binding must
//! exist before the run starts.

use crate::ports::event_sink::EventSink;
use conclave_domain::SessionId;
use std::sync::Arc;

pub trait SessionPublisher: Send + Sync {
    /// Sink bound to `session`, or `None` when no binding exists.
    fn sink_for(&self, session: &SessionId) -> Option<Arc<dyn EventSink>>;
}
