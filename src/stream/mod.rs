mod controller;
mod registry;

pub use controller::{spawn_live_stream, LiveStream, StreamEvent, StreamState};
pub use registry::{StreamId, StreamRegistry};
