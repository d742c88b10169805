pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod metrics;
pub mod store;
pub mod stream;
pub mod validate;

pub use api::{build_router, AppState};
pub use config::{ServerConfig, StoreBackend};
pub use metrics::{sysinfo_probe_factory, ProbeFactory, Sample, Sampler, SystemProbe};
pub use store::{MemoryStore, MetricsStore, RedisStore, RollingStore, HISTORY_CAPACITY};
pub use stream::{StreamEvent, StreamRegistry};
