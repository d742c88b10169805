mod net;
mod probe;
mod sampler;
mod types;
mod uptime;

pub use probe::{sysinfo_probe_factory, ProbeFactory, SysinfoProbe, SystemProbe};
pub use sampler::Sampler;
pub use types::{Connection, Endpoint, MemoryStats, Sample, Service, SocketEntry, TcpState};
pub use uptime::format_uptime;
