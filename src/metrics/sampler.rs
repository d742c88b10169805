use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, warn};
use tokio::task;
use tokio::time::sleep;

use crate::error::SampleError;

use super::probe::SystemProbe;
use super::types::{Connection, Sample, Service, SocketEntry, TcpState};
use super::uptime::format_uptime;

/// Owns the OS handle between ticks. The handle is moved onto the blocking
/// pool for every sysinfo or `/proc` call, so it is `None` only while such a
/// call is in flight (or after that call panicked).
pub struct Sampler {
    probe: Option<Box<dyn SystemProbe>>,
}

impl Sampler {
    pub fn new(probe: Box<dyn SystemProbe>) -> Self {
        Sampler { probe: Some(probe) }
    }

    /// Takes one sample. CPU usage is averaged over `window`, so this call
    /// takes at least that long.
    ///
    /// Only CPU and memory failures fail the whole sample; socket and process
    /// lookups degrade to empty or missing entries.
    pub async fn sample(&mut self, window: Duration) -> Result<Sample, SampleError> {
        let started = Instant::now();

        self.blocking(|probe| probe.begin_cpu_window()).await?;
        sleep(window).await;
        let sample = self.blocking(collect).await??;

        debug!(
            "sample collected in {}ms ({} connections, {} ports, {} services)",
            started.elapsed().as_millis(),
            sample.network_connections.len(),
            sample.active_ports.len(),
            sample.active_services.len()
        );
        Ok(sample)
    }

    async fn blocking<T, F>(&mut self, f: F) -> Result<T, SampleError>
    where
        F: FnOnce(&mut dyn SystemProbe) -> T + Send + 'static,
        T: Send + 'static,
    {
        let mut probe = self
            .probe
            .take()
            .ok_or_else(|| SampleError::Collector("system handle lost".to_string()))?;
        let (probe, out) = task::spawn_blocking(move || {
            let out = f(probe.as_mut());
            (probe, out)
        })
        .await
        .map_err(|err| SampleError::Collector(err.to_string()))?;
        self.probe = Some(probe);
        Ok(out)
    }
}

fn collect(probe: &mut dyn SystemProbe) -> Result<Sample, SampleError> {
    let cpu_usage = probe.cpu_usage()?;
    let memory = probe.memory()?;
    let uptime = format_uptime(probe.boot_time(), Utc::now());

    let sockets = match probe.sockets() {
        Ok(sockets) => sockets,
        Err(err) => {
            warn!("socket table unavailable: {}", err);
            Vec::new()
        }
    };

    Ok(Sample {
        cpu_usage,
        memory,
        uptime,
        network_connections: established_connections(&sockets),
        active_ports: listening_ports(&sockets),
        active_services: listening_services(probe, &sockets),
    })
}

fn listening_services(probe: &mut dyn SystemProbe, sockets: &[SocketEntry]) -> Vec<Service> {
    let mut services = Vec::new();
    for socket in sockets.iter().filter(|s| s.state == TcpState::Listen) {
        let Some(pid) = socket.pid else {
            continue;
        };
        match probe.process_name(pid) {
            Ok(process_name) => services.push(Service {
                pid,
                process_name,
                port: socket.local.to_string(),
            }),
            Err(err) => debug!("skipping service on {}: {}", socket.local, err),
        }
    }
    services
}

fn established_connections(sockets: &[SocketEntry]) -> Vec<Connection> {
    sockets
        .iter()
        .filter(|s| s.state == TcpState::Established)
        .map(|s| Connection {
            local_address: s.local.to_string(),
            remote_address: s.remote.map(|ep| ep.to_string()),
            status: s.state,
        })
        .collect()
}

fn listening_ports(sockets: &[SocketEntry]) -> Vec<String> {
    sockets
        .iter()
        .filter(|s| s.state == TcpState::Listen)
        .map(|s| s.local.to_string())
        .collect()
}
