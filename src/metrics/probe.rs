use std::sync::Arc;

use sysinfo::{Pid, System};

use crate::error::{ProcessLookupError, SampleError};

use super::net::read_socket_table;
use super::types::{MemoryStats, SocketEntry};

/// OS queries the sampler is built from.
///
/// CPU usage is measured over a window: `begin_cpu_window` opens it and
/// `cpu_usage` closes it, the caller decides how long to wait in between.
pub trait SystemProbe: Send {
    fn begin_cpu_window(&mut self);
    fn cpu_usage(&mut self) -> Result<f32, SampleError>;
    fn memory(&mut self) -> Result<MemoryStats, SampleError>;
    /// Boot time as unix seconds.
    fn boot_time(&self) -> u64;
    fn sockets(&mut self) -> std::io::Result<Vec<SocketEntry>>;
    fn process_name(&mut self, pid: u32) -> Result<String, ProcessLookupError>;
}

/// Builds a fresh probe for each live stream.
pub type ProbeFactory = Arc<dyn Fn() -> Box<dyn SystemProbe> + Send + Sync>;

pub fn sysinfo_probe_factory() -> ProbeFactory {
    Arc::new(|| Box::new(SysinfoProbe::new()) as Box<dyn SystemProbe>)
}

pub struct SysinfoProbe {
    system: System,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        SysinfoProbe {
            system: System::new(),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe for SysinfoProbe {
    fn begin_cpu_window(&mut self) {
        self.system.refresh_cpu();
    }

    fn cpu_usage(&mut self) -> Result<f32, SampleError> {
        self.system.refresh_cpu();
        if self.system.cpus().is_empty() {
            return Err(SampleError::Cpu("cpu list empty".to_string()));
        }
        let usage = self.system.global_cpu_info().cpu_usage();
        Ok(usage.clamp(0.0, 100.0))
    }

    fn memory(&mut self) -> Result<MemoryStats, SampleError> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return Err(SampleError::Memory(
                "total memory reported as zero".to_string(),
            ));
        }
        Ok(MemoryStats::from_totals(
            total,
            self.system.available_memory(),
            self.system.used_memory(),
        ))
    }

    fn boot_time(&self) -> u64 {
        System::boot_time()
    }

    fn sockets(&mut self) -> std::io::Result<Vec<SocketEntry>> {
        read_socket_table()
    }

    fn process_name(&mut self, pid: u32) -> Result<String, ProcessLookupError> {
        let sys_pid = Pid::from_u32(pid);
        if !self.system.refresh_process(sys_pid) {
            return Err(ProcessLookupError::NoSuchProcess(pid));
        }
        match self.system.process(sys_pid) {
            Some(process) if process.name().is_empty() => {
                Err(ProcessLookupError::AccessDenied(pid))
            }
            Some(process) => Ok(process.name().to_string()),
            None => Err(ProcessLookupError::NoSuchProcess(pid)),
        }
    }
}
