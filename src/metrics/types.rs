use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// One snapshot of host state, produced once per tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub cpu_usage: f32,
    pub memory: MemoryStats,
    pub uptime: String,
    pub network_connections: Vec<Connection>,
    pub active_ports: Vec<String>,
    pub active_services: Vec<Service>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub percent: f32,
}

impl MemoryStats {
    pub fn from_totals(total: u64, available: u64, used: u64) -> Self {
        let percent = if total > 0 {
            (total.saturating_sub(available) as f64 / total as f64 * 100.0) as f32
        } else {
            0.0
        };
        MemoryStats {
            total,
            available,
            used,
            percent: percent.clamp(0.0, 100.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub local_address: String,
    pub remote_address: Option<String>,
    pub status: TcpState,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub pid: u32,
    #[serde(rename = "name")]
    pub process_name: String,
    pub port: String,
}

/// Kernel TCP socket states, named the way `netstat` prints them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TcpState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
    Unknown,
}

impl TcpState {
    /// Maps the hex state column of `/proc/net/tcp`.
    pub fn from_proc_code(code: &str) -> Self {
        match u8::from_str_radix(code, 16) {
            Ok(0x01) => TcpState::Established,
            Ok(0x02) => TcpState::SynSent,
            Ok(0x03) => TcpState::SynRecv,
            Ok(0x04) => TcpState::FinWait1,
            Ok(0x05) => TcpState::FinWait2,
            Ok(0x06) => TcpState::TimeWait,
            Ok(0x07) => TcpState::Close,
            Ok(0x08) => TcpState::CloseWait,
            Ok(0x09) => TcpState::LastAck,
            Ok(0x0A) => TcpState::Listen,
            Ok(0x0B) => TcpState::Closing,
            _ => TcpState::Unknown,
        }
    }
}

/// `ip:port`, without brackets around IPv6 hosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub ip: IpAddr,
    pub port: u16,
}

impl Endpoint {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Endpoint { ip, port }
    }

    pub fn is_unspecified(&self) -> bool {
        self.ip.is_unspecified() && self.port == 0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// One row of the OS socket table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocketEntry {
    pub local: Endpoint,
    pub remote: Option<Endpoint>,
    pub state: TcpState,
    /// Owning process, when the kernel let us see it.
    pub pid: Option<u32>,
}
