use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::types::{Endpoint, SocketEntry, TcpState};

/// Reads every TCP socket known to the kernel, tagged with its owning pid
/// where the process table allows it.
#[cfg(target_os = "linux")]
pub fn read_socket_table() -> io::Result<Vec<SocketEntry>> {
    use log::debug;
    use std::fs;

    let owners = socket_owners();
    let mut entries = Vec::new();
    let mut last_err = None;
    let mut readable = 0;

    for path in ["/proc/net/tcp", "/proc/net/tcp6"] {
        match fs::read_to_string(path) {
            Ok(content) => {
                readable += 1;
                entries.extend(parse_proc_net(&content, &owners));
            }
            Err(err) => {
                debug!("{} unreadable: {}", path, err);
                last_err = Some(err);
            }
        }
    }

    match (readable, last_err) {
        (0, Some(err)) => Err(err),
        _ => Ok(entries),
    }
}

#[cfg(not(target_os = "linux"))]
pub fn read_socket_table() -> io::Result<Vec<SocketEntry>> {
    Ok(Vec::new())
}

/// Maps socket inodes to pids by walking `/proc/<pid>/fd`. Processes that
/// exit mid-walk or deny access are skipped.
#[cfg(target_os = "linux")]
fn socket_owners() -> HashMap<u64, u32> {
    use log::debug;
    use std::fs;

    let mut owners = HashMap::new();
    let Ok(proc_dir) = fs::read_dir("/proc") else {
        return owners;
    };

    let mut skipped = 0usize;
    for entry in proc_dir.flatten() {
        let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) else {
            continue;
        };
        let fds = match fs::read_dir(entry.path().join("fd")) {
            Ok(fds) => fds,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        for fd in fds.flatten() {
            if let Ok(link) = fs::read_link(fd.path()) {
                if let Some(inode) = parse_socket_link(&link.to_string_lossy()) {
                    owners.entry(inode).or_insert(pid);
                }
            }
        }
    }
    if skipped > 0 {
        debug!("socket owner scan skipped {} processes", skipped);
    }
    owners
}

fn parse_socket_link(link: &str) -> Option<u64> {
    link.strip_prefix("socket:[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

/// Parses the body of `/proc/net/tcp` or `/proc/net/tcp6`.
pub(crate) fn parse_proc_net(content: &str, owners: &HashMap<u64, u32>) -> Vec<SocketEntry> {
    let mut entries = Vec::new();

    for line in content.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 {
            continue;
        }

        let Some(local) = parse_hex_endpoint(fields[1]) else {
            continue;
        };
        let remote = parse_hex_endpoint(fields[2]).filter(|ep| !ep.is_unspecified());
        let state = TcpState::from_proc_code(fields[3]);
        let pid = fields[9]
            .parse::<u64>()
            .ok()
            .filter(|inode| *inode != 0)
            .and_then(|inode| owners.get(&inode).copied());

        entries.push(SocketEntry {
            local,
            remote,
            state,
            pid,
        });
    }

    entries
}

/// `0100007F:1F90` -> `127.0.0.1:8080`. Address words are in host byte
/// order, the port is already big-endian.
fn parse_hex_endpoint(raw: &str) -> Option<Endpoint> {
    let (addr, port) = raw.split_once(':')?;
    // Byte offsets below assume one byte per hex digit.
    if !addr.is_ascii() {
        return None;
    }
    let port = u16::from_str_radix(port, 16).ok()?;
    let ip = match addr.len() {
        8 => {
            let word = u32::from_str_radix(addr, 16).ok()?;
            IpAddr::V4(Ipv4Addr::from(word.to_ne_bytes()))
        }
        32 => {
            let mut octets = [0u8; 16];
            for (i, chunk) in octets.chunks_mut(4).enumerate() {
                let word = u32::from_str_radix(&addr[i * 8..i * 8 + 8], 16).ok()?;
                chunk.copy_from_slice(&word.to_ne_bytes());
            }
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _ => return None,
    };
    Some(Endpoint::new(ip, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Captured on a little-endian host.
    const TCP_TABLE: &str = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 4242 1 0000000000000000 100 0 0 10 0
   1: 0100007F:1F90 0100007F:D431 01 00000000:00000000 00:00000000 00000000  1000        0 4343 1 0000000000000000 20 4 30 10 -1
   2: 00000000:0016 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 0 1 0000000000000000 100 0 0 10 0
";

    #[test]
    #[cfg(target_endian = "little")]
    fn parses_ipv4_rows() {
        let owners = HashMap::from([(4242u64, 77u32)]);
        let entries = parse_proc_net(TCP_TABLE, &owners);
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].local.to_string(), "127.0.0.1:8080");
        assert_eq!(entries[0].remote, None);
        assert_eq!(entries[0].state, TcpState::Listen);
        assert_eq!(entries[0].pid, Some(77));

        assert_eq!(entries[1].state, TcpState::Established);
        assert_eq!(
            entries[1].remote.map(|ep| ep.to_string()),
            Some("127.0.0.1:54321".to_string())
        );
        assert_eq!(entries[1].pid, None);

        assert_eq!(entries[2].local.to_string(), "0.0.0.0:22");
        assert_eq!(entries[2].pid, None);
    }

    #[test]
    #[cfg(target_endian = "little")]
    fn parses_ipv6_loopback() {
        let ep = parse_hex_endpoint("00000000000000000000000001000000:0050").unwrap();
        assert_eq!(ep.to_string(), "::1:80");
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(parse_hex_endpoint("nonsense").is_none());
        assert!(parse_hex_endpoint("0100:1F90").is_none());
        assert!(parse_hex_endpoint("0100007F:ZZZZ").is_none());
    }

    #[test]
    fn rejects_multibyte_address_without_panicking() {
        let addr = format!("{}é", "0".repeat(30));
        assert_eq!(addr.len(), 32);
        assert!(parse_hex_endpoint(&format!("{addr}:0016")).is_none());

        let table = format!("  sl  local_address\n   0: {addr}:0016 00000000:0000 0A 0 0 0 0 0 77\n");
        assert!(parse_proc_net(&table, &HashMap::new()).is_empty());
    }

    #[test]
    fn socket_links() {
        assert_eq!(parse_socket_link("socket:[12345]"), Some(12345));
        assert_eq!(parse_socket_link("pipe:[12345]"), None);
        assert_eq!(parse_socket_link("/dev/null"), None);
    }
}
