//! Resident memory of another process.
//!
//! Linux exposes it as the `VmRSS` line of `/proc/<pid>/status`. Other
//! platforms report nothing and memory budgets cannot be enforced there.

/// Whether [`resident_memory_bytes`] can observe memory on this platform.
pub const fn is_supported() -> bool {
    cfg!(target_os = "linux")
}

/// Current resident set size of `pid` in bytes.
#[cfg(target_os = "linux")]
pub fn resident_memory_bytes(pid: u32) -> Option<u64> {
    let status = std::fs::read_to_string(format!("/proc/{pid}/status")).ok()?;
    parse_vm_rss(&status)
}

/// Stub for non-Linux platforms.
#[cfg(not(target_os = "linux"))]
pub fn resident_memory_bytes(_pid: u32) -> Option<u64> {
    None
}

/// Extracts `VmRSS` (reported in kB) from a `/proc/<pid>/status` dump.
pub fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}
