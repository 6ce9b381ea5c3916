//! Memory obtained from the operating system.

/// Sizes of the memory mappings of the process, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OsMemory {
    /// Total virtual memory.
    pub virt: u64,
    /// Data segment and heap mappings.
    pub data: u64,
    /// Main stack.
    pub stack: u64,
}

/// Reads `/proc/self/status`.
#[cfg(target_os = "linux")]
pub struct OsMemoryReader {
    /// Opened on first use, then rewound on every read.
    reader: Option<std::io::BufReader<std::fs::File>>,
}

#[cfg(target_os = "linux")]
impl OsMemoryReader {
    pub fn new() -> Self {
        Self { reader: None }
    }

    pub fn read(&mut self) -> anyhow::Result<OsMemory> {
        use anyhow::Context;
        use std::io::{BufRead, BufReader, Seek};

        let reader = match self.reader.take() {
            Some(mut reader) => {
                reader.rewind().context("could not rewind /proc/self/status")?;
                reader
            }
            None => {
                let file = procfs::process::Process::myself()
                    .and_then(|p| p.open_relative("status"))
                    .context("could not open /proc/self/status")?;
                BufReader::new(file)
            }
        };
        let reader = self.reader.insert(reader);

        let mut mem = OsMemory::default();
        for line in (&mut *reader).lines() {
            let line = line.context("could not read line from /proc/self/status")?;
            if let Some((key, value)) = parse_status_line(&line) {
                match key {
                    "VmSize" => mem.virt = value,
                    "VmData" => mem.data = value,
                    "VmStk" => mem.stack = value,
                    _ => (),
                }
            }
        }
        Ok(mem)
    }
}

/// Stub for platforms without procfs: every size is zero.
#[cfg(not(target_os = "linux"))]
pub struct OsMemoryReader;

#[cfg(not(target_os = "linux"))]
impl OsMemoryReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&mut self) -> anyhow::Result<OsMemory> {
        Ok(OsMemory::default())
    }
}

impl Default for OsMemoryReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a line like `VmSize:	  123456 kB`, and returns the value in bytes.
///
/// Lines that do not hold a size (`Name:	foo`, `Threads:	3`) are ignored.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_status_line(line: &str) -> Option<(&str, u64)> {
    let (key, rest) = line.split_once(':')?;
    let mut s = rest.split_ascii_whitespace();
    let value: u64 = s.next()?.parse().ok()?;
    let value = convert_to_bytes(value, s.next()?)?;
    Some((key, value))
}

fn convert_to_bytes(value: u64, unit: &str) -> Option<u64> {
    // As in /proc/meminfo, "kB" actually means "kiB".
    match unit {
        "B" => Some(value),
        "kB" | "KiB" | "kiB" | "KB" => Some(value * 1024),
        "mB" | "MiB" | "miB" | "MB" => Some(value * 1024 * 1024),
        _ => None,
    }
}
