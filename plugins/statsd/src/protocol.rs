//! Statsd line protocol, restricted to gauges.
//!
//! A gauge is sent as `<bucket>:<value>|g`, where the bucket is the key
//! prefixed by the namespace of the emitter: `rust.myhost.mem.heap.alloc:1024|g`.

use std::fmt::Write;

/// Characters that have a meaning in the protocol, they cannot appear in a bucket name.
pub(crate) const RESERVED: [char; 3] = [':', '|', '@'];

/// Formats a gauge.
pub fn gauge(prefix: &str, key: &str, value: u64) -> String {
    let mut line = String::with_capacity(prefix.len() + key.len() + 24);
    if !prefix.is_empty() {
        line.push_str(prefix);
        line.push('.');
    }
    line.push_str(key);
    // writing to a String never fails
    let _ = write!(line, ":{value}|g");
    line
}

/// Returns `true` if `name` can be used in a bucket name.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.chars().any(|c| RESERVED.contains(&c) || c.is_whitespace() || c.is_control())
}

/// Turns an arbitrary string (e.g. a hostname) into a single bucket segment.
pub(crate) fn sanitize_segment(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c == '.' || RESERVED.contains(&c) || c.is_whitespace() || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}
