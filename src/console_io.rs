/*!
Console I/O port (§4.6): the built-in port `0x0F` line-read (IN) and
length-prefixed write (OUT) services.

The source talks to `stdin`/`stdout` directly through `fgets`/`printf`.
Here that's behind a small [`HostIo`] trait so the port logic (line
framing, `BC`-bounded copy, EOF-as-empty-line) can be unit tested without
blocking on a real terminal; [`StdHostIo`] is the default, process-wide
implementation an embedder gets unless it swaps one in via
`MachineBuilder::with_host_io`.
*/

use std::io::{self, Write};

/// Host-side stdin/stdout used by the console port.
pub trait HostIo {
    /// Print the `> ` prompt, then read one line from stdin. Returns the
    /// line *including* its trailing newline, or an empty string on EOF
    /// (§4.6: "the line is treated as empty").
    fn prompt_and_read_line(&mut self) -> String;

    /// Write bytes verbatim to stdout (no newline appended).
    fn write_bytes(&mut self, bytes: &[u8]);
}

/// Default [`HostIo`] backed by the process's real stdin/stdout.
#[derive(Debug, Default)]
pub struct StdHostIo;

impl HostIo for StdHostIo {
    fn prompt_and_read_line(&mut self) -> String {
        print!("> ");
        // A failed flush just means the prompt may not be visible before
        // the read blocks; not fatal to the read itself.
        let _ = io::stdout().flush();

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => String::new(), // EOF
            Ok(_) => line,
            Err(_) => String::new(), // HostIoFailure (§7): treated as empty line
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        let _ = io::stdout().write_all(bytes);
    }
}

/// Copy bytes from `line` into guest memory starting at `addr`, bounded by
/// `max_len` (the guest's BC register), via `write_byte`. Returns nothing;
/// the console port always returns 0 on IN regardless of how much was
/// copied (§4.3, §4.6).
pub fn copy_line_into_guest(line: &str, addr: u16, max_len: u16, mut write_byte: impl FnMut(u16, u8)) {
    let bytes = line.as_bytes();
    let n = bytes.len().min(max_len as usize);
    let mut dest = addr;
    for &b in &bytes[..n] {
        write_byte(dest, b);
        dest = dest.wrapping_add(1);
    }
}

#[cfg(test)]
pub struct BufferHostIo {
    pub lines: std::collections::VecDeque<String>,
    pub output: Vec<u8>,
}

#[cfg(test)]
impl BufferHostIo {
    pub fn new(lines: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            lines: lines.into_iter().map(String::from).collect(),
            output: Vec::new(),
        }
    }
}

#[cfg(test)]
impl HostIo for BufferHostIo {
    fn prompt_and_read_line(&mut self) -> String {
        self.lines.pop_front().unwrap_or_default()
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_up_to_max_len() {
        let mut dest = [0u8; 8];
        copy_line_into_guest("hello\n", 0, 3, |addr, v| dest[addr as usize] = v);
        assert_eq!(&dest[..3], b"hel");
        assert_eq!(dest[3], 0);
    }

    #[test]
    fn zero_max_len_writes_nothing() {
        let mut touched = false;
        copy_line_into_guest("hello\n", 0, 0, |_, _| touched = true);
        assert!(!touched);
    }
}
