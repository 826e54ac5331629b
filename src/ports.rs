/*!
Port dispatcher (§4.3): routes `IN`/`OUT` between embedder-registered
handlers and the built-in bank-selector (ports `0..=7`) and console I/O
(port `0x0F`) ports.

Like [`crate::decoder`], kept as free functions over the component
pieces rather than methods on one combined owner, so the "take the
handler out, call it, put it back" borrow trick (§9, grounded in the
teacher's `bus/clock.rs` `mem::replace` pattern) stays local to each
call site.
*/

use crate::console_io::{self, HostIo};
use crate::decoder;
use crate::devices::DeviceRegistry;
use crate::memory::Memory;
use crate::registers::Registers;

pub const CONSOLE_PORT: u8 = 0x0F;

/// `IN(p)` (§4.3). Assumes the caller has already applied the
/// pre-start/post-end guard (§4.1); this always attempts dispatch.
pub fn in_port(
    memory: &mut Memory,
    registry: &mut DeviceRegistry,
    host_io: &mut dyn HostIo,
    regs: Registers,
    port: u8,
) -> u8 {
    if let Some(mut handler) = registry.take_in_port(port) {
        let value = handler(memory, regs, port);
        registry.restore_in_port(port, handler);
        return value;
    }

    if port < 8 {
        return memory.banks().image_index(port);
    }
    if port == CONSOLE_PORT {
        return console_line_read(memory, registry, host_io, regs);
    }
    0xFF
}

/// `OUT(p, v)` (§4.3). Assumes the caller has already applied the
/// pre-start/post-end guard.
pub fn out_port(
    memory: &mut Memory,
    registry: &mut DeviceRegistry,
    host_io: &mut dyn HostIo,
    regs: Registers,
    port: u8,
    value: u8,
) {
    if let Some(mut handler) = registry.take_out_port(port) {
        handler(memory, regs, port, value);
        registry.restore_out_port(port, handler);
        return;
    }

    if port < 8 {
        memory.set_bank_selector(port, value);
        return;
    }
    if port == CONSOLE_PORT {
        console_length_prefixed_write(memory, registry, host_io, regs, value);
    }
}

/// Built-in port `0x0F` IN: prompt, read one line, copy up to `BC` bytes
/// into guest memory at `HL` (§4.3, §4.6). Always returns 0.
fn console_line_read(
    memory: &mut Memory,
    registry: &mut DeviceRegistry,
    host_io: &mut dyn HostIo,
    regs: Registers,
) -> u8 {
    let line = host_io.prompt_and_read_line();
    let addr = regs.hl();
    let max_len = regs.bc();
    console_io::copy_line_into_guest(&line, addr, max_len, |a, v| {
        decoder::write(memory, registry, a, v);
    });
    0
}

/// Built-in port `0x0F` OUT: read `value` bytes from guest memory at
/// `HL` and write them verbatim to host stdout (§4.3, §4.6). Never more
/// than 255 bytes, since `value` is a single byte.
fn console_length_prefixed_write(
    memory: &mut Memory,
    registry: &mut DeviceRegistry,
    host_io: &mut dyn HostIo,
    regs: Registers,
    value: u8,
) {
    let mut addr = regs.hl();
    let mut buf = Vec::with_capacity(value as usize);
    for _ in 0..value {
        buf.push(decoder::read(memory, registry, addr));
        addr = addr.wrapping_add(1);
    }
    host_io.write_bytes(&buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console_io::BufferHostIo;

    #[test]
    fn bank_ports_round_trip_without_a_custom_handler() {
        let mut memory = Memory::new(256);
        let mut registry = DeviceRegistry::new();
        let mut host_io = BufferHostIo::new([]);
        out_port(&mut memory, &mut registry, &mut host_io, Registers::default(), 2, 0x5A);
        assert_eq!(
            in_port(&mut memory, &mut registry, &mut host_io, Registers::default(), 2),
            0x5A
        );
    }

    #[test]
    fn unregistered_ports_read_as_0xff() {
        let mut memory = Memory::new(256);
        let mut registry = DeviceRegistry::new();
        let mut host_io = BufferHostIo::new([]);
        assert_eq!(
            in_port(&mut memory, &mut registry, &mut host_io, Registers::default(), 0x7E),
            0xFF
        );
    }

    #[test]
    fn registered_input_handler_is_used() {
        let mut memory = Memory::new(256);
        let mut registry = DeviceRegistry::new();
        registry.add_input_device(0x42, Box::new(|_mem, _regs, _port| 0x99));
        let mut host_io = BufferHostIo::new([]);
        assert_eq!(
            in_port(&mut memory, &mut registry, &mut host_io, Registers::default(), 0x42),
            0x99
        );
    }

    #[test]
    fn console_line_read_copies_up_to_bc_bytes_and_returns_zero() {
        let mut memory = Memory::new(256);
        let mut registry = DeviceRegistry::new();
        let mut host_io = BufferHostIo::new(["hi\n"]);
        let regs = Registers {
            h: 0x80,
            l: 0x00,
            b: 0x00,
            c: 0x10,
            ..Default::default()
        };
        let result = in_port(&mut memory, &mut registry, &mut host_io, regs, CONSOLE_PORT);
        assert_eq!(result, 0);
        assert_eq!(decoder::read(&mut memory, &mut registry, 0x8000), b'h');
        assert_eq!(decoder::read(&mut memory, &mut registry, 0x8001), b'i');
        assert_eq!(decoder::read(&mut memory, &mut registry, 0x8002), b'\n');
    }

    #[test]
    fn console_line_read_on_eof_writes_nothing() {
        let mut memory = Memory::new(256);
        let mut registry = DeviceRegistry::new();
        let mut host_io = BufferHostIo::new([]);
        let regs = Registers {
            h: 0x80,
            l: 0x00,
            b: 0x00,
            c: 0x10,
            ..Default::default()
        };
        let result = in_port(&mut memory, &mut registry, &mut host_io, regs, CONSOLE_PORT);
        assert_eq!(result, 0);
        assert_eq!(decoder::read(&mut memory, &mut registry, 0x8000), 0x00);
    }

    #[test]
    fn console_write_port_never_adds_a_newline() {
        let mut memory = Memory::new(256);
        let mut registry = DeviceRegistry::new();
        decoder::write(&mut memory, &mut registry, 0x8000, b'h');
        decoder::write(&mut memory, &mut registry, 0x8001, b'i');
        let mut host_io = BufferHostIo::new([]);
        let regs = Registers {
            h: 0x80,
            l: 0x00,
            ..Default::default()
        };
        out_port(&mut memory, &mut registry, &mut host_io, regs, CONSOLE_PORT, 2);
        assert_eq!(host_io.output, b"hi");
    }
}
