/*!
CPU Adapter seam (§4.7, §6).

The Z80 instruction interpreter is an external collaborator (§1): this
crate never implements a complete Z80 core. What it owns is the *seam*
between such a core and the console — the [`Bus`] trait the core calls
into for memory/port access, and the [`CpuAdapter`] trait the console
drives to run instructions.

`execute` returns an [`ExecutionOutcome`] rather than firing a
return-hook callback mid-instruction: the source's `addReturnHandler`
callback is replaced here by a typed result, per the "callback-based
extension -> typed variants" guidance. The adapter itself is responsible
for recognizing a `RET` executed with `SP == 0` and reporting the
accumulator as the exit code when it happens.

[`tiny_z80`] is a reference adapter covering only the opcodes exercised
by this crate's own tests and demo binary; it is not a general-purpose
Z80 core.
*/

use crate::registers::Registers;

pub mod tiny_z80;

/// The console side of the seam: what a CPU adapter calls into for memory and port access.
///
/// Implementations see the *live* memory/port dispatch, meaning any
/// embedder-registered device handler observes accesses immediately, in
/// the order the CPU adapter issues them (§5).
pub trait Bus {
    /// Read a byte from the unified 64 KiB guest address space.
    fn read_byte(&mut self, addr: u16) -> u8;

    /// Write a byte to the unified 64 KiB guest address space.
    fn write_byte(&mut self, addr: u16, value: u8);

    /// Read a byte from an I/O port. `regs` is a snapshot of the guest
    /// registers at the time of the `IN` instruction, handed to any
    /// delegated port handler in place of a raw CPU pointer.
    fn in_port(&mut self, regs: Registers, port: u8) -> u8;

    /// Write a byte to an I/O port, with the same register snapshot as `in_port`.
    fn out_port(&mut self, regs: Registers, port: u8, value: u8);
}

/// Result of one [`CpuAdapter::execute`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Clock cycles actually consumed (opaque to this spec; not necessarily equal to the budget).
    pub clocks: u32,
    /// `Some(a)` exactly when this call executed a `RET` with `SP == 0`; `a` is the exit code.
    pub shutdown_code: Option<u8>,
}

/// The Z80 side of the seam: what the console drives to run guest instructions.
///
/// An implementation owns its own register file and is free to interpret
/// as much or as little of the Z80 instruction set as it likes; the
/// console only ever observes it through this trait.
pub trait CpuAdapter {
    /// Reset registers to power-on defaults (PC, SP, A, etc. all zero).
    fn reset(&mut self);

    /// Snapshot the registers this seam cares about.
    fn registers(&self) -> Registers;

    /// Ask the adapter to stop consuming its current execution budget as
    /// soon as it reaches an instruction boundary.
    fn request_break(&mut self);

    /// Run guest instructions against `bus` until `budget` clocks have
    /// been consumed, a break was requested, or a shutdown-triggering
    /// `RET` fires.
    fn execute<B: Bus>(&mut self, bus: &mut B, budget: u32) -> ExecutionOutcome;
}
