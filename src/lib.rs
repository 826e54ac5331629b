#![doc = r#"
z80console: memory/port/bank dispatcher and machine lifecycle for a
minimal Z80-based console computer.

This crate does not implement a Z80 instruction interpreter. It owns the
console side of the machine: the 64 KiB bank-switched address space, the
8 KiB bank table, the pre-start device registry (port and memory-page
handlers, lifecycle handlers), the built-in console I/O port, and the
Configuring -> Running -> Ended lifecycle. A Z80 core is plugged in
against the `cpu::Bus`/`cpu::CpuAdapter` seam; `cpu::tiny_z80` ships a
minimal reference adapter for the crate's own tests and demo binary.

Modules:
- `registers`: the CPU register snapshot handed to port handlers
- `cpu`: the `Bus`/`CpuAdapter`/`ExecutionOutcome` seam, plus `tiny_z80`
- `memory`: ROM/RAM image sets and the bank table (`memory::banks`, `memory::images`)
- `devices`: the pre-start port/page/lifecycle handler registry
- `lifecycle`: the Configuring/Running/Ended state machine
- `console_io`: the built-in console port's host stdin/stdout service
- `decoder`: address decode layering device-page overlays over the bank table
- `ports`: port dispatch layering device handlers over the built-in ports
- `machine`: the `Machine`/`MachineBuilder` façade tying everything together
"#]

pub mod console_io;
pub mod cpu;
pub mod decoder;
pub mod devices;
pub mod lifecycle;
pub mod machine;
pub mod memory;
pub mod ports;
pub mod registers;

pub use cpu::{Bus, CpuAdapter, ExecutionOutcome};
pub use machine::{Machine, MachineBuilder};
pub use registers::Registers;
