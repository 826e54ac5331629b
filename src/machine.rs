/*!
Machine façade (§3, §4.5): the root entity tying together ROM/RAM
images, the bank table, the device registry, the lifecycle controller,
and a generic [`CpuAdapter`].

Generic over `C: CpuAdapter` rather than boxing a trait object, the same
way the teacher's `core::Cpu`/dispatch functions are generic over
`CpuRegs` (`src/cpu/dispatch/mod.rs`) instead of taking a trait object —
the concrete CPU type is known at the call site and monomorphization
keeps the hot `execute` path free of indirection.
*/

use crate::console_io::{HostIo, StdHostIo};
use crate::cpu::{Bus, CpuAdapter, ExecutionOutcome};
use crate::decoder;
use crate::devices::{
    DeviceRegistry, InputPortHandler, LifecycleHandler, OutputPortHandler, ReadPageHandler,
    WritePageHandler,
};
use crate::lifecycle::Lifecycle;
use crate::memory::Memory;
use crate::ports;
use crate::registers::Registers;

/// Builder for [`Machine`] (§1.1 "configuration"): mirrors the teacher's
/// constructor-parameter style rather than an external config-file crate.
pub struct MachineBuilder<C: CpuAdapter> {
    ram_count: usize,
    host_io: Box<dyn HostIo>,
    cpu: C,
}

impl<C: CpuAdapter + Default> MachineBuilder<C> {
    pub fn new() -> Self {
        Self {
            ram_count: crate::memory::DEFAULT_RAM_COUNT,
            host_io: Box::new(StdHostIo),
            cpu: C::default(),
        }
    }
}

impl<C: CpuAdapter + Default> Default for MachineBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CpuAdapter> MachineBuilder<C> {
    /// Build with an already-constructed CPU adapter instead of `C::default()`.
    pub fn with_cpu(cpu: C) -> Self {
        Self {
            ram_count: crate::memory::DEFAULT_RAM_COUNT,
            host_io: Box::new(StdHostIo),
            cpu,
        }
    }

    /// RAM page count (1..=256, clamped); default 256 (§3).
    pub fn ram_count(mut self, count: usize) -> Self {
        self.ram_count = count;
        self
    }

    /// Swap the console port's host stdin/stdout implementation (used by tests).
    pub fn with_host_io(mut self, host_io: impl HostIo + 'static) -> Self {
        self.host_io = Box::new(host_io);
        self
    }

    pub fn build(self) -> Machine<C> {
        Machine {
            memory: Memory::new(self.ram_count),
            registry: DeviceRegistry::new(),
            lifecycle: Lifecycle::new(),
            cpu: self.cpu,
            host_io: self.host_io,
        }
    }
}

/// A view bundling the disjoint borrows `Machine::execute` hands the CPU
/// adapter, implementing [`Bus`] over them. Exists only for the duration
/// of one `execute` call.
struct PortsView<'a> {
    memory: &'a mut Memory,
    registry: &'a mut DeviceRegistry,
    host_io: &'a mut dyn HostIo,
}

impl Bus for PortsView<'_> {
    fn read_byte(&mut self, addr: u16) -> u8 {
        decoder::read(self.memory, self.registry, addr)
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        decoder::write(self.memory, self.registry, addr, value);
    }

    fn in_port(&mut self, regs: Registers, port: u8) -> u8 {
        ports::in_port(self.memory, self.registry, self.host_io, regs, port)
    }

    fn out_port(&mut self, regs: Registers, port: u8, value: u8) {
        ports::out_port(self.memory, self.registry, self.host_io, regs, port, value);
    }
}

/// The root console-computer entity (§3).
pub struct Machine<C: CpuAdapter> {
    memory: Memory,
    registry: DeviceRegistry,
    lifecycle: Lifecycle,
    cpu: C,
    host_io: Box<dyn HostIo>,
}

impl<C: CpuAdapter + Default> Machine<C> {
    /// Construct with default RAM count (256) and the process's real stdin/stdout.
    pub fn new() -> Self {
        MachineBuilder::new().build()
    }
}

impl<C: CpuAdapter + Default> Default for Machine<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CpuAdapter> Machine<C> {
    pub fn rom_count(&self) -> usize {
        self.memory.rom_count()
    }

    pub fn ram_count(&self) -> usize {
        self.memory.ram_count()
    }

    pub fn is_ended(&self) -> bool {
        self.lifecycle.is_ended()
    }

    /// The accumulator at the moment of (or since) shutdown; meaningless before shutdown.
    pub fn return_code(&self) -> u8 {
        self.cpu.registers().a
    }

    /// Append ROM bytes, splitting into 8 KiB pages (§3). Fails (`false`) once started.
    pub fn add_rom_data(&mut self, data: &[u8]) -> bool {
        if !self.lifecycle.is_configurable() {
            return false;
        }
        self.memory.add_rom_data(data);
        true
    }

    /// Clamp and set the RAM page count (§8 boundary behaviors). Fails once started.
    pub fn set_ram_count(&mut self, count: usize) -> bool {
        if !self.lifecycle.is_configurable() {
            return false;
        }
        self.memory.set_ram_count(count);
        true
    }

    /// Reconfigure the bank table's RAM region (§4.2). Fails once started.
    pub fn reset_banks(&mut self, ram_start: u8, ram_end: u8) -> bool {
        if !self.lifecycle.is_configurable() {
            return false;
        }
        self.memory.reset_banks(ram_start, ram_end);
        true
    }

    pub fn add_input_device(&mut self, port: u8, handler: InputPortHandler) -> bool {
        self.gate(|m| m.registry.add_input_device(port, handler))
    }

    pub fn add_output_device(&mut self, port: u8, handler: OutputPortHandler) -> bool {
        self.gate(|m| m.registry.add_output_device(port, handler))
    }

    pub fn add_read_page_device(&mut self, page: u8, handler: ReadPageHandler) -> bool {
        self.gate(|m| m.registry.add_read_page_device(page, handler))
    }

    pub fn add_write_page_device(&mut self, page: u8, handler: WritePageHandler) -> bool {
        self.gate(|m| m.registry.add_write_page_device(page, handler))
    }

    pub fn add_start_handler(&mut self, handler: LifecycleHandler) -> bool {
        self.gate(|m| m.registry.add_start_handler(handler))
    }

    pub fn add_end_handler(&mut self, handler: LifecycleHandler) -> bool {
        self.gate(|m| m.registry.add_end_handler(handler))
    }

    /// The registry already enforces its own freeze, but short-circuit
    /// here too so a configuration call never touches state once started.
    fn gate(&mut self, f: impl FnOnce(&mut Self) -> bool) -> bool {
        if !self.lifecycle.is_configurable() {
            return false;
        }
        f(self)
    }

    /// Drive the CPU for up to `clocks` cycles (§4.5). Returns the clocks
    /// actually consumed, or 0 if there is no ROM or the machine has ended.
    pub fn execute(&mut self, clocks: u32) -> u32 {
        if self.memory.rom_count() == 0 || self.lifecycle.is_ended() {
            return 0;
        }

        if self.lifecycle.is_configurable() {
            self.registry.fire_start_handlers(&mut self.memory);
            self.registry.freeze();
            self.lifecycle.start();
        }

        let outcome: ExecutionOutcome = {
            let Machine {
                memory,
                registry,
                cpu,
                host_io,
                ..
            } = self;
            let mut view = PortsView {
                memory,
                registry,
                host_io: host_io.as_mut(),
            };
            cpu.execute(&mut view, clocks)
        };

        if outcome.shutdown_code.is_some() {
            self.registry.fire_end_handlers(&mut self.memory);
            self.lifecycle.end();
        }

        outcome.clocks
    }

    /// Ended -> Configuring (§4.5): zero RAM, clear the registry, reset CPU
    /// registers, and reapply the current bank configuration. A silent
    /// state-clear: end handlers already fired exactly once, in `execute`,
    /// at the moment shutdown was detected, and are not fired again here.
    /// The source re-fires them a second time on `reset()`; §9 calls that
    /// "likely a bug" and recommends firing end handlers exactly once per
    /// shutdown, which is the behavior implemented here.
    pub fn reset(&mut self) {
        self.memory.zero_ram();
        self.registry.clear();
        self.cpu.reset();
        let ram_start = self.memory.banks().ram_start();
        let ram_end = self.memory.banks().ram_end();
        self.memory.reset_banks(ram_start, ram_end);
        self.lifecycle.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::tiny_z80::TinyZ80;

    fn machine() -> Machine<TinyZ80> {
        Machine::new()
    }

    #[test]
    fn minimal_exit_code() {
        let mut m = machine();
        assert!(m.add_rom_data(&[0x3E, 0x2A, 0xC9]));
        m.execute(1000);
        assert!(m.is_ended());
        assert_eq!(m.return_code(), 0x2A);
    }

    #[test]
    fn ram_round_trip() {
        // LD A,0x5A ; LD (0x8000),A ; LD A,0x00 ; LD A,(0x8000) ; RET
        let program = [
            0x3E, 0x5A, // LD A, 0x5A
            0x32, 0x00, 0x80, // LD (0x8000), A
            0x3E, 0x00, // LD A, 0x00 (clobber so the next load is meaningful)
            0x3A, 0x00, 0x80, // LD A, (0x8000)
            0xC9, // RET
        ];
        let mut m = machine();
        assert!(m.add_rom_data(&program));
        m.execute(1000);
        assert!(m.is_ended());
        assert_eq!(m.return_code(), 0x5A);
    }

    #[test]
    fn bank_switch_selects_second_rom_page() {
        // Window 0 (0x0000-0x1FFF) keeps running the bootstrap unchanged;
        // only window 1 (0x2000-0x3FFF) gets repointed at a third ROM page,
        // so the fetch stream itself is never disturbed by the switch.
        let program = [
            0x3E, 0x02, // LD A, 2
            0xD3, 0x01, // OUT (1), A   -> window 1 now selects ROM page 2
            0x3A, 0x01, 0x20, // LD A, (0x2001)
            0xC9, // RET
        ];
        let mut rom = program.to_vec();
        rom.resize(0x2000, 0); // page 0: bootstrap
        rom.resize(0x4000, 0); // page 1: window 1's default page, unused
        let mut target_page = [0u8; 0x2000];
        target_page[1] = 0x77;
        rom.extend_from_slice(&target_page); // page 2: window 1's switched-to page

        let mut m = machine();
        assert!(m.add_rom_data(&rom));
        m.execute(1000);
        assert!(m.is_ended());
        assert_eq!(m.return_code(), 0x77);
    }

    #[test]
    fn registered_port_handler_is_invoked_exactly_once() {
        let calls = std::rc::Rc::new(std::cell::Cell::new(0u32));
        let calls2 = calls.clone();
        let mut m = machine();
        m.add_input_device(
            0x42,
            Box::new(move |_mem, _regs, _port| {
                calls2.set(calls2.get() + 1);
                0x99
            }),
        );
        let program = [0xDB, 0x42, 0xC9]; // IN A,(0x42) ; RET
        assert!(m.add_rom_data(&program));
        m.execute(1000);
        assert_eq!(m.return_code(), 0x99);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn memory_mapped_page_handler_overrides_bank_region() {
        let mut m = machine();
        m.add_read_page_device(0xC0, Box::new(|_mem, addr| (addr & 0xFF) as u8));
        let program = [
            0x3A, 0x37, 0xC0, // LD A, (0xC037)
            0xC9, // RET
        ];
        assert!(m.add_rom_data(&program));
        m.execute(1000);
        assert_eq!(m.return_code(), 0x37);
    }

    #[test]
    fn lifecycle_handlers_fire_in_order_and_freeze_after_first_execute() {
        let order = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut m = machine();
        for (prefix, label) in [("s", 1), ("s", 2)] {
            let o = order.clone();
            m.add_start_handler(Box::new(move |_mem| o.borrow_mut().push(format!("{prefix}{label}"))));
        }
        for (prefix, label) in [("e", 1), ("e", 2)] {
            let o = order.clone();
            m.add_end_handler(Box::new(move |_mem| o.borrow_mut().push(format!("{prefix}{label}"))));
        }
        assert!(m.add_rom_data(&[0xC9])); // RET with SP==0 -> immediate shutdown
        m.execute(1000);
        assert_eq!(*order.borrow(), vec!["s1", "s2", "e1", "e2"]);

        assert!(!m.add_start_handler(Box::new(|_| {})));
        assert!(!m.add_rom_data(&[0x00]));
    }

    #[test]
    fn after_shutdown_execute_returns_zero_and_reads_are_0xff() {
        let mut m = machine();
        assert!(m.add_rom_data(&[0xC9]));
        m.execute(1000);
        assert!(m.is_ended());
        assert_eq!(m.execute(1000), 0);
    }

    #[test]
    fn ram_count_clamps_to_valid_range() {
        let mut m = machine();
        assert!(m.set_ram_count(0));
        assert_eq!(m.ram_count(), 1);
        assert!(m.set_ram_count(500));
        assert_eq!(m.ram_count(), 256);
    }

    #[test]
    fn configuration_fails_after_start() {
        let mut m = machine();
        assert!(m.add_rom_data(&[0xC9]));
        m.execute(1000);
        assert!(!m.add_rom_data(&[0x00]));
        assert!(!m.set_ram_count(10));
        assert!(!m.reset_banks(0, 0));
    }
}
