/*!
Device registry (§3, §4.4): the pre-start table of embedder-supplied
port and memory-page handlers, plus the ordered lifecycle handler lists.

The source's raw function pointers plus `void*` context become boxed
closures here (§9, "callback-based extension -> typed variants"): each
closure already carries whatever context it needs via capture, so there
is no separate context parameter to thread through.

Memory-mapped page handlers and lifecycle handlers are handed `&mut
Memory` (the "Machine pointer" from §6); port handlers are handed a
[`Registers`] snapshot (the "CPU pointer") plus `&mut Memory` so they can
still use the read/write helpers the source's CPU pointer exposed,
without being able to re-enter the port dispatcher itself.
*/

use crate::memory::Memory;
use crate::registers::Registers;

const PORT_COUNT: usize = 256;
const PAGE_COUNT: usize = 256;

pub type InputPortHandler = Box<dyn FnMut(&mut Memory, Registers, u8) -> u8>;
pub type OutputPortHandler = Box<dyn FnMut(&mut Memory, Registers, u8, u8)>;
pub type ReadPageHandler = Box<dyn FnMut(&mut Memory, u16) -> u8>;
pub type WritePageHandler = Box<dyn FnMut(&mut Memory, u16, u8)>;
pub type LifecycleHandler = Box<dyn FnMut(&mut Memory)>;

/// Pre-start device and lifecycle handler table (§4.4).
///
/// Every registration method returns `false` without mutating state once
/// `freeze()` has been called (mirrors the source's single boolean return
/// per registration call).
pub struct DeviceRegistry {
    in_port: Vec<Option<InputPortHandler>>,
    out_port: Vec<Option<OutputPortHandler>>,
    read_page: Vec<Option<ReadPageHandler>>,
    write_page: Vec<Option<WritePageHandler>>,
    start_handlers: Vec<LifecycleHandler>,
    end_handlers: Vec<LifecycleHandler>,
    frozen: bool,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        let mut in_port = Vec::with_capacity(PORT_COUNT);
        let mut out_port = Vec::with_capacity(PORT_COUNT);
        in_port.resize_with(PORT_COUNT, || None);
        out_port.resize_with(PORT_COUNT, || None);

        let mut read_page = Vec::with_capacity(PAGE_COUNT);
        let mut write_page = Vec::with_capacity(PAGE_COUNT);
        read_page.resize_with(PAGE_COUNT, || None);
        write_page.resize_with(PAGE_COUNT, || None);

        Self {
            in_port,
            out_port,
            read_page,
            write_page,
            start_handlers: Vec::new(),
            end_handlers: Vec::new(),
            frozen: false,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Freeze the registry (called once the Machine starts); all further
    /// registration calls return `false`.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Unfreeze and clear every table (used by `reset()`, §4.5).
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn add_input_device(&mut self, port: u8, handler: InputPortHandler) -> bool {
        if self.frozen {
            return false;
        }
        self.in_port[port as usize] = Some(handler);
        true
    }

    pub fn add_output_device(&mut self, port: u8, handler: OutputPortHandler) -> bool {
        if self.frozen {
            return false;
        }
        self.out_port[port as usize] = Some(handler);
        true
    }

    pub fn add_read_page_device(&mut self, page: u8, handler: ReadPageHandler) -> bool {
        if self.frozen {
            return false;
        }
        self.read_page[page as usize] = Some(handler);
        true
    }

    pub fn add_write_page_device(&mut self, page: u8, handler: WritePageHandler) -> bool {
        if self.frozen {
            return false;
        }
        self.write_page[page as usize] = Some(handler);
        true
    }

    pub fn add_start_handler(&mut self, handler: LifecycleHandler) -> bool {
        if self.frozen {
            return false;
        }
        self.start_handlers.push(handler);
        true
    }

    pub fn add_end_handler(&mut self, handler: LifecycleHandler) -> bool {
        if self.frozen {
            return false;
        }
        self.end_handlers.push(handler);
        true
    }

    pub fn fire_start_handlers(&mut self, memory: &mut Memory) {
        for handler in &mut self.start_handlers {
            handler(memory);
        }
    }

    pub fn fire_end_handlers(&mut self, memory: &mut Memory) {
        for handler in &mut self.end_handlers {
            handler(memory);
        }
    }

    /// Take the read-page handler for `page` out, if any, so the caller can
    /// invoke it with a disjoint `&mut Memory` borrow, then hand it back.
    /// Mirrors the teacher's `std::mem::replace` trick in `bus/clock.rs` for
    /// avoiding overlapping borrows through a single owning struct.
    pub fn take_read_page(&mut self, page: u8) -> Option<ReadPageHandler> {
        self.read_page[page as usize].take()
    }

    pub fn restore_read_page(&mut self, page: u8, handler: ReadPageHandler) {
        self.read_page[page as usize] = Some(handler);
    }

    pub fn take_write_page(&mut self, page: u8) -> Option<WritePageHandler> {
        self.write_page[page as usize].take()
    }

    pub fn restore_write_page(&mut self, page: u8, handler: WritePageHandler) {
        self.write_page[page as usize] = Some(handler);
    }

    pub fn take_in_port(&mut self, port: u8) -> Option<InputPortHandler> {
        self.in_port[port as usize].take()
    }

    pub fn restore_in_port(&mut self, port: u8, handler: InputPortHandler) {
        self.in_port[port as usize] = Some(handler);
    }

    pub fn take_out_port(&mut self, port: u8) -> Option<OutputPortHandler> {
        self.out_port[port as usize].take()
    }

    pub fn restore_out_port(&mut self, port: u8, handler: OutputPortHandler) {
        self.out_port[port as usize] = Some(handler);
    }

    pub fn has_read_page(&self, page: u8) -> bool {
        self.read_page[page as usize].is_some()
    }

    pub fn has_write_page(&self, page: u8) -> bool {
        self.write_page[page as usize].is_some()
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
