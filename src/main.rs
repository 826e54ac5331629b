//! Minimal demo binary (§6.1): load a ROM file, run it to completion, print the exit code.
//!
//! Analogous in spirit to the teacher's own smoke-test `main.rs` (fixed
//! ROM path, drive-and-print loop), but takes the path from an argument
//! instead of a hardcoded literal. Does not implement the excluded CLI's
//! plugin-loading flags; those belong to an external front-end (§1, §6.1).

use std::env;
use std::process::ExitCode;

use z80console::cpu::tiny_z80::TinyZ80;
use z80console::Machine;

const CLOCKS_PER_STEP: u32 = 10_000;

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let Some(rom_path) = args.next() else {
        eprintln!("usage: z80console-demo <rom-file>");
        return ExitCode::FAILURE;
    };

    let data = match std::fs::read(&rom_path) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("failed to read {rom_path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut machine: Machine<TinyZ80> = Machine::new();
    machine.add_rom_data(&data);

    while !machine.is_ended() {
        if machine.execute(CLOCKS_PER_STEP) == 0 {
            break;
        }
    }

    let code = machine.return_code();
    println!("exit code: {code:#04x}");
    ExitCode::from(code)
}
