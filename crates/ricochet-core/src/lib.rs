//! Core traits and types for cycle-accurate emulation.
//!
//! Components communicate over a byte-wide [`Bus`] with a 16-bit address
//! space. CPUs implement [`Cpu`] and are advanced one cycle at a time;
//! every other piece of timing derives from how often the system chooses
//! to tick them.

mod bus;
mod cpu;
mod simple_bus;

pub use bus::Bus;
pub use cpu::Cpu;
pub use simple_bus::SimpleBus;
