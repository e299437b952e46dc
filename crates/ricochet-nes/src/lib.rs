//! Cycle-stepped NES emulation core.
//!
//! One system tick = one PPU cycle (5,369,318 Hz NTSC); the CPU and APU
//! step on every third tick. One frame = 341 PPU cycles × 262 scanlines.
//!
//! The host pushes an iNES image into [`Nes::new`], calls
//! [`Nes::run_frame`] on its own cadence, and receives the framebuffer,
//! audio batches, and input requests through callbacks. Battery RAM moves
//! in and out as a flat 8 KiB blob.

pub mod apu;
#[cfg(feature = "native")]
pub mod capture;
mod cartridge;
pub mod controller;
mod mapper;
mod nes;
mod palette;
pub mod ppu;
mod registers;

pub use apu::Apu;
pub use cartridge::{Cartridge, Header, Mirroring};
pub use controller::Controller;
pub use mapper::Mapper;
pub use nes::{Nes, NesBus};
pub use ppu::Ppu;
