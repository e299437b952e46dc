//! Top-level NES system.
//!
//! Owns the CPU, the bus (PPU, APU, cartridge, RAM, controllers), and the
//! OAM DMA engine, and drives them on the system clock: the PPU ticks
//! every cycle, the CPU (or an in-progress DMA transfer) every third
//! cycle, with NMI and mapper IRQ delivery after both.
//!
//! Output leaves through host callbacks: the framebuffer once per
//! completed frame, audio in sample batches, and controller state pulled
//! on demand when a strobe write latches the shift registers. The emitted
//! buffers are only borrowed for the duration of the callback.

use ricochet_6502::{Cpu6502, Disassembly, disassemble};
use ricochet_core::{Bus, Cpu};

use crate::apu::{Apu, DEFAULT_SAMPLE_RATE};
use crate::cartridge::Cartridge;
use crate::controller::Controller;
use crate::ppu::Ppu;

/// Receives the completed 256x240 RGBA framebuffer once per frame.
pub type VideoCallback = Box<dyn FnMut(&[u8])>;
/// Receives batches of interleaved 16-bit stereo samples.
pub type AudioCallback = Box<dyn FnMut(&[i16])>;
/// Fills in one button byte per controller on demand.
pub type InputCallback = Box<dyn FnMut(&mut [u8; 2])>;

/// OAM DMA transfer state. Triggered by a $4014 write; moves 256 bytes
/// from CPU memory into PPU OAM, one read/write pair per CPU slot, after
/// a single alignment cycle.
#[derive(Debug)]
struct OamDma {
    page: u8,
    offset: u8,
    in_progress: bool,
    /// One dummy cycle aligns the transfer to an even CPU cycle.
    dummy: bool,
    data: u8,
}

impl OamDma {
    const fn idle() -> Self {
        Self {
            page: 0,
            offset: 0,
            in_progress: false,
            dummy: true,
            data: 0,
        }
    }
}

/// The CPU-visible bus: RAM, PPU registers, APU, controllers, cartridge.
pub struct NesBus {
    /// 2 KiB internal RAM ($0000-$07FF, mirrored through $1FFF).
    pub ram: [u8; 0x0800],
    pub ppu: Ppu,
    pub apu: Apu,
    pub cartridge: Cartridge,
    controllers: [Controller; 2],
    /// Page latched by a $4014 write, consumed by the tick loop.
    oam_dma_page: Option<u8>,
    input_callback: Option<InputCallback>,
}

impl NesBus {
    #[must_use]
    pub fn new(cartridge: Cartridge, sample_rate: u32) -> Self {
        Self {
            ram: [0; 0x0800],
            ppu: Ppu::new(),
            apu: Apu::new(sample_rate),
            cartridge,
            controllers: [Controller::new(), Controller::new()],
            oam_dma_page: None,
            input_callback: None,
        }
    }

    /// Latch both controllers from the host input callback.
    fn latch_controller(&mut self, index: usize) {
        let mut data = [0u8; 2];
        if let Some(callback) = self.input_callback.as_mut() {
            callback(&mut data);
        }
        self.controllers[index].latch(data[index]);
    }
}

impl Bus for NesBus {
    fn read(&mut self, address: u16) -> u8 {
        // The cartridge sees every address first and may claim it.
        if let Some(value) = self.cartridge.cpu_read(address) {
            return value;
        }

        match address {
            0x0000..=0x1FFF => self.ram[usize::from(address & 0x07FF)],
            0x2000..=0x3FFF => self.ppu.cpu_read(address & 0x0007, &self.cartridge),
            0x4015 => self.apu.read(address),
            0x4016 | 0x4017 => self.controllers[usize::from(address & 0x0001)].read(),
            _ => 0,
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        if self.cartridge.cpu_write(address, value) {
            return;
        }

        match address {
            0x0000..=0x1FFF => self.ram[usize::from(address & 0x07FF)] = value,
            0x2000..=0x3FFF => {
                self.ppu
                    .cpu_write(address & 0x0007, value, &mut self.cartridge);
            }
            0x4014 => self.oam_dma_page = Some(value),
            0x4016 | 0x4017 => self.latch_controller(usize::from(address & 0x0001)),
            0x4000..=0x4013 | 0x4015 => self.apu.write(address, value),
            _ => {}
        }
    }
}

/// The NES system.
pub struct Nes {
    cpu: Cpu6502,
    bus: NesBus,
    dma: OamDma,
    /// System tick counter — one increment per PPU cycle.
    ticks: u64,
    video_callback: Option<VideoCallback>,
    audio_callback: Option<AudioCallback>,
}

impl core::fmt::Debug for Nes {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Nes")
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl Nes {
    /// Build a system around an iNES image, at the default sample rate.
    ///
    /// # Errors
    ///
    /// Fails when the ROM image is rejected by the cartridge loader.
    pub fn new(rom_data: &[u8]) -> Result<Self, String> {
        Self::with_sample_rate(rom_data, DEFAULT_SAMPLE_RATE)
    }

    /// Build a system with an explicit audio sample rate.
    ///
    /// # Errors
    ///
    /// Fails when the ROM image is rejected by the cartridge loader.
    pub fn with_sample_rate(rom_data: &[u8], sample_rate: u32) -> Result<Self, String> {
        let cartridge = Cartridge::from_ines(rom_data)?;
        let mut nes = Self {
            cpu: Cpu6502::new(),
            bus: NesBus::new(cartridge, sample_rate),
            dma: OamDma::idle(),
            ticks: 0,
            video_callback: None,
            audio_callback: None,
        };
        nes.reset();
        Ok(nes)
    }

    /// Power-on reset: CPU vector fetch, PPU/APU registers, RAM, DMA.
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
        self.bus.ppu.reset();
        self.bus.apu.reset();
        self.bus.ram = [0; 0x0800];
        self.dma = OamDma::idle();
        self.bus.oam_dma_page = None;
        self.ticks = 0;
    }

    /// Advance one system clock. Returns true when the PPU completed a
    /// frame on this tick.
    pub fn tick(&mut self) -> bool {
        let frame_complete = self.bus.ppu.tick(&mut self.bus.cartridge);

        // CPU slot: every third system tick. An in-progress OAM DMA
        // steals the slot.
        if self.ticks % 3 == 0 {
            if let Some(page) = self.bus.oam_dma_page.take() {
                self.dma.page = page;
                self.dma.offset = 0;
                self.dma.in_progress = true;
            }

            if self.dma.in_progress {
                self.tick_dma();
            } else {
                self.cpu.tick(&mut self.bus);
            }

            // The APU shares the CPU clock.
            self.bus.apu.tick();
            if self.bus.apu.batch_ready() {
                let batch = self.bus.apu.take_batch();
                if let Some(callback) = self.audio_callback.as_mut() {
                    callback(&batch);
                }
            }
        }

        // Interrupt delivery happens after the chips have stepped.
        if self.bus.ppu.take_nmi() {
            self.cpu.nmi(&mut self.bus);
        }

        if self.bus.cartridge.irq_pending() {
            self.bus.cartridge.clear_irq();
            self.cpu.irq(&mut self.bus);
        }

        self.ticks += 1;

        if frame_complete {
            if let Some(callback) = self.video_callback.as_mut() {
                callback(self.bus.ppu.framebuffer());
            }
        }

        frame_complete
    }

    fn tick_dma(&mut self) {
        if self.dma.dummy {
            if self.ticks % 2 == 1 {
                self.dma.dummy = false;
            }
        } else if self.ticks % 2 == 0 {
            let address = (u16::from(self.dma.page) << 8) | u16::from(self.dma.offset);
            self.dma.data = self.bus.read(address);
        } else {
            self.bus.ppu.write_oam(self.dma.offset, self.dma.data);
            self.dma.offset = self.dma.offset.wrapping_add(1);
            if self.dma.offset == 0 {
                self.dma.in_progress = false;
                self.dma.dummy = true;
            }
        }
    }

    /// Run until the PPU completes a frame, then keep ticking until the
    /// CPU drains its in-flight instruction, so frame boundaries always
    /// fall on instruction boundaries.
    pub fn run_frame(&mut self) {
        while !self.tick() {}

        loop {
            self.tick();
            if self.cpu.cycles() == 0 {
                break;
            }
        }
    }

    // =====================================================================
    // Host interface
    // =====================================================================

    /// Deliver the framebuffer once per completed frame.
    pub fn set_video_callback(&mut self, callback: impl FnMut(&[u8]) + 'static) {
        self.video_callback = Some(Box::new(callback));
    }

    /// Deliver audio sample batches as they fill.
    pub fn set_audio_callback(&mut self, callback: impl FnMut(&[i16]) + 'static) {
        self.audio_callback = Some(Box::new(callback));
    }

    /// Supply controller bytes on demand (called at strobe writes).
    pub fn set_input_callback(&mut self, callback: impl FnMut(&mut [u8; 2]) + 'static) {
        self.bus.input_callback = Some(Box::new(callback));
    }

    /// Replace the PPU color table from a `.pal` file (exactly 0x600
    /// bytes).
    ///
    /// # Errors
    ///
    /// Rejects any other size; the current table is kept.
    pub fn load_palette(&mut self, bytes: &[u8]) -> Result<(), String> {
        self.bus.ppu.load_palette(bytes)
    }

    /// Dump the battery-backed cartridge RAM ($6000-$7FFF) through the
    /// bus. `None` when the cartridge has no persistent memory.
    pub fn battery_ram(&mut self) -> Option<Vec<u8>> {
        if !self.bus.cartridge.header().has_persistent_memory() {
            return None;
        }
        Some((0u16..0x2000).map(|i| self.bus.read(0x6000 + i)).collect())
    }

    /// Restore battery-backed cartridge RAM by writing each byte back
    /// through the bus. Ignored when the cartridge has no persistent
    /// memory.
    pub fn load_battery_ram(&mut self, data: &[u8]) {
        if !self.bus.cartridge.header().has_persistent_memory() {
            return;
        }
        for (i, &byte) in data.iter().take(0x2000).enumerate() {
            self.bus.write(0x6000 + i as u16, byte);
        }
    }

    /// Read without side effects: RAM and cartridge only, everything else
    /// reads as zero. Suitable for the disassembler.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        if let Some(value) = self.bus.cartridge.cpu_read(address) {
            return value;
        }
        match address {
            0x0000..=0x1FFF => self.bus.ram[usize::from(address & 0x07FF)],
            _ => 0,
        }
    }

    /// Disassemble the instruction at `address` through [`Nes::peek`].
    #[must_use]
    pub fn disassemble(&self, address: u16) -> Disassembly {
        disassemble(|addr| self.peek(addr), address)
    }

    /// The current framebuffer (256x240 RGBA bytes).
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        self.bus.ppu.framebuffer()
    }

    #[must_use]
    pub fn cpu(&self) -> &Cpu6502 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu6502 {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }

    /// System tick count (PPU cycles since power-on).
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
