//! iNES cartridge: header parsing and PRG/CHR ownership.
//!
//! The cartridge owns the ROM arrays and the parsed header, and holds one
//! [`Mapper`] chosen from the header's mapper id. All reads and writes
//! delegate address translation to the mapper; physical offsets are masked
//! to the owning array's length so accesses can never run out of bounds.

use crate::mapper::{CpuRead, CpuWrite, Mapper};

/// Nametable mirroring arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    /// Nametables 0/1 share a page, 2/3 share the other (vertical scrolling).
    Horizontal,
    /// Nametables 0/2 share a page, 1/3 share the other (horizontal scrolling).
    Vertical,
    /// All four nametables map to the first page.
    SingleScreenLower,
    /// All four nametables map to the second page.
    SingleScreenUpper,
}

/// The 16-byte iNES header. Immutable once parsed.
#[derive(Debug, Clone)]
pub struct Header {
    magic: [u8; 4],
    prg_banks: u8,
    chr_banks: u8,
    flags: [u8; 5],
    #[allow(dead_code)]
    unused: [u8; 5],
}

impl Header {
    /// Parse the first 16 bytes of a ROM image.
    pub fn parse(data: &[u8]) -> Result<Self, String> {
        if data.len() < 16 {
            return Err("iNES file too short (< 16 byte header)".to_string());
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&data[0..4]);
        let mut flags = [0u8; 5];
        flags.copy_from_slice(&data[6..11]);
        let mut unused = [0u8; 5];
        unused.copy_from_slice(&data[11..16]);

        let header = Self {
            magic,
            prg_banks: data[4],
            chr_banks: data[5],
            flags,
            unused,
        };

        if header.magic != *b"NES\x1a" {
            return Err("invalid iNES magic (expected NES\\x1A)".to_string());
        }

        Ok(header)
    }

    /// PRG ROM size in 16 KiB banks.
    #[must_use]
    pub fn prg_banks(&self) -> u8 {
        self.prg_banks
    }

    /// CHR ROM size in 8 KiB banks. Zero means the board carries CHR RAM.
    #[must_use]
    pub fn chr_banks(&self) -> u8 {
        self.chr_banks
    }

    // Flags 6.

    /// Header mirroring bit. Mappers may override this.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        if self.flags[0] & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        }
    }

    /// Battery-backed PRG RAM present — the host should persist it.
    #[must_use]
    pub fn has_persistent_memory(&self) -> bool {
        self.flags[0] & 0x02 != 0
    }

    /// 512-byte trainer between header and PRG data.
    #[must_use]
    pub fn has_trainer(&self) -> bool {
        self.flags[0] & 0x04 != 0
    }

    /// Alternate (four-screen) nametable layout flag.
    #[must_use]
    pub fn uses_alternate_layout(&self) -> bool {
        self.flags[0] & 0x08 != 0
    }

    // Flags 7.

    #[must_use]
    pub fn is_vs_unisystem(&self) -> bool {
        self.flags[1] & 0x01 != 0
    }

    #[must_use]
    pub fn is_playchoice_10(&self) -> bool {
        self.flags[1] & 0x02 != 0
    }

    /// NES 2.0 format signature. Parsed as plain iNES regardless.
    #[must_use]
    pub fn is_nes2(&self) -> bool {
        self.flags[1] & 0x0C == 0x08
    }

    /// Mapper id: high nibble of flags 7, low nibble of flags 6.
    #[must_use]
    pub fn mapper_id(&self) -> u8 {
        (self.flags[1] & 0xF0) | (self.flags[0] >> 4)
    }

    // Flags 8-10, rarely used.

    /// PRG RAM size in 8 KiB units (flags 8).
    #[must_use]
    pub fn prg_ram_size(&self) -> u8 {
        self.flags[2]
    }

    /// PAL cartridge flag (flags 9).
    #[must_use]
    pub fn is_pal(&self) -> bool {
        self.flags[3] & 0x01 != 0
    }

    /// TV system bits (flags 10).
    #[must_use]
    pub fn tv_system(&self) -> u8 {
        self.flags[4] & 0x03
    }

    /// PRG RAM present (flags 10; the bit is inverted in the format).
    #[must_use]
    pub fn has_prg_ram(&self) -> bool {
        self.flags[4] & 0x10 == 0
    }

    /// Board has bus conflicts (flags 10).
    #[must_use]
    pub fn has_bus_conflicts(&self) -> bool {
        self.flags[4] & 0x20 != 0
    }
}

/// A loaded cartridge: header, PRG/CHR memory, and the selected mapper.
#[derive(Debug)]
pub struct Cartridge {
    header: Header,
    prg: Vec<u8>,
    chr: Vec<u8>,
    mapper: Mapper,
}

impl Cartridge {
    /// Load a cartridge from a complete iNES image.
    ///
    /// # Errors
    ///
    /// Fails on a bad magic tag or a file shorter than the header claims.
    /// Nothing is constructed on failure.
    pub fn from_ines(data: &[u8]) -> Result<Self, String> {
        let header = Header::parse(data)?;

        if header.prg_banks() == 0 {
            return Err("iNES file declares no PRG banks".to_string());
        }

        // Trainer data is obsolete; skip it without storing.
        let prg_start = if header.has_trainer() { 16 + 512 } else { 16 };
        let prg_len = usize::from(header.prg_banks()) * 0x4000;
        let chr_len = usize::from(header.chr_banks()) * 0x2000;

        if data.len() < prg_start + prg_len + chr_len {
            return Err(format!(
                "iNES file truncated: expected {} bytes, got {}",
                prg_start + prg_len + chr_len,
                data.len()
            ));
        }

        let prg = data[prg_start..prg_start + prg_len].to_vec();
        let chr = if chr_len > 0 {
            data[prg_start + prg_len..prg_start + prg_len + chr_len].to_vec()
        } else {
            // No CHR ROM: the board carries a fixed 8 KiB of CHR RAM.
            vec![0u8; 0x2000]
        };

        let mut mapper = Mapper::for_id(header.mapper_id(), header.prg_banks(), header.chr_banks());
        mapper.reset();

        Ok(Self {
            header,
            prg,
            chr,
            mapper,
        })
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    /// CPU-side read. `None` when the cartridge does not claim the address.
    #[must_use]
    pub fn cpu_read(&self, address: u16) -> Option<u8> {
        match self.mapper.map_cpu_read(address) {
            CpuRead::None => None,
            CpuRead::Value(value) => Some(value),
            CpuRead::Offset(offset) => Some(self.prg[offset & (self.prg.len() - 1)]),
        }
    }

    /// CPU-side write. Returns whether the cartridge claimed the address.
    pub fn cpu_write(&mut self, address: u16, value: u8) -> bool {
        match self.mapper.map_cpu_write(address, value) {
            CpuWrite::None => false,
            CpuWrite::Handled => true,
            CpuWrite::Offset(offset) => {
                let mask = self.prg.len() - 1;
                self.prg[offset & mask] = value;
                true
            }
        }
    }

    /// PPU-side read (pattern table address space).
    #[must_use]
    pub fn ppu_read(&self, address: u16) -> Option<u8> {
        self.mapper
            .map_ppu_read(address)
            .map(|offset| self.chr[offset & (self.chr.len() - 1)])
    }

    /// PPU-side write. Only CHR-RAM boards accept these.
    pub fn ppu_write(&mut self, address: u16, value: u8) -> bool {
        if let Some(offset) = self.mapper.map_ppu_write(address) {
            let mask = self.chr.len() - 1;
            self.chr[offset & mask] = value;
            true
        } else {
            false
        }
    }

    /// Effective mirroring: the mapper's override, else the header's bit.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.mapper
            .mirroring()
            .unwrap_or_else(|| self.header.mirroring())
    }

    /// Whether the mapper is asserting its IRQ line.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.mapper.irq_pending()
    }

    /// Acknowledge a delivered mapper IRQ.
    pub fn clear_irq(&mut self) {
        self.mapper.clear_irq();
    }

    /// End-of-visible-scanline notification (drives mapper 4's IRQ counter).
    pub fn end_of_scanline(&mut self) {
        self.mapper.end_of_scanline();
    }
}
