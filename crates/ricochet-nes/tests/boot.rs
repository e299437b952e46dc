//! End-to-end tests against hand-assembled ROMs.
//!
//! Each test builds a minimal NROM image as a byte array, boots the
//! system, and drives it through the public host interface only.

use ricochet_nes::Nes;

/// Empty 32 KiB PRG + 8 KiB CHR iNES image with vectors wired up:
/// reset → $8000, NMI/IRQ → an RTI at $FF00.
fn blank_rom() -> Vec<u8> {
    let mut rom = vec![0u8; 16 + 0x8000 + 0x2000];
    rom[0..4].copy_from_slice(b"NES\x1a");
    rom[4] = 2; // 2 x 16 KiB PRG
    rom[5] = 1; // 1 x 8 KiB CHR
    rom[16 + 0x7F00] = 0x40; // RTI
    rom[16 + 0x7FFA] = 0x00;
    rom[16 + 0x7FFB] = 0xFF;
    rom[16 + 0x7FFC] = 0x00;
    rom[16 + 0x7FFD] = 0x80;
    rom[16 + 0x7FFE] = 0x00;
    rom[16 + 0x7FFF] = 0xFF;
    rom
}

/// Standard init, two VBlank polls on $2002, then an idle loop.
fn build_boot_rom() -> Vec<u8> {
    let mut rom = blank_rom();

    // $8000: 78        SEI
    // $8001: D8        CLD
    // $8002: A2 FF     LDX #$FF
    // $8004: 9A        TXS
    // $8005: AD 02 20  vblank1: LDA $2002
    // $8008: 10 FB     BPL vblank1
    // $800A: AD 02 20  vblank2: LDA $2002
    // $800D: 10 FB     BPL vblank2
    // $800F: 4C 0F 80  idle: JMP idle
    #[rustfmt::skip]
    let code: &[u8] = &[
        0x78,
        0xD8,
        0xA2, 0xFF,
        0x9A,
        0xAD, 0x02, 0x20,
        0x10, 0xFB,
        0xAD, 0x02, 0x20,
        0x10, 0xFB,
        0x4C, 0x0F, 0x80,
    ];
    rom[16..16 + code.len()].copy_from_slice(code);
    rom
}

#[test]
fn boot_reaches_idle_loop() {
    let mut nes = Nes::new(&build_boot_rom()).expect("boot ROM parses");
    assert_eq!(nes.cpu().pc, 0x8000, "reset vector");

    // Two VBlank waits need about two frames; run five to be safe. Frame
    // boundaries land on instruction boundaries, so once the loop is
    // reached the PC sits exactly on the JMP.
    let mut reached = false;
    for _ in 0..5 {
        nes.run_frame();
        if (0x800F..=0x8011).contains(&nes.cpu().pc) {
            reached = true;
            break;
        }
    }
    assert!(
        reached,
        "did not reach idle loop, stuck at ${:04X}",
        nes.cpu().pc
    );
}

/// Init, palette + nametable setup, then rendering enabled: a single
/// solid tile at row 14, column 12 on a black backdrop.
fn build_render_rom() -> Vec<u8> {
    let mut rom = blank_rom();

    // $8000: SEI / CLD / LDX #$FF / TXS
    // $8005: LDA #$00 / STA $2001             ; rendering off for setup
    // $800A: LDA $2002 / BPL $800A            ; VBlank wait 1
    // $800F: LDA $2002 / BPL $800F            ; VBlank wait 2
    // $8014: LDA $2002                        ; reset address latch
    // $8017: LDA #$3F / STA $2006
    // $801C: LDA #$00 / STA $2006             ; PPU address = $3F00
    // $8021: LDA #$0F / STA $2007             ; backdrop = black
    // $8026: LDA #$30 / STA $2007             ; palette entry 1 = white
    // $802B: LDA #$21 / STA $2006
    // $8030: LDA #$CC / STA $2006             ; PPU address = $21CC
    // $8035: LDA #$01 / STA $2007             ; tile 1 at row 14, col 12
    // $803A: LDA #$00 / STA $2005 / STA $2005 ; scroll = (0, 0)
    // $8042: LDA #$1E / STA $2001             ; rendering on
    // $8047: JMP $8047                        ; idle
    #[rustfmt::skip]
    let code: &[u8] = &[
        0x78,
        0xD8,
        0xA2, 0xFF,
        0x9A,
        0xA9, 0x00,
        0x8D, 0x01, 0x20,
        0xAD, 0x02, 0x20,
        0x10, 0xFB,
        0xAD, 0x02, 0x20,
        0x10, 0xFB,
        0xAD, 0x02, 0x20,
        0xA9, 0x3F,
        0x8D, 0x06, 0x20,
        0xA9, 0x00,
        0x8D, 0x06, 0x20,
        0xA9, 0x0F,
        0x8D, 0x07, 0x20,
        0xA9, 0x30,
        0x8D, 0x07, 0x20,
        0xA9, 0x21,
        0x8D, 0x06, 0x20,
        0xA9, 0xCC,
        0x8D, 0x06, 0x20,
        0xA9, 0x01,
        0x8D, 0x07, 0x20,
        0xA9, 0x00,
        0x8D, 0x05, 0x20,
        0x8D, 0x05, 0x20,
        0xA9, 0x1E,
        0x8D, 0x01, 0x20,
        0x4C, 0x47, 0x80,
    ];
    rom[16..16 + code.len()].copy_from_slice(code);

    // CHR tile 1: bitplane 0 solid, bitplane 1 clear → palette index 1
    // across the whole 8x8 tile.
    let chr_offset = 16 + 0x8000;
    for byte in &mut rom[chr_offset + 16..chr_offset + 24] {
        *byte = 0xFF;
    }

    rom
}

#[test]
fn background_tile_renders() {
    let mut nes = Nes::new(&build_render_rom()).expect("render ROM parses");

    // Setup takes ~2 frames of VBlank waits; run plenty so the scroll
    // registers settle into a steady frame.
    for _ in 0..10 {
        nes.run_frame();
    }

    let fb = nes.framebuffer();
    let pixel = |x: usize, y: usize| {
        let offset = (y * 256 + x) * 4;
        (fb[offset], fb[offset + 1], fb[offset + 2], fb[offset + 3])
    };

    // Center of the solid tile: row 14 → y 112-119, col 12 → x 96-103.
    // Palette entry 1 is $30 = (236, 238, 236).
    assert_eq!(pixel(100, 116), (236, 238, 236, 255), "tile interior");

    // Far corner of the backdrop: palette $0F = black.
    assert_eq!(pixel(200, 60), (0, 0, 0, 255), "backdrop");
}

#[test]
fn video_callback_delivers_rendered_frame() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut nes = Nes::new(&build_render_rom()).expect("render ROM parses");
    let last_frame: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    {
        let last_frame = Rc::clone(&last_frame);
        nes.set_video_callback(move |fb| {
            let mut frame = last_frame.borrow_mut();
            frame.clear();
            frame.extend_from_slice(fb);
        });
    }

    for _ in 0..10 {
        nes.run_frame();
    }

    let frame = last_frame.borrow();
    assert_eq!(frame.len(), 256 * 240 * 4);
    let offset = (116 * 256 + 100) * 4;
    assert_eq!(frame[offset], 236, "callback sees the rendered tile");
}

#[test]
fn palette_file_size_is_validated() {
    let mut nes = Nes::new(&build_boot_rom()).expect("boot ROM parses");
    assert!(nes.load_palette(&[0u8; 192]).is_err());
    assert!(nes.load_palette(&[0u8; 0x600]).is_ok());
}

#[test]
fn invalid_rom_is_rejected() {
    let mut rom = build_boot_rom();
    rom[1] = b'?';
    let err = Nes::new(&rom).expect_err("bad magic accepted");
    assert!(err.contains("magic"));
}

#[test]
fn battery_save_round_trip() {
    // MMC1 cartridge with the battery flag set.
    let mut rom = blank_rom();
    rom[6] = 0x12; // mapper 1, persistent memory
    let mut nes = Nes::new(&rom).expect("MMC1 ROM parses");

    let save: Vec<u8> = (0..0x2000u32).map(|i| (i % 251) as u8).collect();
    nes.load_battery_ram(&save);
    assert_eq!(nes.battery_ram().expect("battery present"), save);

    // A battery-less cartridge exports nothing.
    let mut plain = Nes::new(&build_boot_rom()).expect("boot ROM parses");
    assert!(plain.battery_ram().is_none());
}
