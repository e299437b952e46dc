//! Headless NES runner.
//!
//! Plays the host role for the emulation core: loads a ROM (and
//! optionally a palette and a battery save), runs a number of frames, and
//! captures the results — screenshot, audio dump, updated save file.

use std::cell::RefCell;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;
use std::{env, fs};

use ricochet_nes::{Nes, capture};

struct CliArgs {
    rom_path: Option<PathBuf>,
    frames: u32,
    screenshot_path: Option<PathBuf>,
    wav_path: Option<PathBuf>,
    palette_path: Option<PathBuf>,
    save_path: Option<PathBuf>,
    test_tone: bool,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = env::args().collect();
    let mut cli = CliArgs {
        rom_path: None,
        frames: 200,
        screenshot_path: None,
        wav_path: None,
        palette_path: None,
        save_path: None,
        test_tone: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rom" => {
                i += 1;
                cli.rom_path = args.get(i).map(PathBuf::from);
            }
            "--frames" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.frames = s.parse().unwrap_or(200);
                }
            }
            "--screenshot" => {
                i += 1;
                cli.screenshot_path = args.get(i).map(PathBuf::from);
            }
            "--wav" => {
                i += 1;
                cli.wav_path = args.get(i).map(PathBuf::from);
            }
            "--palette" => {
                i += 1;
                cli.palette_path = args.get(i).map(PathBuf::from);
            }
            "--save" => {
                i += 1;
                cli.save_path = args.get(i).map(PathBuf::from);
            }
            "--test-tone" => {
                cli.test_tone = true;
            }
            "--help" | "-h" => {
                eprintln!("Usage: ricochet-nes --rom <file> [OPTIONS]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --rom <file>         iNES ROM file (.nes)");
                eprintln!("  --frames <n>         Number of frames to run [default: 200]");
                eprintln!("  --screenshot <file>  Save a PNG of the final frame");
                eprintln!("  --wav <file>         Save captured audio as WAV");
                eprintln!("  --palette <file>     Load a 0x600-byte .pal color table");
                eprintln!("  --save <file>        Battery RAM file (loaded and saved back)");
                eprintln!("  --test-tone          Enable the APU 440 Hz test tone");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn run(cli: &CliArgs) -> Result<(), String> {
    let Some(ref rom_path) = cli.rom_path else {
        return Err("no ROM given (use --rom <file>)".to_string());
    };

    let rom_data =
        fs::read(rom_path).map_err(|e| format!("cannot read {}: {e}", rom_path.display()))?;
    let mut nes = Nes::new(&rom_data)?;

    if let Some(ref palette_path) = cli.palette_path {
        let palette = fs::read(palette_path)
            .map_err(|e| format!("cannot read {}: {e}", palette_path.display()))?;
        nes.load_palette(&palette)?;
    }

    if let Some(ref save_path) = cli.save_path {
        if let Ok(save_data) = fs::read(save_path) {
            nes.load_battery_ram(&save_data);
            eprintln!("Loaded battery RAM from {}", save_path.display());
        }
    }

    if cli.test_tone {
        nes.bus_mut().apu.set_test_tone(true);
    }

    let audio: Rc<RefCell<Vec<i16>>> = Rc::new(RefCell::new(Vec::new()));
    {
        let audio = Rc::clone(&audio);
        nes.set_audio_callback(move |batch| {
            audio.borrow_mut().extend_from_slice(batch);
        });
    }

    for _ in 0..cli.frames {
        nes.run_frame();
    }

    if let Some(ref path) = cli.screenshot_path {
        capture::save_screenshot(&nes, path).map_err(|e| format!("screenshot: {e}"))?;
        eprintln!("Screenshot saved to {}", path.display());
    }

    if let Some(ref path) = cli.wav_path {
        let samples = audio.borrow();
        let sample_rate = nes.bus().apu.sample_rate();
        capture::save_wav(&samples, sample_rate, path).map_err(|e| format!("wav: {e}"))?;
        eprintln!("Audio saved to {} ({} samples)", path.display(), samples.len());
    }

    if let Some(ref save_path) = cli.save_path {
        if let Some(battery) = nes.battery_ram() {
            fs::write(save_path, battery)
                .map_err(|e| format!("cannot write {}: {e}", save_path.display()))?;
            eprintln!("Battery RAM saved to {}", save_path.display());
        }
    }

    Ok(())
}

fn main() {
    let cli = parse_args();
    if let Err(message) = run(&cli) {
        eprintln!("Error: {message}");
        process::exit(1);
    }
}
