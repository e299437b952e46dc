//! Headless capture: PNG screenshots and WAV audio dumps.

use std::error::Error;
use std::fs;
use std::io::BufWriter;
use std::path::Path;

use crate::Nes;
use crate::ppu::{FB_HEIGHT, FB_WIDTH};

/// Save the current framebuffer as a PNG file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_screenshot(nes: &Nes, path: &Path) -> Result<(), Box<dyn Error>> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, FB_WIDTH as u32, FB_HEIGHT as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    // The framebuffer is already RGBA bytes.
    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(nes.framebuffer())?;
    Ok(())
}

/// Save collected audio samples as a 16-bit stereo WAV file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_wav(samples: &[i16], sample_rate: u32, path: &Path) -> Result<(), Box<dyn Error>> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
