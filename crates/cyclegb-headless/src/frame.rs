use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result, ensure};
use cyclegb_core::ppu::{FRAME_BYTES, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Write a 160x144 RGBA framebuffer as an 8-bit RGBA PNG.
pub fn write_png(path: &Path, rgba: &[u8]) -> Result<()> {
    ensure!(
        rgba.len() == FRAME_BYTES,
        "framebuffer is {} bytes, expected {FRAME_BYTES}",
        rgba.len()
    );

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;

    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        SCREEN_WIDTH as u32,
        SCREEN_HEIGHT as u32,
    );
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().context("writing PNG header")?;
    writer
        .write_image_data(rgba)
        .context("writing PNG image data")?;
    writer.finish().context("finishing PNG")?;
    Ok(())
}
