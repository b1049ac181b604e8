// crates/clipline-media/src/helpers/png.rs
//
// PNG export for thumbnail frames. Bitmap lives in clipline-core, which has no
// image codec, so the writer is attached here as an extension trait.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{ensure, Context, Result};

use clipline_core::Bitmap;

pub trait SavePng {
    /// Write the bitmap as an 8-bit RGB PNG at `path`.
    fn save_png(&self, path: &Path) -> Result<()>;
}

impl SavePng for Bitmap {
    fn save_png(&self, path: &Path) -> Result<()> {
        let row_bytes = self.width as usize * 3;
        ensure!(
            self.width > 0 && self.height > 0 && self.data.len() == row_bytes * self.height as usize,
            "bitmap {}x{} has {} bytes of RGB data",
            self.width, self.height, self.data.len(),
        );

        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let w    = &mut BufWriter::new(file);
        let mut encoder = png::Encoder::new(w, self.width, self.height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.data)?;
        writer.finish()?;
        Ok(())
    }
}
