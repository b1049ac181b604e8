// crates/clipline-media/src/helpers/frame.rs

use ffmpeg_the_third as ffmpeg;
use ffmpeg::util::frame::video::Video;

use clipline_core::Bitmap;

/// Copy the visible RGB24 pixels out of a scaled frame, dropping the stride
/// padding FFmpeg adds at the end of each row.
pub fn destripe_rgb(frame: &Video, width: u32, height: u32) -> Bitmap {
    let stride    = frame.stride(0);
    let raw       = frame.data(0);
    let row_bytes = width as usize * 3;
    let data: Vec<u8> = (0..height as usize)
        .flat_map(|row| &raw[row * stride..row * stride + row_bytes])
        .copied()
        .collect();
    Bitmap { width, height, data }
}
