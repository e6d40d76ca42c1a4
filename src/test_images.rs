//! Tiny in-memory images for unit tests.

use image::codecs::gif::GifEncoder;
use image::{Delay, Frame, Rgba, RgbaImage};

/// A small GIF with the given number of frames, each a different color.
pub fn animated_gif(frames: u32) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buffer);
        for index in 0..frames {
            let shade = (index * 60 % 256) as u8;
            let image = RgbaImage::from_pixel(4, 4, Rgba([shade, 0, 0, 255]));
            let frame = Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(100, 1));
            encoder.encode_frame(frame).unwrap();
        }
    }
    buffer
}

pub fn static_gif() -> Vec<u8> {
    animated_gif(1)
}
