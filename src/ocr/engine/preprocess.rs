use image::RgbaImage;

pub(crate) const DEFAULT_THRESHOLD: u8 = 128;

/// Binarizes in place: channel average above `threshold` becomes white,
/// everything else black. Alpha is left alone.
pub fn normalize(image: &mut RgbaImage, threshold: u8) {
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let value = binarize_value(r, g, b, threshold);
        pixel[0] = value;
        pixel[1] = value;
        pixel[2] = value;
    }
}

pub fn normalized(mut image: RgbaImage, threshold: u8) -> RgbaImage {
    normalize(&mut image, threshold);
    image
}

/// Raw-buffer form. `channels` must be 3 or 4 and must divide the buffer
/// length.
pub fn normalize_buffer(data: &mut [u8], channels: usize, threshold: u8) {
    assert!(
        channels == 3 || channels == 4,
        "unsupported channel count: {}",
        channels
    );
    assert!(
        data.len() % channels == 0,
        "pixel buffer length {} is not a multiple of {}",
        data.len(),
        channels
    );
    for pixel in data.chunks_exact_mut(channels) {
        let value = binarize_value(pixel[0], pixel[1], pixel[2], threshold);
        pixel[0] = value;
        pixel[1] = value;
        pixel[2] = value;
    }
}

fn binarize_value(r: u8, g: u8, b: u8, threshold: u8) -> u8 {
    let avg = (r as f32 + g as f32 + b as f32) / 3.0;
    if avg > threshold as f32 { 255 } else { 0 }
}
