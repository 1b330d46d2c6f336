use image::RgbImage;
use ndarray::Array4;

use super::detector::DetectError;

/// Decodes an uploaded frame, guessing the format from its content, and forces
/// it to 3-channel RGB.
pub fn decode_frame(bytes: &[u8]) -> Result<RgbImage, DetectError> {
    let image = image::load_from_memory(bytes)?;
    Ok(image.to_rgb8())
}

/// Builds a `[1, 3, H, W]` tensor with values scaled to `[0, 1]`.
pub fn to_input_tensor(frame: &RgbImage) -> Result<Array4<f32>, DetectError> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectError::EmptyFrame);
    }

    let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
    for (x, y, pixel) in frame.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        tensor[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
        tensor[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
        tensor[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
    }

    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn tensor_is_channel_first_and_scaled() {
        let mut frame = RgbImage::new(3, 2);
        frame.put_pixel(0, 0, Rgb([255, 0, 0]));
        frame.put_pixel(2, 1, Rgb([0, 51, 255]));

        let tensor = to_input_tensor(&frame).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 2, 3]);
        assert_eq!(tensor[[0, 0, 0, 0]], 1.0);
        assert_eq!(tensor[[0, 1, 0, 0]], 0.0);
        assert_eq!(tensor[[0, 1, 1, 2]], 0.2);
        assert_eq!(tensor[[0, 2, 1, 2]], 1.0);
        assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn empty_frame_is_rejected() {
        let frame = RgbImage::new(0, 0);
        assert!(matches!(
            to_input_tensor(&frame),
            Err(DetectError::EmptyFrame)
        ));
    }

    #[test]
    fn decodes_png_to_rgb() {
        let mut source = RgbImage::new(4, 3);
        source.put_pixel(1, 1, Rgb([10, 20, 30]));
        let bytes = encode(DynamicImage::ImageRgb8(source), ImageFormat::Png);

        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.dimensions(), (4, 3));
        assert_eq!(frame.get_pixel(1, 1), &Rgb([10, 20, 30]));
    }

    #[test]
    fn grayscale_is_expanded_to_three_channels() {
        let source = GrayImage::from_pixel(2, 2, Luma([128]));
        let bytes = encode(DynamicImage::ImageLuma8(source), ImageFormat::Png);

        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.get_pixel(0, 0), &Rgb([128, 128, 128]));
    }

    #[test]
    fn alpha_channel_is_dropped() {
        let source = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 50, 0]));
        let bytes = encode(DynamicImage::ImageRgba8(source), ImageFormat::Png);

        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.get_pixel(1, 1), &Rgb([200, 100, 50]));
    }

    #[test]
    fn empty_bytes_fail_to_decode() {
        assert!(matches!(decode_frame(&[]), Err(DetectError::Decode(_))));
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = decode_frame(b"definitely not an image").unwrap_err();
        assert!(matches!(err, DetectError::Decode(_)));
    }
}
