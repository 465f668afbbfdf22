//! Image preprocessing for the emotion model.
//!
//! The model has a fixed input contract: single-channel grayscale, 48x48,
//! pixel intensities scaled to [0, 1], NCHW with batch size 1.

use image::imageops::FilterType;
use ndarray::Array4;
use std::path::Path;
use thiserror::Error;

/// Side length of the model's square input grid.
pub const INPUT_SIZE: usize = 48;
const PIXEL_SCALE: f32 = 255.0;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("failed to read image file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Load an image file from disk and build the model input tensor.
pub fn tensor_from_path(path: &Path) -> Result<Array4<f32>, PreprocessError> {
    let bytes = std::fs::read(path)?;
    tensor_from_bytes(&bytes)
}

/// Decode image bytes into a normalized `(1, 1, 48, 48)` batch tensor.
///
/// Any decodable format is accepted; the image is converted to grayscale,
/// resized to exactly 48x48, and scaled by 1/255.
pub fn tensor_from_bytes(bytes: &[u8]) -> Result<Array4<f32>, PreprocessError> {
    let img = image::load_from_memory(bytes)?;
    let gray = img
        .resize_exact(INPUT_SIZE as u32, INPUT_SIZE as u32, FilterType::Lanczos3)
        .to_luma8();

    let mut tensor = Array4::<f32>::zeros((1, 1, INPUT_SIZE, INPUT_SIZE));
    for y in 0..INPUT_SIZE {
        for x in 0..INPUT_SIZE {
            let pixel = gray.get_pixel(x as u32, y as u32).0[0] as f32;
            tensor[[0, 0, y, x]] = pixel / PIXEL_SCALE;
        }
    }

    Ok(tensor)
}
