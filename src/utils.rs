// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame buffer helpers shared by the engine, the session and video I/O.

use image::RgbImage;
use ndarray::Array3;

use crate::error::{PoseError, Result};

/// Simple pluralization for log summaries.
#[must_use]
pub fn pluralize(word: &str) -> String {
    match word {
        "person" => "persons".to_string(),
        _ => {
            if word.ends_with('s') || word.ends_with("ch") || word.ends_with("sh") {
                format!("{word}es")
            } else if word.ends_with('y') && !word.ends_with("ey") && !word.ends_with("ay") {
                format!("{}ies", &word[..word.len() - 1])
            } else {
                format!("{word}s")
            }
        }
    }
}

/// "1 person", "3 persons".
#[must_use]
pub fn count_label(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {}", pluralize(word))
    }
}

/// Check that `frame` is an HWC buffer with 3 channels and return
/// (height, width).
///
/// # Errors
///
/// Returns an error for any other shape or an empty frame.
pub fn frame_dims(frame: &Array3<u8>) -> Result<(usize, usize)> {
    let shape = frame.shape();
    if shape[2] != 3 {
        return Err(PoseError::ImageError(format!(
            "Expected 3 color channels, got {}",
            shape[2]
        )));
    }
    if shape[0] == 0 || shape[1] == 0 {
        return Err(PoseError::ImageError(format!(
            "Empty frame {}x{}",
            shape[1], shape[0]
        )));
    }
    Ok((shape[0], shape[1]))
}

/// Convert an HWC u8 array to an `RgbImage`.
///
/// # Errors
///
/// Returns an error if dimensions are invalid or conversion fails.
pub fn array_to_image(arr: &Array3<u8>) -> Result<RgbImage> {
    let (height, width) = frame_dims(arr)?;
    let height = u32::try_from(height)
        .map_err(|_| PoseError::ImageError("Image height exceeds u32::MAX".to_string()))?;
    let width = u32::try_from(width)
        .map_err(|_| PoseError::ImageError("Image width exceeds u32::MAX".to_string()))?;

    let raw: Vec<u8> = arr.as_standard_layout().iter().copied().collect();
    RgbImage::from_raw(width, height, raw)
        .ok_or_else(|| PoseError::ImageError("Failed to create image from array".to_string()))
}

/// Convert an `RgbImage` back to an HWC u8 array.
///
/// # Errors
///
/// Returns an error if the buffer length does not match the dimensions.
pub fn image_to_array(img: RgbImage) -> Result<Array3<u8>> {
    let (width, height) = img.dimensions();
    Array3::from_shape_vec((height as usize, width as usize, 3), img.into_raw())
        .map_err(|e| PoseError::ImageError(e.to_string()))
}
