//! In-memory, channel-major raster image model.
//!
//! Color-space conversion and file I/O are a collaborator's
//! responsibility (see `pixelpress-cli`); this module only validates
//! the shape collaborators hand in.

use crate::error::{Error, Result};

/// A raster image as W·H-byte channels, channel-major (RGB or RGBA).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    channels: Vec<Vec<u8>>,
}

impl Image {
    /// Build an image from already-split channels, validating that
    /// there are 3 or 4 of them and each has exactly `width * height`
    /// bytes.
    pub fn new(width: u32, height: u32, channels: Vec<Vec<u8>>) -> Result<Self> {
        if !(3..=4).contains(&channels.len()) {
            return Err(Error::InvalidInputShape {
                detail: format!("unsupported channel count {}: expected 3 or 4", channels.len()),
            });
        }

        let expected_len = width as usize * height as usize;
        for (i, channel) in channels.iter().enumerate() {
            if channel.len() != expected_len {
                return Err(Error::InvalidInputShape {
                    detail: format!(
                        "channel {i} has {} bytes, expected {expected_len} ({width}x{height})",
                        channel.len()
                    ),
                });
            }
        }

        Ok(Image { width, height, channels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> &[u8] {
        &self.channels[index]
    }

    pub fn channels(&self) -> &[Vec<u8>] {
        &self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_channel_count_outside_three_or_four() {
        assert!(Image::new(2, 2, vec![vec![0; 4], vec![0; 4]]).is_err());
        assert!(Image::new(2, 2, vec![vec![0; 4]; 5]).is_err());
    }

    #[test]
    fn rejects_channel_length_mismatch() {
        assert!(Image::new(2, 2, vec![vec![0; 4], vec![0; 4], vec![0; 3]]).is_err());
    }

    #[test]
    fn accepts_well_shaped_rgba_image() {
        let image = Image::new(2, 2, vec![vec![1; 4], vec![2; 4], vec![3; 4], vec![4; 4]]).unwrap();
        assert_eq!(image.channel_count(), 4);
        assert_eq!(image.channel(2), &[3, 3, 3, 3]);
    }
}
