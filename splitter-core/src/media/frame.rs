//! Decoded frames and image input normalization.
//!
//! Everything that compares pictures works on one canonical representation,
//! an 8-bit packed RGB raster (`image::RgbImage`). Frames coming out of the
//! decoder are already in that form; [`ImageInput`] covers the other ways a
//! caller can hand over a picture.

use std::path::PathBuf;

use image::{DynamicImage, RgbImage};

use crate::error::{CoreError, CoreResult};

/// A decoded video frame with its 0-based presentation index.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    /// Wraps a packed RGB24 buffer as produced by ffmpeg's `rawvideo` output.
    pub fn from_rgb24(index: u64, width: u32, height: u32, data: Vec<u8>) -> CoreResult<Self> {
        let expected = width as usize * height as usize * 3;
        let actual = data.len();
        let image = RgbImage::from_raw(width, height, data).ok_or_else(|| {
            CoreError::Validation(format!(
                "frame {index}: buffer of {actual} bytes does not hold a {width}x{height} RGB24 image (expected {expected})"
            ))
        })?;
        Ok(Self { index, image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Raw packed RGB24 bytes, row-major.
    pub fn as_rgb24(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

/// Byte order of a packed 3-channel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    /// Blue-green-red, the layout OpenCV-style decoders hand out
    Bgr,
}

/// Any picture that can be compared: a file, a raw decoded buffer or an
/// already decoded image.
#[derive(Debug, Clone)]
pub enum ImageInput {
    FromPath(PathBuf),
    FromDecodedBuffer {
        width: u32,
        height: u32,
        data: Vec<u8>,
        order: ChannelOrder,
    },
    FromImageHandle(DynamicImage),
}

impl ImageInput {
    /// Normalizes the input to an RGB raster.
    pub fn to_rgb(self) -> CoreResult<RgbImage> {
        match self {
            ImageInput::FromPath(path) => {
                if !path.is_file() {
                    return Err(CoreError::NotFound(format!(
                        "image file does not exist: {}",
                        path.display()
                    )));
                }
                Ok(image::open(&path)?.to_rgb8())
            }
            ImageInput::FromDecodedBuffer {
                width,
                height,
                mut data,
                order,
            } => {
                if order == ChannelOrder::Bgr {
                    for pixel in data.chunks_exact_mut(3) {
                        pixel.swap(0, 2);
                    }
                }
                let len = data.len();
                RgbImage::from_raw(width, height, data).ok_or_else(|| {
                    CoreError::Validation(format!(
                        "buffer of {len} bytes does not hold a {width}x{height} 3-channel image"
                    ))
                })
            }
            ImageInput::FromImageHandle(image) => Ok(image.to_rgb8()),
        }
    }
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        ImageInput::FromPath(path)
    }
}

impl From<DynamicImage> for ImageInput {
    fn from(image: DynamicImage) -> Self {
        ImageInput::FromImageHandle(image)
    }
}

impl From<Frame> for ImageInput {
    fn from(frame: Frame) -> Self {
        ImageInput::FromImageHandle(DynamicImage::ImageRgb8(frame.into_image()))
    }
}
