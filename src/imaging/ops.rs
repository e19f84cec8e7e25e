//! Pixel operations behind the image commands. Everything here is synchronous and
//! meant to run on the blocking pool.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};

use crate::errors::AppError;

pub const NOT_AN_IMAGE: &str = "That file is not an image I can read.";

/// Step between the six levels of each web-safe channel.
const WEB_STEP: u16 = 51;
const WEB_LEVELS: usize = 6;

pub fn decode(bytes: &[u8]) -> Result<DynamicImage, AppError> {
    image::load_from_memory(bytes).map_err(|e| {
        tracing::debug!("Image decode failed: {}", e);
        AppError::InvalidInput(NOT_AN_IMAGE.to_string())
    })
}

/// Encode as JPEG. Anything other than 8-bit gray or RGB is flattened to RGB first.
pub fn encode_jpeg(image: DynamicImage) -> Result<Vec<u8>, AppError> {
    let image = match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|e| AppError::Image(format!("JPEG encoding failed: {}", e)))?;
    Ok(buffer.into_inner())
}

/// Fixed convolution filters offered by `image filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Blur,
    Contour,
    Detail,
    EdgeEnhance,
    EdgeEnhanceMore,
    Emboss,
    FindEdges,
    Sharpen,
    Smooth,
    SmoothMore,
}

struct Kernel {
    size: usize,
    weights: &'static [i32],
    scale: f32,
    offset: f32,
}

impl Kernel {
    const fn new(size: usize, weights: &'static [i32], scale: f32, offset: f32) -> Self {
        Self {
            size,
            weights,
            scale,
            offset,
        }
    }
}

#[rustfmt::skip]
const BLUR: [i32; 25] = [
    1, 1, 1, 1, 1,
    1, 0, 0, 0, 1,
    1, 0, 0, 0, 1,
    1, 0, 0, 0, 1,
    1, 1, 1, 1, 1,
];

#[rustfmt::skip]
const SMOOTH_MORE: [i32; 25] = [
    1, 1,  1, 1, 1,
    1, 5,  5, 5, 1,
    1, 5, 44, 5, 1,
    1, 5,  5, 5, 1,
    1, 1,  1, 1, 1,
];

const EDGES: [i32; 9] = [-1, -1, -1, -1, 8, -1, -1, -1, -1];

impl FilterKind {
    pub const ALL: [FilterKind; 10] = [
        FilterKind::Blur,
        FilterKind::Contour,
        FilterKind::Detail,
        FilterKind::EdgeEnhance,
        FilterKind::EdgeEnhanceMore,
        FilterKind::Emboss,
        FilterKind::FindEdges,
        FilterKind::Sharpen,
        FilterKind::Smooth,
        FilterKind::SmoothMore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Blur => "blur",
            FilterKind::Contour => "contour",
            FilterKind::Detail => "detail",
            FilterKind::EdgeEnhance => "edge_enhance",
            FilterKind::EdgeEnhanceMore => "edge_enhance_more",
            FilterKind::Emboss => "emboss",
            FilterKind::FindEdges => "find_edges",
            FilterKind::Sharpen => "sharpen",
            FilterKind::Smooth => "smooth",
            FilterKind::SmoothMore => "smooth_more",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// Button text, e.g. "Edge Enhance More".
    pub fn label(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn kernel(&self) -> Kernel {
        match self {
            FilterKind::Blur => Kernel::new(5, &BLUR, 16.0, 0.0),
            FilterKind::Contour => Kernel::new(3, &EDGES, 1.0, 255.0),
            FilterKind::Detail => Kernel::new(3, &[0, -1, 0, -1, 10, -1, 0, -1, 0], 6.0, 0.0),
            FilterKind::EdgeEnhance => {
                Kernel::new(3, &[-1, -1, -1, -1, 10, -1, -1, -1, -1], 2.0, 0.0)
            }
            FilterKind::EdgeEnhanceMore => {
                Kernel::new(3, &[-1, -1, -1, -1, 9, -1, -1, -1, -1], 1.0, 0.0)
            }
            FilterKind::Emboss => Kernel::new(3, &[-1, 0, 0, 0, 1, 0, 0, 0, 0], 1.0, 128.0),
            FilterKind::FindEdges => Kernel::new(3, &EDGES, 1.0, 0.0),
            FilterKind::Sharpen => Kernel::new(3, &[-2, -2, -2, -2, 32, -2, -2, -2, -2], 16.0, 0.0),
            FilterKind::Smooth => Kernel::new(3, &[1, 1, 1, 1, 5, 1, 1, 1, 1], 13.0, 0.0),
            FilterKind::SmoothMore => Kernel::new(5, &SMOOTH_MORE, 100.0, 0.0),
        }
    }
}

fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Convolve with the filter's kernel. Pixels closer to the edge than the kernel
/// radius are copied unchanged.
pub fn apply_filter(source: &RgbImage, kind: FilterKind) -> RgbImage {
    let kernel = kind.kernel();
    let radius = kernel.size / 2;
    let (width, height) = (source.width() as usize, source.height() as usize);
    let mut output = source.clone();
    if width <= 2 * radius || height <= 2 * radius {
        return output;
    }

    for y in radius..height - radius {
        for x in radius..width - radius {
            let mut sums = [0i32; 3];
            for (i, weight) in kernel.weights.iter().enumerate() {
                if *weight == 0 {
                    continue;
                }
                let sx = x + i % kernel.size - radius;
                let sy = y + i / kernel.size - radius;
                let pixel = source.get_pixel(sx as u32, sy as u32);
                for (sum, channel) in sums.iter_mut().zip(pixel.0) {
                    *sum += weight * i32::from(channel);
                }
            }
            let pixel = sums.map(|sum| clamp_channel(sum as f32 / kernel.scale + kernel.offset));
            output.put_pixel(x as u32, y as u32, Rgb(pixel));
        }
    }
    output
}

/// `first * (1 - alpha) + second * alpha`, clipped. `second` is resized to match.
pub fn blend(first: &RgbImage, second: &RgbImage, alpha: f32) -> RgbImage {
    let (width, height) = first.dimensions();
    let resized;
    let second = if second.dimensions() != (width, height) {
        resized = imageops::resize(second, width, height, FilterType::CatmullRom);
        &resized
    } else {
        second
    };

    RgbImage::from_fn(width, height, |x, y| {
        let a = first.get_pixel(x, y).0;
        let b = second.get_pixel(x, y).0;
        Rgb([0, 1, 2].map(|c| {
            let (a, b) = (f32::from(a[c]), f32::from(b[c]));
            clamp_channel(a + (b - a) * alpha)
        }))
    })
}

/// How often a web-safe color occurs after quantizing an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorCount {
    pub color: [u8; 3],
    pub count: u64,
}

impl ColorCount {
    pub fn hex(&self) -> String {
        let [r, g, b] = self.color;
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

fn web_level(value: u8) -> usize {
    ((u16::from(value) + WEB_STEP / 2) / WEB_STEP) as usize
}

/// Map every pixel to the nearest of the 216 web-safe colors and count them.
/// Colors come back in palette order; absent ones are skipped.
pub fn palette(image: &RgbImage) -> Vec<ColorCount> {
    let mut counts = [0u64; WEB_LEVELS * WEB_LEVELS * WEB_LEVELS];
    for pixel in image.pixels() {
        let [r, g, b] = pixel.0.map(web_level);
        counts[(r * WEB_LEVELS + g) * WEB_LEVELS + b] += 1;
    }

    counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(index, count)| {
            let level = |i: usize| (i as u16 * WEB_STEP) as u8;
            ColorCount {
                color: [
                    level(index / (WEB_LEVELS * WEB_LEVELS)),
                    level(index / WEB_LEVELS % WEB_LEVELS),
                    level(index % WEB_LEVELS),
                ],
                count: *count,
            }
        })
        .collect()
}

pub fn grayscale(image: &DynamicImage) -> GrayImage {
    imageops::grayscale(image)
}

/// Invert every channel value at or above `threshold`.
pub fn solarize(image: &DynamicImage, threshold: u8) -> RgbImage {
    let mut output = image.to_rgb8();
    for pixel in output.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            if *channel >= threshold {
                *channel = 255 - *channel;
            }
        }
    }
    output
}
