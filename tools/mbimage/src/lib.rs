#![no_std]
//! Images for the micro:bit's 5x5 LED matrix.
//!
//! An [`Image`] is a grid of brightness levels `0..=9` of any size. The
//! display only ever shows a 5x5 window of it, so most of the work here is
//! moving pixels between images with clipping: [`Image::blit`],
//! [`Image::crop`] and the `shift_*` family.
//!
//! The built-in pictures ([`ConstImage::HEART`] and friends) are immutable
//! monochrome bitmaps; turn one into an [`Image`] to draw on it.
extern crate alloc;

pub mod consts;
pub mod error;
pub mod image;

pub use consts::ConstImage;
pub use error::ImageError;
pub use image::{Image, Rect};

/// Highest brightness level a pixel can hold.
pub const MAX_BRIGHTNESS: u8 = 9;

/// PWM duty for each brightness level.
///
/// Picked by eye rather than computed; the steps are roughly logarithmic so
/// that neighbouring levels look evenly spaced.
pub const BRIGHTNESS_SCALE: [u8; 10] = [0, 2, 5, 10, 14, 24, 43, 78, 141, 255];
