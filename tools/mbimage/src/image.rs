use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::ops::{Add, Div, Mul, Sub};
use core::str::FromStr;

use log::trace;

use crate::{ImageError, BRIGHTNESS_SCALE, MAX_BRIGHTNESS};

/// A source rectangle. Any part of it may lie outside the image it refers to;
/// those pixels read as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

/// A greyscale image, one brightness level (`0..=9`) per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

fn dim(v: usize) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

fn check_brightness(value: i32) -> Result<u8, ImageError> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_BRIGHTNESS)
        .ok_or(ImageError::BrightnessOutOfBounds(value))
}

impl Image {
    /// A blank `width` x `height` image.
    ///
    /// # Panics
    ///
    /// If the pixels cannot be allocated, `width * height` overflowing
    /// included. Use [`Image::try_new`] for sizes that come from outside.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width.saturating_mul(height)],
        }
    }

    /// A blank image, or [`ImageError::TooLarge`] when the pixels cannot be
    /// allocated.
    pub fn try_new(width: usize, height: usize) -> Result<Self, ImageError> {
        let too_large = ImageError::TooLarge { width, height };
        let len = width.checked_mul(height).ok_or(too_large.clone())?;
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len).map_err(|_| too_large)?;
        pixels.resize(len, 0);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build an image from row-major brightness values.
    pub fn from_buffer(width: usize, height: usize, data: &[u8]) -> Result<Self, ImageError> {
        let expected = width
            .checked_mul(height)
            .ok_or(ImageError::TooLarge { width, height })?;
        if data.len() != expected {
            return Err(ImageError::BadSize {
                expected,
                actual: data.len(),
            });
        }
        if let Some(&bad) = data.iter().find(|v| **v > MAX_BRIGHTNESS) {
            return Err(ImageError::BrightnessOutOfBounds(i32::from(bad)));
        }
        Ok(Self {
            width,
            height,
            pixels: data.to_vec(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn index(&self, x: i32, y: i32) -> Result<usize, ImageError> {
        if x < 0 || y < 0 {
            return Err(ImageError::NegativeIndex);
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return Err(ImageError::IndexTooLarge);
        }
        Ok(y * self.width + x)
    }

    fn pixel_or_blank(&self, x: i32, y: i32) -> u8 {
        self.index(x, y).map(|i| self.pixels[i]).unwrap_or(0)
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Result<u8, ImageError> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, value: i32) -> Result<(), ImageError> {
        let i = self.index(x, y)?;
        self.pixels[i] = check_brightness(value)?;
        Ok(())
    }

    pub fn fill(&mut self, value: i32) -> Result<(), ImageError> {
        let value = check_brightness(value)?;
        self.pixels.fill(value);
        Ok(())
    }

    /// Copy `region` of `src` into this image with its top-left corner at
    /// `dest`.
    ///
    /// Every destination pixel covered by the region is written, even where
    /// the region falls outside `src` (those become 0). Destination pixels
    /// outside this image are dropped.
    pub fn blit(&mut self, src: &Image, region: Rect, dest: (i32, i32)) {
        let (xdest, ydest) = dest;
        let x0 = xdest.max(0);
        let y0 = ydest.max(0);
        let x1 = xdest.saturating_add(region.w.max(0)).min(dim(self.width));
        let y1 = ydest.saturating_add(region.h.max(0)).min(dim(self.height));
        trace!("blit {:?} -> ({}..{}, {}..{})", region, x0, x1, y0, y1);

        for dy in y0..y1 {
            let sy = region.y.saturating_add(dy - ydest);
            for dx in x0..x1 {
                let sx = region.x.saturating_add(dx - xdest);
                self.pixels[dy as usize * self.width + dx as usize] = src.pixel_or_blank(sx, sy);
            }
        }
    }

    /// [`Image::blit`] with this image as its own source. The source is read
    /// as it was before any pixel is written, so overlapping moves are safe.
    pub fn blit_within(&mut self, region: Rect, dest: (i32, i32)) {
        let snapshot = self.clone();
        self.blit(&snapshot, region, dest);
    }

    /// A new `region.w` x `region.h` image holding that part of this one.
    /// The region may be far larger than this image, so the allocation can
    /// fail with [`ImageError::TooLarge`].
    pub fn crop(&self, region: Rect) -> Result<Image, ImageError> {
        let mut out = Image::try_new(region.w.max(0) as usize, region.h.max(0) as usize)?;
        out.blit(self, region, (0, 0));
        Ok(out)
    }

    // same size as self, so no allocation check
    fn shifted(&self, dx: i32, dy: i32) -> Image {
        let mut out = Image {
            width: self.width,
            height: self.height,
            pixels: vec![0; self.pixels.len()],
        };
        out.blit(self, Rect::new(dx, dy, dim(self.width), dim(self.height)), (0, 0));
        out
    }

    pub fn shift_left(&self, n: i32) -> Image {
        self.shifted(n, 0)
    }

    pub fn shift_right(&self, n: i32) -> Image {
        self.shift_left(n.saturating_neg())
    }

    pub fn shift_up(&self, n: i32) -> Image {
        self.shifted(0, n)
    }

    pub fn shift_down(&self, n: i32) -> Image {
        self.shift_up(n.saturating_neg())
    }

    pub fn invert(&self) -> Image {
        self.map(|v| MAX_BRIGHTNESS - v)
    }

    fn map(&self, f: impl Fn(u8) -> u8) -> Image {
        Image {
            width: self.width,
            height: self.height,
            pixels: self.pixels.iter().map(|v| f(*v)).collect(),
        }
    }

    /// Multiply every pixel by `factor`, rounding half up and saturating at
    /// [`MAX_BRIGHTNESS`].
    pub fn scaled(&self, factor: f32) -> Result<Image, ImageError> {
        if factor.is_nan() || factor < 0.0 {
            return Err(ImageError::NegativeMultiplier);
        }
        Ok(self.map(|v| {
            let scaled = f32::from(v) * factor + 0.5;
            if scaled >= f32::from(MAX_BRIGHTNESS) {
                MAX_BRIGHTNESS
            } else {
                scaled as u8
            }
        }))
    }

    pub fn divided(&self, divisor: f32) -> Result<Image, ImageError> {
        if divisor == 0.0 {
            return Err(ImageError::ZeroDivision);
        }
        self.scaled(1.0 / divisor)
    }

    fn zip_with(&self, rhs: &Image, f: impl Fn(u8, u8) -> u8) -> Result<Image, ImageError> {
        if self.width != rhs.width || self.height != rhs.height {
            return Err(ImageError::SizeMismatch);
        }
        Ok(Image {
            width: self.width,
            height: self.height,
            pixels: self
                .pixels
                .iter()
                .zip(&rhs.pixels)
                .map(|(l, r)| f(*l, *r))
                .collect(),
        })
    }

    pub fn checked_add(&self, rhs: &Image) -> Result<Image, ImageError> {
        self.zip_with(rhs, |l, r| (l + r).min(MAX_BRIGHTNESS))
    }

    pub fn checked_sub(&self, rhs: &Image) -> Result<Image, ImageError> {
        self.zip_with(rhs, |l, r| l.saturating_sub(r))
    }

    /// Row-major PWM duty for every pixel, see [`BRIGHTNESS_SCALE`].
    pub fn pwm_levels(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .map(|v| BRIGHTNESS_SCALE[usize::from(*v)])
            .collect()
    }

    /// The constructor form, e.g. `Image('09090:99999:99999:09990:00900:')`.
    ///
    /// Every row ends in `:`, so a `0 x h` image keeps its height
    /// (`Image(':::')`). A `w x 0` image has no rows at all and comes out as
    /// `Image('')`, which reads back as `0 x 0`.
    pub fn repr(&self) -> String {
        let mut out = String::from("Image('");
        for y in 0..self.height {
            let row = &self.pixels[y * self.width..(y + 1) * self.width];
            out.extend(row.iter().map(|v| char::from(b'0' + v)));
            out.push(':');
        }
        out.push_str("')");
        out
    }
}

impl FromStr for Image {
    type Err = ImageError;

    /// Rows are separated by `:` or newlines, `,` is ignored and a space is
    /// an unlit pixel. Short rows are padded with zeros.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rows: Vec<Vec<u8>> = Vec::new();
        let mut current: Vec<u8> = Vec::new();

        for c in s.chars() {
            match c {
                '\n' | ':' => rows.push(core::mem::take(&mut current)),
                ',' => {}
                ' ' => current.push(0),
                '0'..='9' => current.push(c as u8 - b'0'),
                _ => return Err(ImageError::UnexpectedChar(c)),
            }
        }
        if !current.is_empty() {
            rows.push(current);
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut image = Image::new(width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            image.pixels[y * width..y * width + row.len()].copy_from_slice(row);
        }
        Ok(image)
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            f.write_str("+")?;
            for _ in 0..self.width {
                f.write_str("-")?;
            }
            f.write_str("+\n")
        };

        border(f)?;
        for y in 0..self.height {
            f.write_str("|")?;
            for x in 0..self.width {
                match self.pixels[y * self.width + x] {
                    0 => f.write_str(" ")?,
                    v => write!(f, "{}", v)?,
                }
            }
            f.write_str("|\n")?;
        }
        border(f)
    }
}

impl Add for &Image {
    type Output = Result<Image, ImageError>;

    fn add(self, rhs: &Image) -> Self::Output {
        self.checked_add(rhs)
    }
}

impl Sub for &Image {
    type Output = Result<Image, ImageError>;

    fn sub(self, rhs: &Image) -> Self::Output {
        self.checked_sub(rhs)
    }
}

impl Mul<f32> for &Image {
    type Output = Result<Image, ImageError>;

    fn mul(self, rhs: f32) -> Self::Output {
        self.scaled(rhs)
    }
}

impl Div<f32> for &Image {
    type Output = Result<Image, ImageError>;

    fn div(self, rhs: f32) -> Self::Output {
        self.divided(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn img(s: &str) -> Image {
        s.parse().unwrap()
    }

    #[test]
    fn parse_pads_short_rows() {
        let i = img("9:99:999");
        assert_eq!((i.width(), i.height()), (3, 3));
        assert_eq!(i.pixels(), &[9, 0, 0, 9, 9, 0, 9, 9, 9]);
    }

    #[test]
    fn parse_accepts_newlines_commas_and_spaces() {
        let i = img("1,2,3\n4 5\n");
        assert_eq!((i.width(), i.height()), (3, 2));
        assert_eq!(i.pixels(), &[1, 2, 3, 4, 0, 5]);
    }

    #[test]
    fn trailing_separator_adds_no_row() {
        assert_eq!(img("12:34:").height(), 2);
        assert_eq!(img("12:34").height(), 2);
        assert_eq!(img("12::34").height(), 3);
    }

    #[test]
    fn parse_rejects_letters() {
        assert_eq!(
            "12:x4".parse::<Image>(),
            Err(ImageError::UnexpectedChar('x'))
        );
    }

    #[test]
    fn repr_parses_back() {
        let i = img("09090:99999:99999:09990:00900");
        assert_eq!(i.repr(), "Image('09090:99999:99999:09990:00900:')");
        let inner = i.repr();
        let inner = &inner["Image('".len()..inner.len() - 2];
        assert_eq!(img(inner), i);
    }

    #[test]
    fn display_draws_a_box() {
        let i = img("90:05");
        assert_eq!(i.to_string(), "+--+\n|9 |\n| 5|\n+--+\n");
    }

    #[test]
    fn pixel_bounds() {
        let mut i = Image::new(2, 3);
        assert_eq!(i.get_pixel(-1, 0), Err(ImageError::NegativeIndex));
        assert_eq!(i.get_pixel(2, 0), Err(ImageError::IndexTooLarge));
        assert_eq!(i.set_pixel(1, 3, 4), Err(ImageError::IndexTooLarge));
        assert_eq!(i.set_pixel(1, 2, 10), Err(ImageError::BrightnessOutOfBounds(10)));
        assert_eq!(i.set_pixel(1, 2, -1), Err(ImageError::BrightnessOutOfBounds(-1)));
        i.set_pixel(1, 2, 7).unwrap();
        assert_eq!(i.get_pixel(1, 2), Ok(7));
    }

    #[test]
    fn from_buffer_checks_size_and_levels() {
        assert_eq!(
            Image::from_buffer(2, 2, &[1, 2, 3]),
            Err(ImageError::BadSize { expected: 4, actual: 3 })
        );
        assert_eq!(
            Image::from_buffer(1, 1, &[12]),
            Err(ImageError::BrightnessOutOfBounds(12))
        );
        assert_eq!(Image::from_buffer(2, 1, &[3, 4]).unwrap(), img("34"));
    }

    #[test]
    fn arithmetic_saturates() {
        let a = img("5900");
        let b = img("5153");
        assert_eq!((&a + &b).unwrap(), img("9953"));
        assert_eq!((&a - &b).unwrap(), img("0800"));
        assert_eq!(&a + &img("12"), Err(ImageError::SizeMismatch));
    }

    #[test]
    fn scaling_rounds_and_clamps() {
        let a = img("1359");
        assert_eq!((&a * 0.5).unwrap(), img("1235"));
        assert_eq!((&a * 2.0).unwrap(), img("2699"));
        assert_eq!((&a / 2.0).unwrap(), img("1235"));
        assert_eq!(&a * -1.0, Err(ImageError::NegativeMultiplier));
        assert_eq!(&a / 0.0, Err(ImageError::ZeroDivision));
    }

    #[test]
    fn invert_and_pwm() {
        let a = img("09");
        assert_eq!(a.invert(), img("90"));
        assert_eq!(a.pwm_levels(), vec![0, 255]);
    }

    #[test]
    fn zero_sized_images() {
        let empty = Image::new(0, 3);
        assert_eq!(empty.repr(), "Image(':::')");
        assert_eq!(img(":::"), empty);
        assert_eq!(empty.shift_left(1), empty);
        assert_eq!(Image::new(3, 0).repr(), "Image('')");
        assert_eq!(img("").height(), 0);
    }

    #[test]
    fn oversized_images_are_errors() {
        assert_eq!(
            Image::from_buffer(usize::MAX, 2, &[]),
            Err(ImageError::TooLarge { width: usize::MAX, height: 2 })
        );
        assert!(matches!(
            Image::try_new(usize::MAX, usize::MAX),
            Err(ImageError::TooLarge { .. })
        ));
        let small = img("12:34");
        assert!(matches!(
            small.crop(Rect::new(0, 0, i32::MAX, i32::MAX)),
            Err(ImageError::TooLarge { .. })
        ));
        assert_eq!(small.crop(Rect::new(1, 0, 1, 2)), Ok(img("2:4")));
    }
}
