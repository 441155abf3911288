use image::{GrayImage, Luma};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{BlobError, Result};

/// Blob identifier stored in a [`LabelRaster`].
pub type Label = u32;

/// Label carried by every background pixel.
pub const BACKGROUND: Label = 0;

/// Integer pixel coordinate. `x` grows to the right, `y` grows downwards.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Inclusive pixel bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl BoundingBox {
    pub fn from_point(p: Point) -> Self {
        Self {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    /// Box with its top-left corner at `(x, y)` spanning `width` x `height` pixels.
    pub fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BlobError::InvalidInput(format!(
                "region of interest must not be empty, got {width}x{height}"
            )));
        }
        let far = |origin: i32, extent: u32| {
            i32::try_from(extent - 1)
                .ok()
                .and_then(|e| origin.checked_add(e))
                .ok_or_else(|| {
                    BlobError::InvalidInput(format!(
                        "region of interest at ({x}, {y}) of {width}x{height} exceeds the coordinate range"
                    ))
                })
        };
        Ok(Self {
            min_x: x,
            min_y: y,
            max_x: far(x, width)?,
            max_y: far(y, height)?,
        })
    }

    pub fn include(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn merge(&mut self, other: &BoundingBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x + 1) as u32
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y + 1) as u32
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Whether the box reaches any edge of a `width` x `height` raster.
    pub fn touches_border(&self, width: u32, height: u32) -> bool {
        self.min_x <= 0
            || self.min_y <= 0
            || self.max_x >= width as i32 - 1
            || self.max_y >= height as i32 - 1
    }

    /// Intersection with another box, `None` when they do not overlap.
    pub fn intersect(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let b = BoundingBox {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        };
        (b.min_x <= b.max_x && b.min_y <= b.max_y).then_some(b)
    }
}

/// Pixel adjacency rule used for labeling and tracing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Connectivity {
    /// Edge neighbours only.
    Four,
    /// Edge and corner neighbours.
    #[default]
    Eight,
}

impl Connectivity {
    /// Connectivity of the complement: holes in an 8-connected blob are
    /// 4-connected and vice versa.
    pub fn dual(self) -> Self {
        match self {
            Self::Four => Self::Eight,
            Self::Eight => Self::Four,
        }
    }

    pub fn offsets(self) -> &'static [(i32, i32)] {
        const FOUR: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
        const EIGHT: [(i32, i32); 8] = [
            (0, -1),
            (1, -1),
            (1, 0),
            (1, 1),
            (0, 1),
            (-1, 1),
            (-1, 0),
            (-1, -1),
        ];
        match self {
            Self::Four => &FOUR,
            Self::Eight => &EIGHT,
        }
    }
}

/// Fixed-size, row-major grid of pixel values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

/// Foreground (`true`) / background (`false`) raster.
pub type BinaryRaster = Raster<bool>;

/// Per-pixel blob labels, [`BACKGROUND`] for unlabeled pixels.
pub type LabelRaster = Raster<Label>;

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(BlobError::InvalidInput(format!(
            "raster must have non-zero dimensions, got {width}x{height}"
        )));
    }
    Ok(())
}

impl<T: Copy + Default> Raster<T> {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::filled(width, height, T::default())
    }
}

impl<T: Copy> Raster<T> {
    pub fn filled(width: u32, height: u32, value: T) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        })
    }

    pub fn from_vec(width: u32, height: u32, data: Vec<T>) -> Result<Self> {
        check_dimensions(width, height)?;
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(BlobError::InvalidInput(format!(
                "raster of {width}x{height} needs {expected} pixels, got {}",
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as u32) < self.width && (p.y as u32) < self.height
    }

    /// Bounds-checked read; `None` outside the raster.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<T> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(self.data[self.index(x as u32, y as u32)])
    }

    #[inline]
    pub fn at(&self, p: Point) -> Option<T> {
        self.get(p.x, p.y)
    }

    /// Writes one pixel.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the raster, like `image::ImageBuffer::put_pixel`.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: T) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} raster",
            self.width,
            self.height
        );
        let i = self.index(x, y);
        self.data[i] = value;
    }

    /// Iterates `(point, value)` in raster (row-major) order.
    pub fn enumerate(&self) -> impl Iterator<Item = (Point, T)> + '_ {
        let w = self.width as usize;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, &v)| (Point::new((i % w) as i32, (i / w) as i32), v))
    }

    pub fn map<U>(&self, f: impl Fn(T) -> U) -> Raster<U> {
        Raster {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Copies the part of the raster covered by `roi`, clipped to the raster.
    pub fn crop(&self, roi: &BoundingBox) -> Result<Raster<T>> {
        let frame = BoundingBox {
            min_x: 0,
            min_y: 0,
            max_x: self.width as i32 - 1,
            max_y: self.height as i32 - 1,
        };
        let clipped = frame.intersect(roi).ok_or_else(|| {
            BlobError::InvalidInput(format!(
                "region of interest {roi:?} lies outside the {}x{} raster",
                self.width, self.height
            ))
        })?;

        let mut data = Vec::with_capacity(clipped.width() as usize * clipped.height() as usize);
        for y in clipped.min_y..=clipped.max_y {
            let start = self.index(clipped.min_x as u32, y as u32);
            data.extend_from_slice(&self.data[start..start + clipped.width() as usize]);
        }
        Raster::from_vec(clipped.width(), clipped.height(), data)
    }
}

impl BinaryRaster {
    /// Any non-zero pixel of a (thresholded) grayscale image is foreground.
    pub fn from_gray(image: &GrayImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let data = image.pixels().map(|p| p[0] != 0).collect();
        Self::from_vec(width, height, data)
    }

    /// Builds a raster from text rows, `#` marking foreground and anything
    /// else background.
    pub fn from_ascii(rows: &[&str]) -> Result<Self> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.chars().count()) as u32;
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() as u32 != width {
                return Err(BlobError::InvalidInput(format!(
                    "row {y} has {} columns, expected {width}",
                    row.chars().count()
                )));
            }
            data.extend(row.chars().map(|c| c == '#'));
        }
        Self::from_vec(width, height, data)
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// 0/255 grayscale rendition.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let v = self.data[self.index(x, y)];
            Luma([if v { 255 } else { 0 }])
        })
    }
}

impl LabelRaster {
    pub fn max_label(&self) -> Label {
        self.data.iter().copied().max().unwrap_or(BACKGROUND)
    }

    /// Foreground mask of a single label.
    pub fn mask(&self, label: Label) -> BinaryRaster {
        self.map(|v| v == label && label != BACKGROUND)
    }

    /// Resets every pixel carrying one of `labels` to background.
    pub fn clear_labels(&mut self, labels: &[Label]) {
        let Some(&highest) = labels.iter().max() else {
            return;
        };
        let mut cleared = vec![false; highest as usize + 1];
        for &l in labels {
            cleared[l as usize] = true;
        }
        for v in &mut self.data {
            if cleared.get(*v as usize).copied().unwrap_or(false) {
                *v = BACKGROUND;
            }
        }
    }
}
