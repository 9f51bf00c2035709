//! Rectangles, zones and minimum-size computation.
//!
//! Every node position is the node's center expressed in its parent's local
//! frame. A container's local frame has its origin at the container center,
//! so the container box spans `[-w/2, w/2] x [-h/2, h/2]`.

use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

use crate::config::{HeaderConfig, LayoutConfig};
use crate::measure::LabelMeasurer;

/// Sizes closer than this are treated as equal by the cascade.
pub const SIZE_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Component-wise maximum.
    pub fn max(self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }

    pub fn approx_eq(self, other: Size) -> bool {
        (self.width - other.width).abs() <= SIZE_EPSILON
            && (self.height - other.height).abs() <= SIZE_EPSILON
    }

    /// True when either dimension exceeds `other` by more than the epsilon.
    pub fn exceeds(self, other: Size) -> bool {
        self.width > other.width + SIZE_EPSILON || self.height > other.height + SIZE_EPSILON
    }

    pub fn fits_within(self, other: Size) -> bool {
        self.width <= other.width + SIZE_EPSILON && self.height <= other.height + SIZE_EPSILON
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn approx_eq(self, other: Point) -> bool {
        (self.x - other.x).abs() <= SIZE_EPSILON && (self.y - other.y).abs() <= SIZE_EPSILON
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_center(center: Point, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Bounding box of a set of rectangles, `None` when empty.
    pub fn bounding<I: IntoIterator<Item = Rect>>(rects: I) -> Option<Rect> {
        rects.into_iter().reduce(|acc, rect| acc.union(&rect))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    pub fn is_valid(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .all(|value| value.is_finite() && *value >= 0.0)
    }
}

/// The three sub-rectangles of a container, in the container's local frame.
///
/// The header spans the full width at the top edge. The margin zone is
/// everything below the header; the inner-content zone is the margin zone
/// shrunk by the margins and is where children are placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Zones {
    pub header: Rect,
    pub margin: Rect,
    pub inner: Rect,
}

pub fn apply_zones(size: Size, margins: &Margins, header_height: f32) -> Zones {
    let left = -size.width / 2.0;
    let top = -size.height / 2.0;
    let header = Rect::new(left, top, size.width, header_height);
    let margin = Rect::new(
        left,
        top + header_height,
        size.width,
        (size.height - header_height).max(0.0),
    );
    let inner = Rect::new(
        left + margins.left,
        top + header_height + margins.top,
        (size.width - margins.horizontal()).max(0.0),
        (size.height - header_height - margins.vertical()).max(0.0),
    );
    Zones {
        header,
        margin,
        inner,
    }
}

/// Outer size of a container whose inner content needs `content`.
pub fn outer_size(content: Size, margins: &Margins, header_height: f32) -> Size {
    Size::new(
        content.width + margins.horizontal(),
        content.height + margins.vertical() + header_height,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderMetrics {
    pub height: f32,
    pub min_width: f32,
}

/// Header box needed to show `label` plus the status indicator and the
/// expand/collapse button without clipping.
pub fn header_metrics(
    label: &str,
    measurer: &dyn LabelMeasurer,
    config: &HeaderConfig,
) -> HeaderMetrics {
    let text = measurer.measure_label(label);
    let height = text.height.max(config.min_height);
    let chrome = config.padding * 2.0
        + config.text_gap
        + config.indicator_size
        + config.indicator_gap
        + config.button_size;
    let mut min_width = (text.width + chrome).max(config.min_width);
    if let Some(max_width) = config.max_width {
        min_width = min_width.min(max_width);
    }
    HeaderMetrics {
        height,
        min_width: min_width.ceil(),
    }
}

/// Everything `compute_minimum_size` needs to know about a container.
#[derive(Debug, Clone, Copy)]
pub struct MinimumSizeRequest<'a> {
    pub label: &'a str,
    pub margins: Margins,
    /// Explicit header height override; measured from the label otherwise.
    pub header_height: Option<f32>,
    /// User supplied floor, applied when larger than the label-derived size.
    pub floor: Option<Size>,
    pub use_root_ratio: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimumSize {
    pub size: Size,
    pub header_height: f32,
}

pub fn compute_minimum_size(
    request: &MinimumSizeRequest<'_>,
    measurer: &dyn LabelMeasurer,
    config: &LayoutConfig,
) -> MinimumSize {
    let header = header_metrics(request.label, measurer, &config.header);
    let header_height = request.header_height.unwrap_or(header.height);
    let mut size = Size::new(
        header.min_width.max(request.margins.horizontal()),
        header_height,
    );
    if let Some(floor) = request.floor {
        size = size.max(floor);
    }
    if request.use_root_ratio && config.root_ratio > 0.0 {
        size.height = size.height.max(size.width / config.root_ratio);
    }
    MinimumSize {
        size,
        header_height,
    }
}
