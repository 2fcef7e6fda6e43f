/// A layout axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
	/// Left to right.
	Horizontal,
	/// Top to bottom.
	Vertical,
}

impl Axis {
	/// Both axes, horizontal first.
	pub const ALL: [Axis; 2] = [Axis::Horizontal, Axis::Vertical];
}

/// A point in scroll-content coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// The origin.
	pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

	/// Creates a new point.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Returns the coordinate along `axis`.
	pub fn along(&self, axis: Axis) -> f64 {
		match axis {
			Axis::Horizontal => self.x,
			Axis::Vertical => self.y,
		}
	}

	/// Returns a copy with the coordinate along `axis` replaced.
	pub fn with(self, axis: Axis, value: f64) -> Self {
		match axis {
			Axis::Horizontal => Self { x: value, ..self },
			Axis::Vertical => Self { y: value, ..self },
		}
	}

	/// Clamps the point into the scrollable range of `content` shown through `viewport`.
	///
	/// The valid offset range on each axis is `0..=max(content - viewport, 0)`.
	pub fn clamp_scroll(self, content: Size, viewport: Size) -> Self {
		let max_x = (content.width - viewport.width).max(0.0);
		let max_y = (content.height - viewport.height).max(0.0);
		Self {
			x: self.x.clamp(0.0, max_x),
			y: self.y.clamp(0.0, max_y),
		}
	}
}

/// A two-dimensional extent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
	/// Horizontal extent.
	pub width: f64,
	/// Vertical extent.
	pub height: f64,
}

impl Size {
	/// The empty size.
	pub const ZERO: Size = Size { width: 0.0, height: 0.0 };

	/// Creates a new size.
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	/// Returns the extent along `axis`.
	pub fn along(&self, axis: Axis) -> f64 {
		match axis {
			Axis::Horizontal => self.width,
			Axis::Vertical => self.height,
		}
	}
}

/// An axis-aligned rectangle in scroll-content coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
	/// Top-left corner.
	pub origin: Point,
	/// Width and height.
	pub size: Size,
}

impl Rect {
	/// Creates a rectangle from its origin and extent.
	pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			origin: Point::new(x, y),
			size: Size::new(width, height),
		}
	}

	/// Returns the exclusive bottom edge.
	pub fn max_y(&self) -> f64 {
		self.origin.y + self.size.height
	}

	/// Returns the exclusive right edge.
	pub fn max_x(&self) -> f64 {
		self.origin.x + self.size.width
	}

	/// Returns true if `point` lies inside, using an inclusive origin and exclusive max.
	pub fn contains(&self, point: Point) -> bool {
		point.x >= self.origin.x && point.x < self.max_x() && point.y >= self.origin.y && point.y < self.max_y()
	}
}
