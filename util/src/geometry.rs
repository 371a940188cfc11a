use core::ops::{Add, AddAssign, Neg};

/// Inclusive pixel bounds, as produced by scanning a mask for its extremes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect<T> {
	pub left: T,
	pub top: T,
	pub right: T,
	pub bottom: T,
}

/// A pixel position or an offset between two images
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point<T> {
	pub x: T,
	pub y: T,
}
impl<T> Point<T> {
	#[inline]
	pub const fn new(x: T, y: T) -> Self {
		Self { x, y }
	}
}
impl<T: Add<Output = T>> Add for Point<T> {
	type Output = Point<T>;

	#[inline]
	fn add(self, rhs: Self) -> Self::Output {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}
impl<T: AddAssign> AddAssign for Point<T> {
	#[inline]
	fn add_assign(&mut self, rhs: Self) {
		self.x += rhs.x;
		self.y += rhs.y;
	}
}
impl<T: Neg<Output = T>> Neg for Point<T> {
	type Output = Point<T>;

	#[inline]
	fn neg(self) -> Self::Output {
		Point::new(-self.x, -self.y)
	}
}

#[test]
fn test_point_ops() {
	let a = Point::new(3, -4);
	let b = Point::new(-1, 2);
	assert_eq!(a + b, Point::new(2, -2));
	assert_eq!(-a, Point::new(-3, 4));

	let mut c = a;
	c += b;
	assert_eq!(c, a + b);
}
