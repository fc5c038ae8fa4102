use crate::core::types::Channel;
use crate::{impl_op, impl_op_assign};
use approx::{AbsDiffEq, RelativeEq};
use std::array;
use std::ops::{Deref, DerefMut, Index, IndexMut};

#[derive(Copy, Clone, Debug, PartialOrd, PartialEq)]
#[repr(transparent)]
pub struct Colour<const N: usize>(pub [Channel; N]);

pub type ColourRgb = Colour<3>;

impl<const N: usize> Colour<N> {
    /// How many channels there are, for this colour.
    /// RGB is 3 channels.
    pub const CHANNEL_COUNT: usize = N;
}

impl<const N: usize> Default for Colour<N> {
    fn default() -> Self { Self::BLACK }
}

// region Constructors

impl<const N: usize> Colour<N> {
    pub const fn new(val: [Channel; N]) -> Self { Self(val) }

    pub const fn splat(val: Channel) -> Self { Self([val; N]) }
}

impl From<(Channel, Channel, Channel)> for ColourRgb {
    fn from((r, g, b): (Channel, Channel, Channel)) -> Self { Self::new([r, g, b]) }
}

impl<const N: usize> From<[Channel; N]> for Colour<N> {
    fn from(val: [Channel; N]) -> Self { Self::new(val) }
}

impl<const N: usize> From<Colour<N>> for [Channel; N] {
    fn from(val: Colour<N>) -> Self { val.0 }
}

// endregion Constructors

// region Known Colours

impl<const N: usize> Colour<N> {
    pub const BLACK: Self = Self::new([0.; N]);
    pub const WHITE: Self = Self::new([1.; N]);
}

// endregion Known Colours

// region Iterating/Indexing

impl<const N: usize> IntoIterator for Colour<N> {
    type Item = Channel;
    type IntoIter = array::IntoIter<Channel, N>;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl<const N: usize> Deref for Colour<N> {
    type Target = [Channel; N];

    fn deref(&self) -> &Self::Target { &self.0 }
}
impl<const N: usize> DerefMut for Colour<N> {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.0 }
}

impl<const N: usize> Index<usize> for Colour<N> {
    type Output = Channel;

    fn index(&self, index: usize) -> &Self::Output { &self.0[index] }
}
impl<const N: usize> IndexMut<usize> for Colour<N> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output { &mut self.0[index] }
}

// endregion Iterating/Indexing

// region Helpers

impl<const N: usize> Colour<N> {
    /// Maps each element of the colour with the given closure, and returns the new colour
    #[inline]
    pub fn map(&self, op: impl FnMut(Channel) -> Channel) -> Self { self.0.map(op).into() }

    /// Maps each element of the colour with the matching element of another, and returns the new colour.
    #[inline]
    pub fn map2(&self, other: &Self, mut op: impl FnMut(Channel, Channel) -> Channel) -> Self {
        array::from_fn(|i| op(self.0[i], other.0[i])).into()
    }

    /// Whether every channel is exactly zero; a fully opaque filter
    pub fn is_black(&self) -> bool { self.0.iter().all(|&c| c == 0.) }
}

// endregion Helpers

// region Operators

impl_op!(impl {const N: usize} std::ops::Add : fn add(a: Colour<N>, b: Colour<N>) -> Colour<N> { a.map2(&b, |x, y| x + y) });
impl_op!(impl {const N: usize} std::ops::Sub : fn sub(a: Colour<N>, b: Colour<N>) -> Colour<N> { a.map2(&b, |x, y| x - y) });
impl_op!(impl {const N: usize} std::ops::Mul : fn mul(a: Colour<N>, b: Colour<N>) -> Colour<N> { a.map2(&b, |x, y| x * y) });
impl_op!(impl {const N: usize} std::ops::Mul : fn mul(a: Colour<N>, b: Channel) -> Colour<N> { a.map(|x| x * b) });
impl_op!(impl {const N: usize} std::ops::Div : fn div(a: Colour<N>, b: Channel) -> Colour<N> { a.map(|x| x / b) });

impl_op_assign!(impl {const N: usize} std::ops::AddAssign : fn add_assign(a: Colour<N>, b: Colour<N>) { a = a + b });
impl_op_assign!(impl {const N: usize} std::ops::MulAssign : fn mul_assign(a: Colour<N>, b: Colour<N>) { a = a * b });
impl_op_assign!(impl {const N: usize} std::ops::MulAssign : fn mul_assign(a: Colour<N>, b: Channel) { a = a * b });

// endregion Operators

impl<const N: usize> AbsDiffEq for Colour<N> {
    type Epsilon = Channel;

    fn default_epsilon() -> Self::Epsilon { Channel::EPSILON }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| Channel::abs_diff_eq(a, b, epsilon))
    }
}

impl<const N: usize> RelativeEq for Colour<N> {
    fn default_max_relative() -> Self::Epsilon { Channel::EPSILON }

    fn relative_eq(&self, other: &Self, epsilon: Self::Epsilon, max_relative: Self::Epsilon) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| Channel::relative_eq(a, b, epsilon, max_relative))
    }
}
