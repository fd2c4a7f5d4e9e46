//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::{Pod, Zeroable};
use std::ops::{Add, Div, Mul, Sub};

/// Trait for types that can be elements of a tensor
///
/// This trait connects Rust's type system to sparr's runtime dtype system.
/// It's implemented for all primitive numeric types.
///
/// # Bounds
/// - `Copy + Clone + Send + Sync + 'static` - Basic trait requirements
/// - `Pod + Zeroable` - Safe memory transmutation (bytemuck)
/// - `Add + Sub + Mul + Div` - Arithmetic operations (Output = Self)
/// - `PartialOrd` - Comparison for sorting and binary search
///
/// Note: `Neg` is NOT required since unsigned types don't support it.
pub trait Element:
    Copy
    + Clone
    + Send
    + Sync
    + Pod
    + Zeroable
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + PartialOrd
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert to f64 for generic numeric operations
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type
    fn from_f64(v: f64) -> Self;

    /// Zero value
    fn zero() -> Self;

    /// One value
    fn one() -> Self;
}

macro_rules! impl_element {
    ($ty:ty, $dtype:expr, $zero:expr, $one:expr) => {
        impl Element for $ty {
            const DTYPE: DType = $dtype;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $ty
            }

            #[inline]
            fn zero() -> Self {
                $zero
            }

            #[inline]
            fn one() -> Self {
                $one
            }
        }
    };
}

impl_element!(f64, DType::F64, 0.0, 1.0);
impl_element!(f32, DType::F32, 0.0, 1.0);
impl_element!(i64, DType::I64, 0, 1);
impl_element!(i32, DType::I32, 0, 1);
impl_element!(i16, DType::I16, 0, 1);
impl_element!(i8, DType::I8, 0, 1);
impl_element!(u64, DType::U64, 0, 1);
impl_element!(u32, DType::U32, 0, 1);
impl_element!(u16, DType::U16, 0, 1);
impl_element!(u8, DType::U8, 0, 1);

// Note: bool doesn't implement Pod, so we can't implement Element for it.
// Boolean tensors would use u8 internally.

/// Signed integer types usable as index, hash, or offset words
///
/// The intersection pipeline picks 32- or 64-bit words for its hash and
/// offset arrays from overflow bounds; this trait is what the monomorphized
/// kernels are generic over. Conversions are plain integer casts, never
/// routed through f64.
pub trait IndexElement: Element + Ord {
    /// Narrow from i64 (caller guarantees the value fits)
    fn from_i64(v: i64) -> Self;

    /// Reinterpret as an array position (caller guarantees non-negative)
    fn as_index(self) -> usize;
}

impl IndexElement for i64 {
    #[inline]
    fn from_i64(v: i64) -> Self {
        v
    }

    #[inline]
    fn as_index(self) -> usize {
        self as usize
    }
}

impl IndexElement for i32 {
    #[inline]
    fn from_i64(v: i64) -> Self {
        v as i32
    }

    #[inline]
    fn as_index(self) -> usize {
        self as usize
    }
}
