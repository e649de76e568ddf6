//! Numeric value kinds accepted by increment and decrement.
//!
//! Integers wrap at their own bit width, the same way native fixed-width
//! arithmetic does in release builds. Floats use plain IEEE arithmetic.

use std::fmt::Debug;

/// A value type that can be incremented and decremented in place.
///
/// Implemented for every primitive integer and float. The set is closed in
/// practice: the store only needs `add`/`sub` with well-defined overflow.
pub trait Numeric: Copy + PartialEq + Debug + Send + Sync + 'static {
    /// `self + rhs`, wrapping for integers.
    fn numeric_add(self, rhs: Self) -> Self;

    /// `self - rhs`, wrapping for integers.
    fn numeric_sub(self, rhs: Self) -> Self;
}

macro_rules! impl_numeric_integer {
    ($($t:ty),* $(,)?) => {
        $(
            impl Numeric for $t {
                #[inline]
                fn numeric_add(self, rhs: Self) -> Self {
                    <$t>::wrapping_add(self, rhs)
                }

                #[inline]
                fn numeric_sub(self, rhs: Self) -> Self {
                    <$t>::wrapping_sub(self, rhs)
                }
            }
        )*
    };
}

macro_rules! impl_numeric_float {
    ($($t:ty),* $(,)?) => {
        $(
            impl Numeric for $t {
                #[inline]
                fn numeric_add(self, rhs: Self) -> Self {
                    self + rhs
                }

                #[inline]
                fn numeric_sub(self, rhs: Self) -> Self {
                    self - rhs
                }
            }
        )*
    };
}

impl_numeric_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
impl_numeric_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_signed_wraparound() {
        assert_eq!(127i8.numeric_add(1), -128);
        assert_eq!((-128i8).numeric_sub(1), 127);
        assert_eq!(i64::MAX.numeric_add(1), i64::MIN);
    }

    #[test]
    fn test_unsigned_wraparound() {
        assert_eq!(255u8.numeric_add(1), 0);
        assert_eq!(0u8.numeric_sub(1), 255);
        assert_eq!(0u64.numeric_sub(2), u64::MAX - 1);
        assert_eq!(usize::MAX.numeric_add(1), 0);
    }

    #[test]
    fn test_float_arithmetic() {
        assert_eq!(1.5f64.numeric_add(2.25), 3.75);
        assert_eq!(1.0f32.numeric_sub(0.5), 0.5);
        assert_eq!(f64::MAX.numeric_add(f64::MAX), f64::INFINITY);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Adding then subtracting the same delta restores the original
        /// integer, overflow or not.
        #[test]
        fn prop_integer_add_sub_inverse(start in any::<i16>(), delta in any::<i16>()) {
            prop_assert_eq!(start.numeric_add(delta).numeric_sub(delta), start);
        }

        #[test]
        fn prop_u32_matches_modular_arithmetic(start in any::<u32>(), delta in any::<u32>()) {
            let expected = ((start as u64 + delta as u64) % (1u64 << 32)) as u32;
            prop_assert_eq!(start.numeric_add(delta), expected);
        }
    }
}
