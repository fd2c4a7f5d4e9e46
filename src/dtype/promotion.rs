//! Type promotion and cast-legality rules for binary operations

use super::DType;

/// Promote two dtypes to a common dtype for binary operations
///
/// Follows NumPy-like promotion rules:
/// - Floats always win over integers
/// - Larger types win over smaller types
/// - Signed wins over unsigned when mixing
pub fn promote(lhs: DType, rhs: DType) -> DType {
    use DType::*;

    if lhs == rhs {
        return lhs;
    }

    // Promotion priority (higher = wins)
    let priority = |dt: DType| -> u8 {
        match dt {
            F64 => 100,
            F32 => 90,
            I64 => 65,
            U64 => 60,
            I32 => 55,
            U32 => 50,
            I16 => 45,
            U16 => 40,
            I8 => 35,
            U8 => 30,
            Bool => 25,
        }
    };

    // Special case: mixing signed and unsigned integers
    // Promote to signed type of same or larger size
    if lhs.is_signed_int() && rhs.is_unsigned_int() {
        return match (lhs, rhs) {
            (I64, _) => I64,
            (I32, U64 | U32) => I64,
            (I32, _) => I32,
            (I16, U64 | U32 | U16) => I32,
            (I16, _) => I16,
            (I8, _) => I16,
            _ => I64,
        };
    }
    if rhs.is_signed_int() && lhs.is_unsigned_int() {
        return promote(rhs, lhs);
    }

    // General case: higher priority wins
    if priority(lhs) >= priority(rhs) {
        lhs
    } else {
        rhs
    }
}

/// Check whether values of dtype `from` may be cast into dtype `to`
///
/// This is the *legality* rule used to validate a declared output dtype before
/// running any kernels, not a losslessness guarantee: casting F64 to F32 is
/// legal but rounds. The only illegal directions are the ones that change the
/// numeric kind of the data:
/// - a floating-point result cannot be stored into an integer output
/// - nothing but Bool can be stored into a Bool output
pub fn can_cast(from: DType, to: DType) -> bool {
    if from == to {
        return true;
    }
    if to.is_bool() {
        return false;
    }
    if from.is_float() && to.is_int() {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use DType::*;

    #[test]
    fn test_same_type_promotion() {
        assert_eq!(promote(F32, F32), F32);
        assert_eq!(promote(I64, I64), I64);
    }

    #[test]
    fn test_float_promotion() {
        assert_eq!(promote(F32, F64), F64);
        assert_eq!(promote(F64, F32), F64);
    }

    #[test]
    fn test_int_float_promotion() {
        // Float always wins
        assert_eq!(promote(I64, F32), F32);
        assert_eq!(promote(I32, F64), F64);
    }

    #[test]
    fn test_signed_unsigned_promotion() {
        assert_eq!(promote(I32, U32), I64);
        assert_eq!(promote(I16, U16), I32);
        assert_eq!(promote(I8, U8), I16);
        assert_eq!(promote(U8, I8), I16);
        assert_eq!(promote(I64, U64), I64);
    }

    #[test]
    fn test_bool_promotion() {
        assert_eq!(promote(Bool, I32), I32);
        assert_eq!(promote(F32, Bool), F32);
    }

    #[test]
    fn test_can_cast_widening_and_narrowing() {
        assert!(can_cast(I32, I64));
        assert!(can_cast(I64, I32)); // legal, may truncate
        assert!(can_cast(F64, F32)); // legal, may round
        assert!(can_cast(I64, F32));
    }

    #[test]
    fn test_can_cast_illegal_directions() {
        assert!(!can_cast(F32, I32));
        assert!(!can_cast(F64, I64));
        assert!(!can_cast(I32, Bool));
        assert!(can_cast(Bool, I32));
        assert!(can_cast(Bool, Bool));
    }
}
