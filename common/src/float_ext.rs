pub trait FloatExt {
    fn approximately_eq(self, other: Self) -> bool;
}

impl FloatExt for f32 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON
    }
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32_approximately_eq() {
        assert!(1.0_f32.approximately_eq(1.0));
        assert!(0.0_f32.approximately_eq(0.0));
        assert!(1024.0_f32.approximately_eq(1024.0 + 1e-4));
        assert!(!1.0_f32.approximately_eq(1.01));
    }

    #[test]
    fn f32_nan_is_never_equal() {
        assert!(!f32::NAN.approximately_eq(f32::NAN));
        assert!(!f32::NAN.approximately_eq(0.0));
        assert!(!0.0_f32.approximately_eq(f32::NAN));
    }

    #[test]
    fn f64_approximately_eq() {
        assert!(1.0_f64.approximately_eq(1.0));
        assert!(!1.0_f64.approximately_eq(1.01));
    }
}
