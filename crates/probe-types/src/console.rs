//! Text rendering for the print intrinsics.
//!
//! Host and off-chain console share these so a contract prints the same
//! bytes whether it runs inside the sandbox or in a native unit test.

/// Fractional digits used by `printsf` (`numeric_limits<float>::digits10`).
pub const F32_PRECISION: usize = 6;
/// Fractional digits used by `printdf` (`numeric_limits<double>::digits10`).
pub const F64_PRECISION: usize = 15;

pub fn format_f32(value: f32) -> String {
    scientific(value as f64, value.is_nan(), F32_PRECISION, |p| format!("{:.*e}", p, value))
}

pub fn format_f64(value: f64) -> String {
    scientific(value, value.is_nan(), F64_PRECISION, |p| format!("{:.*e}", p, value))
}

/// Rust 输出 `1.000000e0`，这里改写成 C 的 `1.000000e+00`
fn scientific(value: f64, nan: bool, precision: usize, render: impl Fn(usize) -> String) -> String {
    if nan {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }

    let raw = render(precision);
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs())
        }
        None => raw,
    }
}

pub fn format_hex(data: &[u8]) -> String {
    hex::encode(data)
}

pub fn i128_from_le(bytes: [u8; 16]) -> i128 {
    i128::from_le_bytes(bytes)
}

pub fn u128_from_le(bytes: [u8; 16]) -> u128 {
    u128::from_le_bytes(bytes)
}

/// `prints` 语义：读到第一个 NUL 为止
pub fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_formats() {
        assert_eq!(format_f32(1.0), "1.000000e+00");
        assert_eq!(format_f64(1.0), "1.000000000000000e+00");
        assert_eq!(format_f32(-0.015625), "-1.562500e-02");
        assert_eq!(format_f64(1.5e120), "1.500000000000000e+120");
    }

    #[test]
    fn test_float_specials() {
        assert_eq!(format_f32(f32::NAN), "nan");
        assert_eq!(format_f64(f64::INFINITY), "inf");
        assert_eq!(format_f64(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_hex_and_wide_ints() {
        assert_eq!(format_hex(&[0x00, 0xab, 0x10]), "00ab10");
        assert_eq!(format_hex(&[]), "");

        let bytes = (-2i128).to_le_bytes();
        assert_eq!(i128_from_le(bytes), -2);
        assert_eq!(u128_from_le(u128::MAX.to_le_bytes()), u128::MAX);
    }

    #[test]
    fn test_until_nul() {
        assert_eq!(until_nul(b"hello\0world"), b"hello");
        assert_eq!(until_nul(b"no nul"), b"no nul");
    }
}
