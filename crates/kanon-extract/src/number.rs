//! JSON number and string rendering for the response encoder.
//!
//! Floats use the shortest digits that round-trip, in fixed notation
//! unless the magnitude is below `1e-6` or at least `1e21`. Exponents carry
//! an explicit sign and no zero padding: `1e-7`, `1e+21`.

/// Renders an integer.
pub fn write_int(out: &mut String, value: i64) {
    out.push_str(&value.to_string());
}

/// Renders an unsigned integer.
pub fn write_uint(out: &mut String, value: u64) {
    out.push_str(&value.to_string());
}

/// Formats a float the way JSON encoders conventionally do. `bits` of 32
/// renders the shortest `f32` digits. Returns `None` for NaN and
/// infinities, which JSON cannot represent.
#[must_use]
pub fn format_float(value: f64, bits: u8) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let narrow = bits == 32;
    let abs = value.abs();
    let exponential = abs != 0.0
        && if narrow {
            let abs = abs as f32;
            !(1e-6..1e21).contains(&abs)
        } else {
            !(1e-6..1e21).contains(&abs)
        };
    let text = match (narrow, exponential) {
        (true, false) => format!("{}", value as f32),
        (false, false) => format!("{value}"),
        (true, true) => format!("{:e}", value as f32),
        (false, true) => format!("{value:e}"),
    };
    Some(if exponential { sign_exponent(text) } else { text })
}

fn sign_exponent(mut text: String) -> String {
    if let Some(pos) = text.find('e') {
        if !text[pos + 1..].starts_with('-') {
            text.insert(pos + 1, '+');
        }
    }
    text
}

/// Writes `value` as a quoted JSON string.
///
/// Escapes `"`, `\`, control characters, and the line and paragraph
/// separators U+2028 and U+2029.
pub fn write_string(out: &mut String, value: &str) {
    out.reserve(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float(value: f64) -> String {
        format_float(value, 64).unwrap()
    }

    #[test]
    fn test_fixed_notation() {
        assert_eq!(float(123.0), "123");
        assert_eq!(float(0.5), "0.5");
        assert_eq!(float(-2.25), "-2.25");
        assert_eq!(float(0.000_001), "0.000001");
        assert_eq!(float(1e20), "100000000000000000000");
        assert_eq!(float(0.0), "0");
    }

    #[test]
    fn test_exponent_notation() {
        assert_eq!(float(0.000_000_1), "1e-7");
        assert_eq!(float(1.5e-9), "1.5e-9");
        assert_eq!(float(2.5e-12), "2.5e-12");
        assert_eq!(float(1e21), "1e+21");
        assert_eq!(float(-3e25), "-3e+25");
    }

    #[test]
    fn test_single_precision_digits() {
        assert_eq!(format_float(f64::from(0.1_f32), 32).unwrap(), "0.1");
        assert_eq!(format_float(f64::from(1e-7_f32), 32).unwrap(), "1e-7");
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(format_float(f64::NAN, 64), None);
        assert_eq!(format_float(f64::INFINITY, 32), None);
    }

    #[test]
    fn test_string_escaping() {
        let mut out = String::new();
        write_string(&mut out, "a\"b\\c\nd\u{1}\u{2028}");
        assert_eq!(out, r#""a\"b\\c\nd\u0001\u2028""#);
    }

    #[test]
    fn test_integers() {
        let mut out = String::new();
        write_int(&mut out, -42);
        out.push(',');
        write_uint(&mut out, u64::MAX);
        assert_eq!(out, "-42,18446744073709551615");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn float_text_parses_back(value in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
            let text = format_float(value, 64).unwrap();
            prop_assert_eq!(text.parse::<f64>().unwrap(), value);
        }

        #[test]
        fn single_precision_text_parses_back(value in any::<f32>().prop_filter("finite", |v| v.is_finite())) {
            let text = format_float(f64::from(value), 32).unwrap();
            prop_assert_eq!(text.parse::<f32>().unwrap(), value);
        }

        #[test]
        fn escaped_strings_decode_to_the_original(value in ".*") {
            let mut out = String::new();
            write_string(&mut out, &value);
            let decoded: String = serde_json::from_str(&out).unwrap();
            prop_assert_eq!(decoded, value);
        }
    }
}
