//! Binary wire format of `NUMERIC`/`DECIMAL`.
//!
//! The payload is a header of four big-endian 16-bit fields (`ndigits`, `weight`, `sign`,
//! `dscale`) followed by `ndigits` base-10000 digit groups. `weight` is the power of 10000 of
//! the first group; `dscale` is the number of decimal digits after the point to display.
//! Decoding keeps `dscale`, so a `DECIMAL(10,2)` value of 25 reads back as `"25.00"`.

use std::error::Error;

use tokio_postgres::types::{FromSql, Type};
use tokio_util::bytes::{BufMut, BytesMut};

const SIGN_POS: u16 = 0x0000;
const SIGN_NEG: u16 = 0x4000;
const SIGN_NAN: u16 = 0xC000;
const SIGN_PINF: u16 = 0xD000;
const SIGN_NINF: u16 = 0xF000;

const NBASE: u16 = 10_000;

type BoxError = Box<dyn Error + Sync + Send>;

/// Text of a `NUMERIC` column exactly as the server would print it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericText(pub String);

impl<'a> FromSql<'a> for NumericText {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        decode(raw).map(NumericText)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

/// Decode a binary `NUMERIC` payload into its decimal text.
///
/// # Errors
/// Returns an error if the payload is truncated or a digit group is out of range.
pub fn decode(raw: &[u8]) -> Result<String, BoxError> {
    if raw.len() < 8 {
        return Err("invalid NUMERIC payload: header too short".into());
    }
    let ndigits = usize::from(u16::from_be_bytes([raw[0], raw[1]]));
    let weight = i16::from_be_bytes([raw[2], raw[3]]);
    let sign = u16::from_be_bytes([raw[4], raw[5]]);
    let dscale = usize::from(u16::from_be_bytes([raw[6], raw[7]]));

    match sign {
        SIGN_NAN => return Ok("NaN".to_string()),
        SIGN_PINF => return Ok("Infinity".to_string()),
        SIGN_NINF => return Ok("-Infinity".to_string()),
        SIGN_POS | SIGN_NEG => {}
        other => return Err(format!("invalid NUMERIC sign: {other:#06x}").into()),
    }

    if raw.len() < 8 + ndigits * 2 {
        return Err("invalid NUMERIC payload: truncated digits".into());
    }
    let mut digits = Vec::with_capacity(ndigits);
    for chunk in raw[8..8 + ndigits * 2].chunks_exact(2) {
        let group = u16::from_be_bytes([chunk[0], chunk[1]]);
        if group >= NBASE {
            return Err(format!("invalid NUMERIC digit group: {group}").into());
        }
        digits.push(group);
    }

    // Group at position p (p = 0 is the first group) has value digits[p] * 10000^(weight - p).
    let group_at = |power: i32| -> u16 {
        let idx = i32::from(weight) - power;
        usize::try_from(idx)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut text = String::new();
    if weight < 0 {
        text.push('0');
    } else {
        for power in (0..=i32::from(weight)).rev() {
            let group = group_at(power);
            if text.is_empty() {
                text.push_str(&group.to_string());
            } else {
                text.push_str(&format!("{group:04}"));
            }
        }
    }

    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut power = -1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", group_at(power)));
            power -= 1;
        }
        fraction.truncate(dscale);
        text.push('.');
        text.push_str(&fraction);
    }

    if sign == SIGN_NEG && digits.iter().any(|&g| g != 0) {
        text.insert(0, '-');
    }
    Ok(text)
}

/// Encode decimal text (`-12.50`, `+3`, `.5`, `NaN`) as a binary `NUMERIC` payload.
///
/// # Errors
/// Returns an error if `text` is not a plain decimal number. Exponent notation and infinities
/// are rejected.
pub fn encode(text: &str, out: &mut BytesMut) -> Result<(), BoxError> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("nan") {
        write_header(out, 0, 0, SIGN_NAN, 0);
        return Ok(());
    }

    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !is_digits(int_part) || !is_digits(frac_part)
    {
        return Err(format!("invalid decimal literal: {text:?}").into());
    }
    let dscale = u16::try_from(frac_part.len())
        .map_err(|_| format!("decimal literal has too many fraction digits: {text:?}"))?;

    // Pad both halves to whole groups of four digits around the decimal point.
    let int_pad = (4 - int_part.len() % 4) % 4;
    let frac_pad = (4 - frac_part.len() % 4) % 4;
    let mut padded = String::with_capacity(int_pad + int_part.len() + frac_part.len() + frac_pad);
    padded.extend(std::iter::repeat_n('0', int_pad));
    padded.push_str(int_part);
    padded.push_str(frac_part);
    padded.extend(std::iter::repeat_n('0', frac_pad));

    let mut groups: Vec<u16> = padded
        .as_bytes()
        .chunks_exact(4)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'))
        })
        .collect();
    let int_groups = (int_pad + int_part.len()) / 4;
    let mut weight = i32::try_from(int_groups).map_err(|_| "decimal literal too large")? - 1;

    let leading = groups.iter().take_while(|&&g| g == 0).count();
    groups.drain(..leading);
    weight -= i32::try_from(leading).map_err(|_| "decimal literal too large")?;
    while groups.last() == Some(&0) {
        groups.pop();
    }

    if groups.is_empty() {
        write_header(out, 0, 0, SIGN_POS, dscale);
        return Ok(());
    }

    let ndigits = u16::try_from(groups.len()).map_err(|_| "decimal literal too large")?;
    let weight = i16::try_from(weight).map_err(|_| "decimal literal out of range")?;
    let sign = if negative { SIGN_NEG } else { SIGN_POS };
    write_header(out, ndigits, weight, sign, dscale);
    for group in groups {
        out.put_u16(group);
    }
    Ok(())
}

/// Shortest decimal text that reads back as `value`; `NaN` maps to `NaN`.
///
/// # Errors
/// Returns an error for infinite values.
pub fn float_to_decimal_text(value: f64) -> Result<String, BoxError> {
    if value.is_nan() {
        Ok("NaN".to_string())
    } else if value.is_infinite() {
        Err(format!("cannot bind {value} as NUMERIC").into())
    } else {
        // `Display` for f64 never uses exponent notation.
        Ok(value.to_string())
    }
}

fn write_header(out: &mut BytesMut, ndigits: u16, weight: i16, sign: u16, dscale: u16) {
    out.put_u16(ndigits);
    out.put_i16(weight);
    out.put_u16(sign);
    out.put_u16(dscale);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(text: &str) -> Vec<u8> {
        let mut out = BytesMut::new();
        encode(text, &mut out).unwrap();
        out.to_vec()
    }

    fn payload(ndigits: u16, weight: i16, sign: u16, dscale: u16, groups: &[u16]) -> Vec<u8> {
        let mut out = BytesMut::new();
        write_header(&mut out, ndigits, weight, sign, dscale);
        for g in groups {
            out.put_u16(*g);
        }
        out.to_vec()
    }

    #[test]
    fn encodes_price_into_groups() {
        // 199.99 = 199 * 10000^0 + 9900 * 10000^-1
        assert_eq!(encoded("199.99"), payload(2, 0, SIGN_POS, 2, &[199, 9900]));
        assert_eq!(
            encoded("-1234567.5"),
            payload(3, 1, SIGN_NEG, 1, &[123, 4567, 5000])
        );
    }

    #[test]
    fn encoding_strips_leading_and_trailing_zero_groups() {
        assert_eq!(encoded("0.05"), payload(1, -1, SIGN_POS, 2, &[500]));
        assert_eq!(encoded("20000"), payload(1, 1, SIGN_POS, 0, &[2]));
        assert_eq!(encoded("0.00"), payload(0, 0, SIGN_POS, 2, &[]));
    }

    #[test]
    fn decodes_with_display_scale() {
        assert_eq!(decode(&payload(1, 0, SIGN_POS, 2, &[25])).unwrap(), "25.00");
        assert_eq!(decode(&payload(2, 0, SIGN_POS, 2, &[199, 9900])).unwrap(), "199.99");
        assert_eq!(decode(&payload(0, 0, SIGN_POS, 2, &[])).unwrap(), "0.00");
        assert_eq!(decode(&payload(1, 1, SIGN_POS, 0, &[2])).unwrap(), "20000");
    }

    #[test]
    fn decodes_small_fractions_with_negative_weight() {
        // 0.00005: first group sits at 10000^-2
        assert_eq!(decode(&payload(1, -2, SIGN_POS, 5, &[5000])).unwrap(), "0.00005");
        assert_eq!(decode(&payload(1, -1, SIGN_NEG, 2, &[500])).unwrap(), "-0.05");
    }

    #[test]
    fn special_values() {
        assert_eq!(decode(&payload(0, 0, SIGN_NAN, 0, &[])).unwrap(), "NaN");
        assert_eq!(encoded("NaN"), payload(0, 0, SIGN_NAN, 0, &[]));
        assert!(float_to_decimal_text(f64::INFINITY).is_err());
        assert_eq!(float_to_decimal_text(25.0).unwrap(), "25");
        assert_eq!(float_to_decimal_text(199.99).unwrap(), "199.99");
    }

    #[test]
    fn rejects_malformed_input() {
        let mut out = BytesMut::new();
        assert!(encode("1e5", &mut out).is_err());
        assert!(encode("12.3.4", &mut out).is_err());
        assert!(encode("-", &mut out).is_err());
        assert!(decode(&[0, 1, 0, 0]).is_err());
        assert!(decode(&payload(1, 0, SIGN_POS, 0, &[10_000])).is_err());
    }
}
