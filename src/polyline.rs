//! Encoded-polyline decoding.
//!
//! Implements the standard delta-compressed, base-32 varint coordinate
//! encoding (1e5 scale) used by the routing provider's `overview_polyline`.
//! Decoding is exact: malformed input fails with a [`DecodeError`] rather
//! than recovering, and callers treat any failure as "no route".

use crate::error::DecodeError;
use crate::GeoPoint;

/// Decode an encoded polyline into its ordered coordinate sequence.
///
/// Returns one point per encoded coordinate pair, in traversal order.
/// An empty string decodes to an empty path.
///
/// # Example
/// ```
/// use drive_planner::polyline;
///
/// let path = polyline::decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
/// assert_eq!(path.len(), 3);
/// assert!((path[0].lat - 38.5).abs() < 1e-9);
/// ```
pub fn decode(encoded: &str) -> Result<Vec<GeoPoint>, DecodeError> {
    let bytes = encoded.as_bytes();
    let mut path = Vec::new();
    let mut i = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while i < bytes.len() {
        let (dlat, next) = decode_value(bytes, i)?;
        let (dlng, next) = decode_value(bytes, next)?;
        i = next;
        lat += dlat;
        lng += dlng;
        path.push(GeoPoint::new(lat as f64 / 1e5, lng as f64 / 1e5));
    }

    Ok(path)
}

/// Decode one zig-zag varint starting at `i`, returning the signed value and
/// the index just past its last chunk.
fn decode_value(bytes: &[u8], mut i: usize) -> Result<(i64, usize), DecodeError> {
    let mut result: u64 = 0;
    let mut shift = 0u32;

    loop {
        let &b = bytes.get(i).ok_or(DecodeError::UnexpectedEnd)?;
        if !(63..=126).contains(&b) {
            return Err(DecodeError::InvalidChar(b as char));
        }
        if shift >= 64 {
            return Err(DecodeError::InvalidChar(b as char));
        }
        let chunk = (b - 63) as u64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        i += 1;
        if chunk & 0x20 == 0 {
            break;
        }
    }

    // Invert the zig-zag: low bit carries the sign.
    let value = if result & 1 == 1 {
        !(result >> 1) as i64
    } else {
        (result >> 1) as i64
    };

    Ok((value, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference vector published with the encoding's specification.
    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_decode_reference_vector() {
        let path = decode(REFERENCE).unwrap();
        assert_eq!(path.len(), 3);
        assert!(approx_eq(path[0].lat, 38.5));
        assert!(approx_eq(path[0].lng, -120.2));
        assert!(approx_eq(path[1].lat, 40.7));
        assert!(approx_eq(path[1].lng, -120.95));
        assert!(approx_eq(path[2].lat, 43.252));
        assert!(approx_eq(path[2].lng, -126.453));
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode("").unwrap(), vec![]);
    }

    #[test]
    fn test_decode_truncated() {
        // Drop the final chunk so the last coordinate pair is incomplete.
        let truncated = &REFERENCE[..REFERENCE.len() - 1];
        assert_eq!(decode(truncated), Err(DecodeError::UnexpectedEnd));
    }

    #[test]
    fn test_decode_invalid_character() {
        assert!(matches!(
            decode("_p~iF~ps|U\u{1}"),
            Err(DecodeError::InvalidChar(_))
        ));
    }
}
