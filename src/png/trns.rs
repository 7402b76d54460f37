use crate::FormatError;

use super::chunk_ty;

/// Transparency
///
/// See: [tRNS](https://www.w3.org/TR/png/#11tRNS)
///
/// * `Gray` and `Rgb` each name a single color. All samples of that color in
///   the image are fully transparent. The chunk stores each sample as a
///   big-endian `u16`, and since only depths up to 8 are handled here, we
///   keep just the low byte.
/// * `Index` is the first palette index with an alpha of zero. Partial palette
///   alphas can't be expressed as a PDF color key mask, so they're not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transparency {
  Gray(u8),
  Rgb([u8; 3]),
  Index(usize),
}
impl Transparency {
  /// Interprets a `tRNS` payload according to the image's color type.
  ///
  /// Indexed data without any fully transparent entry gives `None`.
  pub fn from_payload(color_type: u8, data: &[u8]) -> Result<Option<Self>, FormatError> {
    let too_short =
      || FormatError::InvalidChunkLength { chunk: chunk_ty::tRNS, length: data.len() as u32 };
    Ok(match color_type {
      0 => match data {
        [_, y, ..] => Some(Self::Gray(*y)),
        _ => return Err(too_short()),
      },
      2 => match data {
        [_, r, _, g, _, b, ..] => Some(Self::Rgb([*r, *g, *b])),
        _ => return Err(too_short()),
      },
      _ => data.iter().position(|&a| a == 0).map(Self::Index),
    })
  }

  /// The PDF `/Mask` color key ranges for this transparency.
  ///
  /// Each transparent sample becomes a `[min max]` pair with `min == max`.
  pub fn color_key_mask(&self) -> Vec<usize> {
    match *self {
      Self::Gray(y) => vec![y as usize, y as usize],
      Self::Rgb([r, g, b]) => {
        vec![r as usize, r as usize, g as usize, g as usize, b as usize, b as usize]
      }
      Self::Index(i) => vec![i, i],
    }
  }
}

#[test]
fn test_trns_by_color_type() {
  assert_eq!(Transparency::from_payload(0, &[0, 42]), Ok(Some(Transparency::Gray(42))));
  assert_eq!(
    Transparency::from_payload(2, &[0, 10, 0, 20, 0, 30]),
    Ok(Some(Transparency::Rgb([10, 20, 30])))
  );
  assert_eq!(Transparency::from_payload(3, b"\x01\x00"), Ok(Some(Transparency::Index(1))));
  assert_eq!(Transparency::from_payload(3, &[255, 255, 128]), Ok(None));
}

#[test]
fn test_trns_too_short() {
  assert_eq!(
    Transparency::from_payload(2, &[0, 10, 0, 20]),
    Err(FormatError::InvalidChunkLength { chunk: crate::AsciiArray(*b"tRNS"), length: 4 })
  );
  assert!(Transparency::from_payload(0, &[0]).is_err());
}

#[test]
fn test_color_key_mask() {
  assert_eq!(Transparency::Rgb([1, 2, 3]).color_key_mask(), vec![1, 1, 2, 2, 3, 3]);
  assert_eq!(Transparency::Index(7).color_key_mask(), vec![7, 7]);
}
