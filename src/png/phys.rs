/// Meters to inches, used to turn pixels per meter into dots per inch.
///
/// Note: this is the rounded factor, not `1.0 / 0.0254`.
pub const INCHES_PER_METER: f64 = 39.3701;

/// `pHYs`: Physical pixel dimensions
///
/// Specifies the intended pixel size or aspect ratio for display of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(nonstandard_style)]
pub struct pHYs {
  pub ppu_x: u32,
  pub ppu_y: u32,
  /// `1` means pixels per meter.
  pub unit: u8,
}
impl pHYs {
  /// Number of bytes a `pHYs` payload has.
  pub const PAYLOAD_LEN: u32 = 9;

  /// Gets the dots per inch, if the resolution is the same on both axes.
  ///
  /// * With the meter unit the value is converted to inches.
  /// * Any other unit is taken to already be dots per inch.
  /// * PNG lets x and y differ, but a single dpi can't express that, so those
  ///   chunks give `None`.
  pub fn dpi(&self) -> Option<f64> {
    if self.ppu_x != self.ppu_y {
      return None;
    }
    Some(match self.unit {
      1 => f64::from(self.ppu_x) / INCHES_PER_METER,
      _ => f64::from(self.ppu_x),
    })
  }
}
impl From<[u8; 9]> for pHYs {
  #[inline]
  fn from([x0, x1, x2, x3, y0, y1, y2, y3, unit]: [u8; 9]) -> Self {
    Self { ppu_x: u32::from_be_bytes([x0, x1, x2, x3]), ppu_y: u32::from_be_bytes([y0, y1, y2, y3]), unit }
  }
}

#[test]
fn test_phys_dpi() {
  let p = pHYs::from([0, 0, 0x0B, 0x13, 0, 0, 0x0B, 0x13, 1]);
  assert_eq!(p, pHYs { ppu_x: 2835, ppu_y: 2835, unit: 1 });
  let dpi = p.dpi().unwrap();
  assert!((dpi - 72.0).abs() < 0.01, "{dpi}");
  assert_eq!(pHYs { ppu_x: 300, ppu_y: 300, unit: 0 }.dpi(), Some(300.0));
  assert_eq!(pHYs { ppu_x: 2835, ppu_y: 2834, unit: 1 }.dpi(), None);
}
