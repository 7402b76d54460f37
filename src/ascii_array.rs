use core::fmt::Write;

/// An array of bytes expected to contain ascii data.
///
/// There's no actual enforced encoding! The `Debug` and `Display` impls will
/// just `as` cast each byte into a character. This works just as expected for
/// ascii data (`32..=126`), and is still safe for non-ascii data, but you just
/// might get non-printing characters or multi-byte unicode characters.
///
/// PNG chunk type tags are four bytes that are intended to be read as ascii,
/// so the chunk reader keeps them in this newtype to get readable log lines
/// and error messages.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct AsciiArray<const N: usize>(pub [u8; N]);

impl<const N: usize> core::fmt::Display for AsciiArray<N> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    self.0.iter().try_for_each(|&u| f.write_char(u as char))
  }
}
impl<const N: usize> core::fmt::Debug for AsciiArray<N> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "\"{self}\"")
  }
}

impl<const N: usize> PartialEq<[u8; N]> for AsciiArray<N> {
  #[inline]
  fn eq(&self, other: &[u8; N]) -> bool {
    &self.0 == other
  }
}

#[test]
fn test_ascii_array_formatting() {
  let tag = AsciiArray(*b"IDAT");
  assert_eq!(format!("{tag}"), "IDAT");
  assert_eq!(format!("{tag:?}"), "\"IDAT\"");
  assert_eq!(tag, *b"IDAT");
}
