#![forbid(unsafe_code)]

//! Just has shorthands for the exact-size reads a PNG stream needs.
//!
//! Running out of data in any of these is always a truncated chunk, so they
//! all report [`FormatError::Truncated`] rather than a plain end of stream.

use std::io::{self, Read};

use crate::FormatError;

#[inline]
pub fn read_array<const N: usize, R: Read>(r: &mut R) -> io::Result<[u8; N]> {
  let mut a = [0_u8; N];
  r.read_exact(&mut a).map_err(truncated)?;
  Ok(a)
}

/// Fills as much of `buf` as the reader has before its end, giving the count.
///
/// Unlike `read_exact` this tells "no bytes at all" apart from "some bytes".
pub fn read_up_to<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
  let mut filled = 0;
  while filled < buf.len() {
    match r.read(&mut buf[filled..]) {
      Ok(0) => break,
      Ok(n) => filled += n,
      Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
      Err(e) => return Err(e),
    }
  }
  Ok(filled)
}

/// Reads and throws away exactly `n` bytes, going through `scratch`.
pub fn skip_bytes<R: Read>(r: &mut R, mut n: u64, scratch: &mut [u8]) -> io::Result<()> {
  while n > 0 {
    let step = n.min(scratch.len() as u64) as usize;
    r.read_exact(&mut scratch[..step]).map_err(truncated)?;
    n -= step as u64;
  }
  Ok(())
}

/// Turns an early end of stream into a format error, passes anything else.
#[inline]
pub fn truncated(e: io::Error) -> io::Error {
  if e.kind() == io::ErrorKind::UnexpectedEof {
    io::Error::new(io::ErrorKind::InvalidData, FormatError::Truncated)
  } else {
    e
  }
}

#[test]
fn test_read_array() {
  let mut bytes: &[u8] = &[0x00, 0x00, 0x0B, 0x13, 7, 1, 2];
  assert_eq!(read_array::<4, _>(&mut bytes).map(u32::from_be_bytes).unwrap(), 2835);
  assert_eq!(read_array::<1, _>(&mut bytes).unwrap(), [7]);
  let e = read_array::<4, _>(&mut bytes).unwrap_err();
  assert_eq!(e.kind(), io::ErrorKind::InvalidData);
}

#[test]
fn test_read_up_to_stops_at_end() {
  let mut r: &[u8] = &[1, 2, 3];
  let mut buf = [0_u8; 8];
  assert_eq!(read_up_to(&mut r, &mut buf).unwrap(), 3);
  assert_eq!(&buf[..3], &[1, 2, 3]);
  assert_eq!(read_up_to(&mut r, &mut buf).unwrap(), 0);
}

#[test]
fn test_skip_bytes_uses_small_scratch() {
  let data: Vec<u8> = (0..=255).collect();
  let mut r: &[u8] = &data;
  let mut scratch = [0_u8; 7];
  skip_bytes(&mut r, 200, &mut scratch).unwrap();
  assert_eq!(r.len(), 56);
  assert_eq!(r[0], 200);
  assert!(skip_bytes(&mut r, 57, &mut scratch).is_err());
}
