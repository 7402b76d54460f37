use std::io::Read;

use miniz_oxide::{deflate::compress_to_vec_zlib, inflate::decompress_to_vec_zlib};
use png_embed::{png::*, *};

fn chunk(ty: &[u8; 4], data: &[u8]) -> Vec<u8> {
  let mut v = Vec::new();
  v.extend_from_slice(&(data.len() as u32).to_be_bytes());
  v.extend_from_slice(ty);
  v.extend_from_slice(data);
  v.extend_from_slice(&[0; 4]);
  v
}

fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
  let mut data = Vec::new();
  data.extend_from_slice(&width.to_be_bytes());
  data.extend_from_slice(&height.to_be_bytes());
  data.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
  chunk(b"IHDR", &data)
}

/// Builds a whole PNG: the header, then `extra`, then `zlib` split into
/// `IDAT` chunks of at most `idat_size` bytes, then `IEND`.
fn png_file(header: Vec<u8>, extra: &[Vec<u8>], zlib: &[u8], idat_size: usize) -> Vec<u8> {
  let mut v = PNG_SIGNATURE.to_vec();
  v.extend_from_slice(&header);
  for c in extra {
    v.extend_from_slice(c);
  }
  for part in zlib.chunks(idat_size) {
    v.extend_from_slice(&chunk(b"IDAT", part));
  }
  v.extend_from_slice(&chunk(b"IEND", &[]));
  v
}

/// Filtered scanlines where every sample is different, `bpp` bytes per pixel.
fn scanlines(width: usize, height: usize, bpp: usize) -> Vec<u8> {
  let mut v = Vec::new();
  for y in 0..height {
    v.push((y % 5) as u8);
    for x in 0..(width * bpp) {
      v.push((y * 31 + x * 7) as u8);
    }
  }
  v
}

/// Splits scanlines into (color rows, alpha samples) the slow obvious way.
fn split_alpha(rows: &[u8], width: usize, channels: usize) -> (Vec<u8>, Vec<u8>) {
  let mut color = Vec::new();
  let mut alpha = Vec::new();
  for row in rows.chunks(1 + width * (channels + 1)) {
    color.push(row[0]);
    for px in row[1..].chunks(channels + 1) {
      color.extend_from_slice(&px[..channels]);
      alpha.push(px[channels]);
    }
  }
  (color, alpha)
}

fn read_all<R: Read>(mut r: R) -> Vec<u8> {
  let mut v = Vec::new();
  r.read_to_end(&mut v).unwrap();
  v
}

#[derive(Debug, Default)]
struct Document {
  requested: Vec<PdfVersion>,
}
impl OutputTarget for Document {
  fn require_pdf_version(&mut self, version: PdfVersion) {
    self.requested.push(version);
  }
}

#[test]
fn test_gray_passes_idat_through() {
  let zlib = compress_to_vec_zlib(&scanlines(7, 5, 1), 6);
  let bytes = png_file(ihdr(7, 5, 8, 0), &[chunk(b"tEXt", b"Title\0test")], &zlib, 16);
  let mut version = PdfVersion::V1_3;
  let mut image = decode_png_bytes(&bytes, &DecodeOptions::default(), &mut version).unwrap();
  assert_eq!((image.width, image.height, image.bits_per_component), (7, 5, 8));
  assert_eq!(image.color_model, ColorModel::Gray);
  assert!(!image.has_alpha());
  assert!(image.soft_mask().is_none());
  assert!(image.palette.is_empty());
  assert_eq!(image.filter(), "FlateDecode");
  assert_eq!(image.decode_parms(), "/Predictor 15 /Colors 1 /BitsPerComponent 8 /Columns 7");
  assert!(image.close_hooks().is_empty());
  assert_eq!(read_all(image.color_stream()), zlib);
  image.flush().unwrap();
  image.close().unwrap();
  assert_eq!(version, PdfVersion::V1_3);
}

#[test]
fn test_rgb_passes_through_with_color_key() {
  let zlib = compress_to_vec_zlib(&scanlines(4, 4, 3), 1);
  let trns = chunk(b"tRNS", &[0, 1, 0, 2, 0, 3]);
  let bytes = png_file(ihdr(4, 4, 8, 2), &[trns], &zlib, 5);
  let mut doc = Document::default();
  let mut image = decode_png(&bytes[..], &DecodeOptions::default(), &mut doc).unwrap();
  assert_eq!(image.color_model, ColorModel::Rgb);
  assert_eq!(image.transparency, Some(Transparency::Rgb([1, 2, 3])));
  assert_eq!(image.decode_parms(), "/Predictor 15 /Colors 3 /BitsPerComponent 8 /Columns 4");
  assert_eq!(read_all(image.color_stream()), zlib);
  assert!(doc.requested.is_empty());
}

#[test]
fn test_indexed_keeps_palette() {
  // 4-bit indexes, 6 pixels is 3 bytes per row
  let zlib = compress_to_vec_zlib(&scanlines(3, 2, 1), 6);
  let plte = chunk(b"PLTE", &[0, 0, 0, 255, 0, 0, 0, 255, 0]);
  let trns = chunk(b"tRNS", &[255, 255, 0]);
  let bytes = png_file(ihdr(6, 2, 4, 3), &[plte, trns], &zlib, 1024);
  let mut version = PdfVersion::default();
  let mut image = decode_png_bytes(&bytes, &DecodeOptions::default(), &mut version).unwrap();
  assert_eq!(image.color_model, ColorModel::Indexed);
  assert_eq!(image.color_model.pdf_name(), "Indexed");
  assert_eq!(image.bits_per_component, 4);
  assert_eq!(image.palette, [0, 0, 0, 255, 0, 0, 0, 255, 0]);
  assert_eq!(image.transparency, Some(Transparency::Index(2)));
  assert_eq!(image.decode_parms(), "/Predictor 15 /Colors 1 /BitsPerComponent 4 /Columns 6");
  assert_eq!(read_all(image.color_stream()), zlib);
}

#[test]
fn test_indexed_without_palette() {
  let zlib = compress_to_vec_zlib(&scanlines(2, 2, 1), 6);
  let bytes = png_file(ihdr(2, 2, 8, 3), &[], &zlib, 1024);
  let mut src: &[u8] = &bytes;
  let mut version = PdfVersion::default();
  let err = decode_png(&mut src, &DecodeOptions::default(), &mut version).unwrap_err();
  assert!(matches!(err, PngError::Format(FormatError::MissingPalette)), "{err:?}");
  // stopped right after the IDAT frame: payload, its CRC, and IEND are untouched
  assert_eq!(src.len(), zlib.len() + 4 + 12);
  assert_eq!(&src[..zlib.len()], &zlib[..]);
}

#[test]
fn test_palette_dropped_for_rgb() {
  let zlib = compress_to_vec_zlib(&scanlines(1, 1, 3), 6);
  let plte = chunk(b"PLTE", &[9, 9, 9]);
  let bytes = png_file(ihdr(1, 1, 8, 2), &[plte], &zlib, 1024);
  let mut version = PdfVersion::default();
  let image = decode_png_bytes(&bytes, &DecodeOptions::default(), &mut version).unwrap();
  assert!(image.palette.is_empty());
}

#[test]
fn test_gray_alpha_split() {
  let rows = scanlines(9, 6, 2);
  let (color_rows, alpha) = split_alpha(&rows, 9, 1);
  let bytes = png_file(ihdr(9, 6, 8, 4), &[], &compress_to_vec_zlib(&rows, 6), 10);
  let mut version = PdfVersion::V1_3;
  let mut image = decode_png_bytes(&bytes, &DecodeOptions::default(), &mut version).unwrap();
  assert_eq!(version, PdfVersion::V1_4);
  assert_eq!(image.color_model, ColorModel::Gray);
  assert!(image.has_alpha());
  assert_eq!(image.decode_parms(), "/Predictor 15 /Colors 1 /BitsPerComponent 8 /Columns 9");

  let color = read_all(image.color_stream());
  assert_eq!(decompress_to_vec_zlib(&color).unwrap(), color_rows);
  image.flush().unwrap();
  let mask = image.soft_mask().unwrap().to_vec();
  assert_eq!(decompress_to_vec_zlib(&mask).unwrap(), alpha);
  image.close().unwrap();
}

#[test]
fn test_rgb_alpha_split() {
  let rows = scanlines(5, 4, 4);
  let (color_rows, alpha) = split_alpha(&rows, 5, 3);
  let bytes = png_file(ihdr(5, 4, 8, 6), &[], &compress_to_vec_zlib(&rows, 9), 3);
  let mut doc = Document::default();
  let options = DecodeOptions::default()
    .with_color_compression(flate2::Compression::best())
    .with_mask_compression(flate2::Compression::none());
  let mut image = decode_png(&bytes[..], &options, &mut doc).unwrap();
  assert_eq!(doc.requested, [PdfVersion::V1_4]);
  assert_eq!(image.color_model, ColorModel::Rgb);
  assert_eq!(image.decode_parms(), "/Predictor 15 /Colors 3 /BitsPerComponent 8 /Columns 5");

  let color = read_all(image.color_stream());
  assert_eq!(decompress_to_vec_zlib(&color).unwrap(), color_rows);
  image.flush().unwrap();
  let mask = image.soft_mask().unwrap().clone();
  assert_eq!(decompress_to_vec_zlib(&mask.bytes()).unwrap(), alpha);
}

#[test]
fn test_newer_target_is_not_lowered() {
  let rows = scanlines(2, 2, 2);
  let bytes = png_file(ihdr(2, 2, 8, 4), &[], &compress_to_vec_zlib(&rows, 6), 64);
  let mut version = PdfVersion::new(1, 7);
  decode_png_bytes(&bytes, &DecodeOptions::default(), &mut version).unwrap();
  assert_eq!(version, PdfVersion::new(1, 7));
  assert_eq!(version.to_string(), "1.7");
}

#[test]
fn test_read_sizes_give_same_streams() {
  let rows = scanlines(33, 17, 4);
  let (color_rows, alpha) = split_alpha(&rows, 33, 3);
  let bytes = png_file(ihdr(33, 17, 8, 6), &[], &compress_to_vec_zlib(&rows, 6), 100);
  let options = DecodeOptions::default();

  let mut version = PdfVersion::default();
  let mut bulk = decode_png_bytes(&bytes, &options, &mut version).unwrap();
  let bulk_color = read_all(bulk.color_stream());
  bulk.flush().unwrap();

  let mut trickle = decode_png_bytes(&bytes, &options, &mut version).unwrap();
  let mut trickle_color = Vec::new();
  let mut buf = [0_u8; 1];
  loop {
    match trickle.color_stream().read(&mut buf).unwrap() {
      0 => break,
      n => trickle_color.extend_from_slice(&buf[..n]),
    }
  }
  trickle.flush().unwrap();

  assert_eq!(decompress_to_vec_zlib(&bulk_color).unwrap(), color_rows);
  assert_eq!(decompress_to_vec_zlib(&trickle_color).unwrap(), color_rows);
  assert_eq!(bulk_color, trickle_color);
  let bulk_mask = bulk.soft_mask().unwrap().to_vec();
  assert_eq!(bulk_mask, trickle.soft_mask().unwrap().to_vec());
  assert_eq!(decompress_to_vec_zlib(&bulk_mask).unwrap(), alpha);
}

#[test]
fn test_passthrough_read_sizes() {
  let zlib = compress_to_vec_zlib(&scanlines(40, 10, 3), 6);
  let bytes = png_file(ihdr(40, 10, 8, 2), &[chunk(b"gAMA", &[0, 0, 0xB1, 0x8F])], &zlib, 77);
  let mut version = PdfVersion::default();
  let mut image = decode_png_bytes(&bytes, &DecodeOptions::default(), &mut version).unwrap();
  let mut trickle = Vec::new();
  let mut buf = [0_u8; 1];
  while image.color_stream().read(&mut buf).unwrap() == 1 {
    trickle.push(buf[0]);
  }
  assert_eq!(trickle, zlib);
}

#[test]
fn test_close_hooks_run_once() {
  let rows = scanlines(3, 3, 2);
  let bytes = png_file(ihdr(3, 3, 8, 4), &[], &compress_to_vec_zlib(&rows, 6), 64);
  let mut version = PdfVersion::default();
  let mut image = decode_png_bytes(&bytes, &DecodeOptions::default(), &mut version).unwrap();
  assert_eq!(image.close_hooks(), [CloseHook::Inflate, CloseHook::AlphaCompressor, CloseHook::ColorDeflate]);
  read_all(image.color_stream());
  image.close().unwrap();
  assert!(image.close_hooks().is_empty());
  assert!(matches!(image.color_stream(), ColorStream::Closed));
  let mut buf = [0_u8; 8];
  assert_eq!(image.color_stream().read(&mut buf).unwrap(), 0);
  let mask = image.soft_mask().unwrap().to_vec();
  assert_eq!(decompress_to_vec_zlib(&mask).unwrap(), split_alpha(&rows, 3, 1).1);
  image.close().unwrap();
  assert_eq!(image.soft_mask().unwrap().to_vec(), mask);
}

#[test]
fn test_forged_bit_depth() {
  let zlib = compress_to_vec_zlib(&scanlines(2, 2, 8), 6);
  let bytes = png_file(ihdr(2, 2, 16, 6), &[], &zlib, 1024);
  let mut version = PdfVersion::default();
  let err = decode_png_bytes(&bytes, &DecodeOptions::default(), &mut version).unwrap_err();
  assert!(matches!(err, PngError::Format(FormatError::UnsupportedBitDepth(16))), "{err:?}");
  assert_eq!(version, PdfVersion::V1_3);
}

#[test]
fn test_bad_header_fields() {
  let zlib = compress_to_vec_zlib(&scanlines(1, 1, 1), 6);
  let mut version = PdfVersion::default();
  let options = DecodeOptions::default();

  let bytes = png_file(ihdr(1, 1, 8, 5), &[], &zlib, 1024);
  let err = decode_png_bytes(&bytes, &options, &mut version).unwrap_err();
  assert!(matches!(err, PngError::Format(FormatError::UnknownColorType(5))), "{err:?}");

  let mut header = ihdr(1, 1, 8, 0);
  // interlace method is the last payload byte, before the CRC
  let interlace = header.len() - 5;
  header[interlace] = 1;
  let bytes = png_file(header, &[], &zlib, 1024);
  let err = decode_png_bytes(&bytes, &options, &mut version).unwrap_err();
  assert!(matches!(err, PngError::Format(FormatError::InterlacingNotSupported)), "{err:?}");
}

#[test]
fn test_not_a_png() {
  let mut version = PdfVersion::default();
  let options = DecodeOptions::default();
  let err = decode_png_bytes(&[], &options, &mut version).unwrap_err();
  assert!(matches!(err, PngError::EndOfStream), "{err:?}");
  let err = decode_png_bytes(b"\xFF\xD8\xFF\xE0 a jpeg", &options, &mut version).unwrap_err();
  assert!(matches!(err, PngError::Format(FormatError::NotPng)), "{err:?}");
}

#[test]
fn test_dpi_from_phys() {
  let zlib = compress_to_vec_zlib(&scanlines(1, 1, 1), 6);
  let mut version = PdfVersion::default();
  let phys = |x: u32, y: u32| {
    let mut data = Vec::new();
    data.extend_from_slice(&x.to_be_bytes());
    data.extend_from_slice(&y.to_be_bytes());
    data.push(1);
    chunk(b"pHYs", &data)
  };

  let bytes = png_file(ihdr(1, 1, 8, 0), &[phys(2835, 2835)], &zlib, 1024);
  let with_dpi = DecodeOptions::default().with_read_dpi(true);
  let image = decode_png_bytes(&bytes, &with_dpi, &mut version).unwrap();
  let dpi = image.dpi.unwrap();
  assert!((dpi - 72.0).abs() < 0.01, "{dpi}");
  let image = decode_png_bytes(&bytes, &DecodeOptions::default(), &mut version).unwrap();
  assert_eq!(image.dpi, None);

  let bytes = png_file(ihdr(1, 1, 8, 0), &[phys(2835, 5670)], &zlib, 1024);
  let image = decode_png_bytes(&bytes, &with_dpi, &mut version).unwrap();
  assert_eq!(image.dpi, None);
}

#[test]
fn test_truncated_alpha_data() {
  let rows = scanlines(20, 20, 4);
  let zlib = compress_to_vec_zlib(&rows, 6);
  let mut bytes = PNG_SIGNATURE.to_vec();
  bytes.extend_from_slice(&ihdr(20, 20, 8, 6));
  bytes.extend_from_slice(&chunk(b"IDAT", &zlib));
  // cut inside the IDAT payload
  bytes.truncate(bytes.len() - 4 - zlib.len() / 2);
  let mut version = PdfVersion::default();
  let mut image = decode_png_bytes(&bytes, &DecodeOptions::default(), &mut version).unwrap();
  let mut color = Vec::new();
  let err = PngError::from(image.color_stream().read_to_end(&mut color).unwrap_err());
  assert!(matches!(err, PngError::Format(FormatError::Truncated)), "{err:?}");
}

#[test]
fn test_decode_png_no_panics() {
  // even totally random data should never panic the decoder!
  for _ in 0..10 {
    let mut png_ish = PNG_SIGNATURE.to_vec();
    png_ish.extend_from_slice(&super::rand_bytes(1024));
    for v in [super::rand_bytes(1024), png_ish] {
      let mut version = PdfVersion::default();
      if let Ok(mut image) = decode_png_bytes(&v, &DecodeOptions::default(), &mut version) {
        let mut sink = Vec::new();
        let _ = image.color_stream().read_to_end(&mut sink);
        let _ = image.flush();
        let _ = image.close();
      }
      let mut reader = ChunkReader::new(&v[..], true);
      let _ = reader.parse_until(ParserState::End);
    }
  }
}
