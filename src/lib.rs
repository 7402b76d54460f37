#![cfg_attr(docs_rs, feature(doc_cfg))]
//#![warn(missing_docs)]

//! A crate for streaming PNG data into PDF documents.
//!
//! PDF can display PNG image data almost directly: the `IDAT` data of a PNG
//! is a Zlib stream of PNG-filtered scanlines, and a PDF `FlateDecode` stream
//! with a PNG predictor is exactly the same thing. This crate reads a PNG from
//! any [`Read`](std::io::Read) source, collects the metadata a PDF image
//! needs, and gives you the compressed image data as another `Read`, without
//! ever holding the whole file in memory.
//!
//! Images with an alpha channel are split into a color image and a separate
//! soft mask, since that's how PDF does transparency.
//!
//! * Use [`decode_png`] to get an [`ImageDescriptor`].
//! * Use the [`png`] module directly if you just want to walk PNG chunks.

pub mod ascii_array;
pub use ascii_array::*;

mod error;
pub use error::*;

#[cfg(feature = "png")]
mod parser_helpers;

#[cfg(feature = "png")]
pub mod png;

#[cfg(feature = "png")]
mod pdf_image;
#[cfg(feature = "png")]
pub use pdf_image::*;
#[cfg(feature = "png")]
pub use png::{ColorModel, SoftMask, Transparency};
