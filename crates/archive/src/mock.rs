//! In-memory zip builders for tests.
//!
//! Panics on failure: if test setup is wrong then the test should not pass.

use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

/// Smallest byte sequence that still identifies as a PNG.
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Build a zip file containing the given members, in the given order.
pub fn build_zip<'a>(entries: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, data) in entries {
        zip.start_file(name, options).unwrap_or_else(|e| panic!("build_zip: start {name}: {e}"));
        zip.write_all(data).unwrap_or_else(|e| panic!("build_zip: write {name}: {e}"));
    }
    zip.finish().unwrap_or_else(|e| panic!("build_zip: finish: {e}")).into_inner()
}

/// Build a comic archive whose pages hold [`FAKE_PNG`] followed by the page
/// name (so every page is distinguishable), plus an optional `ComicInfo.xml`.
pub fn build_comic(pages: &[&str], comicinfo: Option<&str>) -> Vec<u8> {
    let mut members: Vec<(String, Vec<u8>)> =
        pages.iter().map(|name| (name.to_string(), fake_page(name))).collect();
    if let Some(xml) = comicinfo {
        members.push((longbox_extract::COMICINFO_FILENAME.to_string(), xml.as_bytes().to_vec()));
    }
    build_zip(members.iter().map(|(name, data)| (name.as_str(), data.as_slice())))
}

/// A PNG signature and `IHDR` chunk declaring `width` x `height`, enough
/// for the page to be measured. The chunk CRC is left zeroed.
pub fn png_page(width: u32, height: u32) -> Vec<u8> {
    let mut header = FAKE_PNG.to_vec();
    header.extend_from_slice(&13u32.to_be_bytes());
    header.extend_from_slice(b"IHDR");
    header.extend_from_slice(&width.to_be_bytes());
    header.extend_from_slice(&height.to_be_bytes());
    // 8-bit truecolour, no interlacing.
    header.extend_from_slice(&[8, 2, 0, 0, 0]);
    header.extend_from_slice(&[0; 4]);
    header
}

/// Page payload written by [`build_comic`] for a page name.
pub fn fake_page(name: &str) -> Vec<u8> {
    [FAKE_PNG, name.as_bytes()].concat()
}
