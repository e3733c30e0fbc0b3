//! Rewrites fixed-length asset names embedded in level data records.
//!
//! Level records store names either as single-byte strings or as UTF-16
//! big-endian strings, so every buffer is scanned for both encodings.

use std::borrow::Cow;

use encoding_rs::WINDOWS_1252;
use tracing::debug;

use crate::asset::AssetKind;
use crate::package::Package;

/// Replace every occurrence of `find` with `replace` in both encodings,
/// ignoring ASCII case on the match side. Returns the number of replacements.
///
/// `find` and `replace` must have the same number of characters, otherwise
/// the buffer is left alone and 0 is returned.
pub fn patch(buffer: &mut [u8], find: &str, replace: &str) -> usize {
    if find.is_empty() || find.chars().count() != replace.chars().count() {
        return 0;
    }

    let mut count = 0;
    if let (Some(f), Some(r)) = (single_byte(find), single_byte(replace)) {
        count += patch_single_byte(buffer, &f, &r);
    }

    let f: Vec<u16> = find.encode_utf16().collect();
    let r: Vec<u16> = replace.encode_utf16().collect();
    if f.len() == r.len() {
        count += patch_double_byte(buffer, &f, &r);
    }

    count
}

/// Patch every level data asset of the package. Returns the total number of
/// replacements.
pub fn patch_level_data(package: &mut Package, find: &str, replace: &str) -> usize {
    let mut total = 0;
    for asset in package.assets_mut() {
        if asset.kind() != AssetKind::LevelData {
            continue;
        }
        let n = patch(&mut asset.data, find, replace);
        if n > 0 {
            debug!(record = %asset.name, find, replace, matches = n, "patched level data");
        }
        total += n;
    }
    total
}

/// Windows-1252 bytes of `s`, or `None` if a character has no mapping.
fn single_byte(s: &str) -> Option<Cow<'_, [u8]>> {
    let (bytes, _, had_errors) = WINDOWS_1252.encode(s);
    (!had_errors).then_some(bytes)
}

fn patch_single_byte(buffer: &mut [u8], find: &[u8], replace: &[u8]) -> usize {
    let n = find.len();
    let mut count = 0;
    let mut i = 0;

    while i + n <= buffer.len() {
        if buffer[i..i + n].eq_ignore_ascii_case(find) {
            buffer[i..i + n].copy_from_slice(replace);
            count += 1;
            i += n;
        } else {
            i += 1;
        }
    }

    count
}

fn unit_eq_ignore_ascii_case(a: u16, b: u16) -> bool {
    a == b || (a < 0x80 && b < 0x80 && (a as u8).eq_ignore_ascii_case(&(b as u8)))
}

fn patch_double_byte(buffer: &mut [u8], find: &[u16], replace: &[u16]) -> usize {
    let width = find.len() * 2;
    let mut count = 0;
    let mut i = 0;

    while i + width <= buffer.len() {
        let matched = find.iter().enumerate().all(|(j, unit)| {
            let at = i + j * 2;
            unit_eq_ignore_ascii_case(u16::from_be_bytes([buffer[at], buffer[at + 1]]), *unit)
        });

        if matched {
            for (j, unit) in replace.iter().enumerate() {
                buffer[i + j * 2..i + j * 2 + 2].copy_from_slice(&unit.to_be_bytes());
            }
            count += 1;
            i += width;
        } else {
            i += 1;
        }
    }

    count
}
