// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Destination-name composition for the device's legacy filesystem

use crate::protocol::MAX_NAME_LEN;

/// Splits a device path into its directory part (separator included) and
/// basename. The basename starts after the rightmost `:`, then after the
/// rightmost `\` to its right.
pub fn split_device_path(path: &str) -> (&str, &str) {
    let after_colon = path.rfind(':').map_or(0, |i| i + 1);
    let base = match path[after_colon..].rfind('\\') {
        Some(i) => after_colon + i + 1,
        None => after_colon,
    };
    (&path[..base], &path[base..])
}

/// Derives the device-side destination name for one source file.
///
/// A single source with an explicit destination passes through unchanged.
/// Multiple sources, or a destination ending in `\` or `:`, treat the
/// destination as a directory: an 8.3-style name is derived from the source
/// basename (stem capped at 8 characters, extension at 3), and the whole
/// path stays within the device's 79-character budget.
pub fn compose_device_name(source: &str, dest: &str, source_count: usize) -> String {
    let mut name = dest.replace('/', "\\");
    let last = name.chars().last();
    if source_count <= 1 && last != Some('\\') && last != Some(':') {
        return name;
    }
    if last != Some('\\') {
        name.push('\\');
    }

    let base = source
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source);
    let (stem, ext) = match base.rfind('.') {
        Some(i) => (&base[..i], Some(&base[i + 1..])),
        None => (base, None),
    };

    let mut budget = MAX_NAME_LEN.saturating_sub(name.chars().count());
    for ch in stem.chars().take(8) {
        if budget == 0 {
            return name;
        }
        name.push(ch);
        budget -= 1;
    }
    if let Some(ext) = ext {
        if budget > 0 {
            name.push('.');
            budget -= 1;
            for ch in ext.chars().take(3) {
                if budget == 0 {
                    break;
                }
                name.push(ch);
                budget -= 1;
            }
        }
    }
    name
}

// ============================================================================
// Tests
// ============================================================================
