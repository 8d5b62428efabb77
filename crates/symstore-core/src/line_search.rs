//! Line table search shared by both stores.
//!
//! A line table is a pair of parallel arrays, code offsets ascending and the
//! source line each offset starts. These helpers turn one segment instance of
//! such a table into [`LineNumber`] ranges and match source file names the
//! way a user types them.

use crate::types::{FileSegmentInfo, LineNumber, LAST_LINE_NUMBER_END};

/// Index of the entry covering `target`: the exact offset, or the last entry
/// that starts below it.
pub fn find_offset_index(offsets: &[u32], target: u32) -> Option<usize>
{
    offsets.partition_point(|&offset| offset <= target).checked_sub(1)
}

/// Index of the closest line at or after `line`, falling back to the highest
/// line of the table.
pub fn closest_line_index(line_numbers: &[u16], line: u16) -> Option<usize>
{
    let mut closest: Option<(usize, u16)> = None;
    let mut highest: Option<(usize, u16)> = None;

    for (z, &number) in line_numbers.iter().enumerate() {
        if highest.is_none_or(|(_, h)| number > h) {
            highest = Some((z, number));
        }
        if number >= line {
            let distance = number - line;
            if closest.is_none_or(|(_, d)| distance < d) {
                closest = Some((z, distance));
            }
        }
    }

    closest.or(highest).map(|(z, _)| z)
}

/// Build the line covering entry `line_index` of a segment instance.
///
/// The last entry runs to the end of the segment and has an open-ended
/// `number_end`.
pub fn line_number_from_segment(
    compiland_index: u16,
    file_index: u16,
    segment: &FileSegmentInfo,
    line_index: usize,
) -> Option<LineNumber>
{
    let offset = *segment.offsets.get(line_index)?;
    let number = *segment.line_numbers.get(line_index)?;

    let (length, number_end) = match (segment.offsets.get(line_index + 1), segment.line_numbers.get(line_index + 1)) {
        (Some(&next_offset), Some(&next_number)) => {
            (next_offset.wrapping_sub(offset), next_number.wrapping_sub(1))
        }
        _ => (segment.end.wrapping_sub(offset).wrapping_add(1), LAST_LINE_NUMBER_END),
    };

    Some(LineNumber {
        compiland_index,
        file_index,
        segment_instance: segment.segment_instance,
        line_index: line_index as u16,
        number,
        number_end,
        section: segment.segment_index,
        offset,
        length,
    })
}

fn is_separator(b: u8) -> bool
{
    b == b'/' || b == b'\\'
}

fn same_path_byte(a: u8, b: u8) -> bool
{
    (is_separator(a) && is_separator(b)) || a.eq_ignore_ascii_case(&b)
}

/// Whole-path comparison: ASCII case-insensitive, `/` equal to `\`.
pub fn exact_file_name_match(a: &[u8], b: &[u8]) -> bool
{
    a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| same_path_byte(x, y))
}

/// Trailing-component comparison: the shorter path must equal the end of the
/// longer one, starting at a path separator boundary.
///
/// `src/main.d` matches `C:\work\src\main.d` but `ain.d` does not.
pub fn partial_file_name_match(a: &[u8], b: &[u8]) -> bool
{
    if a.is_empty() || b.is_empty() {
        return false;
    }

    let mut i = a.len();
    let mut j = b.len();

    loop {
        i -= 1;
        j -= 1;

        if !same_path_byte(a[i], b[j]) {
            return false;
        }
        if is_separator(a[i]) {
            return true;
        }
        if i == 0 || j == 0 {
            break;
        }
    }

    match (i, j) {
        (0, 0) => true,
        (0, j) => is_separator(b[j - 1]),
        (i, _) => is_separator(a[i - 1]),
    }
}
