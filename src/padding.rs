//! Padding measurement and rewriting.
//!
//! Compilers align functions by filling the gap after a `ret` with breakpoint
//! bytes:
//!
//! ```text
//! 5D          pop ebp
//! C3          ret
//! CC CC CC    int3 (filler)
//! 55          push ebp        <- next function
//! ```
//!
//! The patcher turns that filler into a no-op sled ending in its own `ret`, so
//! a linear disassembler sees plausible reachable code instead of a gap.

use crate::arch::Architecture;
use crate::symbol::{SkipReason, SymbolRecord};

/// Measures the run of filler bytes directly before `raw_offset`.
///
/// The scan walks backwards and never reads below `floor`. Returns
/// `(pad_start, pad_len)`; `pad_len == 0` when the preceding byte is not filler.
pub fn measure_padding<A: Architecture>(
    arch: &A,
    image: &[u8],
    raw_offset: usize,
    floor: usize,
) -> (usize, usize) {
    if raw_offset > image.len() {
        return (raw_offset, 0);
    }

    let mut start = raw_offset;
    while start > floor && arch.is_trap(image[start - 1]) {
        start -= 1;
    }
    (start, raw_offset - start)
}

/// Rewrites a symbol's padding as a no-op sled terminated by a return.
///
/// Only applies when the byte before the padding is a return instruction.
/// Writes stay within `[pad_start, pad_start + pad_len)`. Returns the number of
/// bytes rewritten.
pub fn patch_padding<A: Architecture>(
    arch: &A,
    image: &mut [u8],
    record: &SymbolRecord,
) -> Result<usize, SkipReason> {
    if !record.has_padding() {
        return Err(SkipReason::NoPadding);
    }

    let range = record.pad_range();
    if range.end > image.len() {
        return Err(SkipReason::Unmapped);
    }

    let previous = range.start.checked_sub(1).map(|at| image[at]);
    if !previous.is_some_and(|byte| arch.is_return(byte)) {
        return Err(SkipReason::PrecheckFailed);
    }

    let sled = &mut image[range];
    sled.fill(arch.nop_byte());
    if let Some(last) = sled.last_mut() {
        *last = arch.return_byte();
    }
    Ok(sled.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::x86::X86;

    fn record_with_pad(pad_start: usize, pad_len: usize) -> SymbolRecord {
        let mut record = SymbolRecord::new("f", 0);
        record.raw_offset = Some(pad_start + pad_len);
        record.pad_start = pad_start;
        record.pad_len = pad_len;
        record
    }

    #[test]
    fn counts_filler_run() {
        for k in 0..20 {
            let mut image = vec![0x55, 0x8B, 0xEC, 0xC3];
            image.extend(std::iter::repeat(0xCC).take(k));
            image.push(0x55);
            let raw_offset = image.len() - 1;

            let (start, len) = measure_padding(&X86, &image, raw_offset, 0);
            assert_eq!(len, k);
            assert_eq!(start, raw_offset - k);
        }
    }

    #[test]
    fn scan_stops_at_floor() {
        let image = vec![0xCC; 16];
        assert_eq!(measure_padding(&X86, &image, 10, 4), (4, 6));
        assert_eq!(measure_padding(&X86, &image, 10, 0), (0, 10));
        assert_eq!(measure_padding(&X86, &image, 0, 0), (0, 0));
        assert_eq!(measure_padding(&X86, &image, 4, 4), (4, 0));
    }

    #[test]
    fn scan_tolerates_offsets_past_the_end() {
        let image = vec![0xCC; 4];
        assert_eq!(measure_padding(&X86, &image, 4, 0), (0, 4));
        assert_eq!(measure_padding(&X86, &image, 9, 0), (9, 0));
    }

    #[test]
    fn writes_sled_after_return() {
        let mut image = vec![0x5D, 0xC3, 0xCC, 0xCC, 0xCC, 0xCC, 0xCC, 0x55];
        let written = patch_padding(&X86, &mut image, &record_with_pad(2, 5)).unwrap();
        assert_eq!(written, 5);
        assert_eq!(image, vec![0x5D, 0xC3, 0x90, 0x90, 0x90, 0x90, 0xC3, 0x55]);
    }

    #[test]
    fn single_byte_pad_becomes_return() {
        let mut image = vec![0xC3, 0xCC, 0x55];
        patch_padding(&X86, &mut image, &record_with_pad(1, 1)).unwrap();
        assert_eq!(image, vec![0xC3, 0xC3, 0x55]);
    }

    #[test]
    fn leaves_pad_without_preceding_return() {
        let original = vec![0x5D, 0xE8, 0xCC, 0xCC, 0xCC, 0xCC, 0xCC, 0x55];
        let mut image = original.clone();
        assert_eq!(
            patch_padding(&X86, &mut image, &record_with_pad(2, 5)),
            Err(SkipReason::PrecheckFailed)
        );
        assert_eq!(image, original);
    }

    #[test]
    fn pad_at_start_of_buffer_fails_precheck() {
        let mut image = vec![0xCC, 0xCC, 0x55];
        assert_eq!(
            patch_padding(&X86, &mut image, &record_with_pad(0, 2)),
            Err(SkipReason::PrecheckFailed)
        );
    }

    #[test]
    fn empty_pad_is_not_patched() {
        let mut image = vec![0xC3, 0x55];
        assert_eq!(
            patch_padding(&X86, &mut image, &record_with_pad(1, 0)),
            Err(SkipReason::NoPadding)
        );
        assert_eq!(image, vec![0xC3, 0x55]);
    }
}
