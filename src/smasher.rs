//! Core smashing logic.
//!
//! This module contains the `PadSmasher` struct which orchestrates the rewrite:
//! 1. Header: Reads the section table from the image.
//! 2. Symbols: Translates map file addresses to file offsets.
//! 3. Scan: Orders functions by file offset and measures the filler before each.
//! 4. Patch: Rewrites eligible filler as a no-op sled.
//! 5. Output: Hands back the mutated image, same length as the input.

use std::collections::BTreeMap;
use std::fmt;

use crate::arch::Architecture;
use crate::error::Result;
use crate::image::ImageLayout;
use crate::mapfile::MapParser;
use crate::padding::{measure_padding, patch_padding};
use crate::symbol::{SkipReason, SymbolRecord};

/// A mapped symbol and the lowest file offset its padding may reach.
#[derive(Debug)]
struct Candidate {
    record: SymbolRecord,
    section_floor: usize,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmashReport {
    /// Records read from the map file.
    pub symbols: usize,
    /// Records that mapped to a file offset.
    pub candidates: usize,
    /// Padding regions rewritten.
    pub patched: usize,
    pub bytes_rewritten: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl SmashReport {
    fn skip(&mut self, record: &SymbolRecord, reason: SkipReason) {
        tracing::info!("Skipping {} ({:#x}): {}", record.name, record.virtual_address, reason);
        *self.skipped.entry(reason).or_default() += 1;
    }

    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }
}

impl fmt::Display for SmashReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} symbols, {} mapped, {} sleds written ({} bytes)",
            self.symbols, self.candidates, self.patched, self.bytes_rewritten
        )?;
        for (reason, count) in &self.skipped {
            write!(f, ", {count} skipped: {reason}")?;
        }
        Ok(())
    }
}

pub struct PadSmasher<A: Architecture> {
    arch: A,
    image: Vec<u8>,
    input_len: usize,
    layout: ImageLayout,
    candidates: Vec<Candidate>,
    report: SmashReport,
}

impl<A: Architecture> PadSmasher<A> {
    /// Takes ownership of the image and reads its headers.
    pub fn new(arch: A, image: Vec<u8>) -> Result<Self> {
        let layout = ImageLayout::parse(&image)?;
        tracing::debug!(
            "{} image, base {:#x}, {} sections",
            if layout.is_64 { "PE32+" } else { "PE32" },
            layout.image_base,
            layout.sections.len()
        );
        Ok(Self {
            arch,
            input_len: image.len(),
            image,
            layout,
            candidates: Vec::new(),
            report: SmashReport::default(),
        })
    }

    pub fn layout(&self) -> &ImageLayout {
        &self.layout
    }

    /// Parses map file text and adds every public symbol.
    pub fn add_map(&mut self, map_text: &str) {
        self.add_symbols(MapParser::parse(map_text));
    }

    /// Translates symbols to file offsets, dropping the ones that don't map.
    pub fn add_symbols(&mut self, records: impl IntoIterator<Item = SymbolRecord>) {
        for mut record in records {
            self.report.symbols += 1;

            let placement = match self.layout.place(record.virtual_address) {
                Ok(placement) => placement,
                Err(reason) => {
                    self.report.skip(&record, reason);
                    continue;
                }
            };
            if placement.raw_offset > self.image.len() {
                tracing::warn!(
                    "{} maps to {:#x}, past the end of the file ({:#x})",
                    record.name,
                    placement.raw_offset,
                    self.image.len()
                );
                self.report.skip(&record, SkipReason::Unmapped);
                continue;
            }
            if !placement.backed {
                tracing::warn!(
                    "{} ({:#x}) lies past the raw data of its section",
                    record.name,
                    record.virtual_address
                );
            }

            record.raw_offset = Some(placement.raw_offset);
            self.report.candidates += 1;
            self.candidates.push(Candidate {
                record,
                section_floor: placement.floor,
            });
        }
    }

    /// Measures the filler before every candidate.
    ///
    /// Candidates are ordered by file offset first, so each scan is bounded by
    /// the previous function as well as by its own section.
    pub fn scan(&mut self) {
        let sorted = self
            .candidates
            .windows(2)
            .all(|pair| pair[0].record.raw_offset <= pair[1].record.raw_offset);
        if !sorted {
            tracing::warn!("Map file is not sorted by address, reordering symbols");
            self.candidates.sort_by_key(|c| c.record.raw_offset);
        }

        let mut previous: Option<usize> = None;
        for candidate in &mut self.candidates {
            let Some(raw_offset) = candidate.record.raw_offset else {
                continue;
            };
            let floor = match previous {
                Some(prev) => candidate.section_floor.max(prev + 1),
                None => candidate.section_floor,
            };
            let (pad_start, pad_len) = measure_padding(&self.arch, &self.image, raw_offset, floor);

            let record = &mut candidate.record;
            record.pad_start = pad_start;
            record.pad_len = pad_len;
            if record.has_padding() {
                tracing::info!(
                    "Symbol: {} RVA: {:#x} Raw: {:#x} Pad: {:#x} PadLen: {}",
                    record.name,
                    record.virtual_address,
                    raw_offset,
                    pad_start,
                    pad_len
                );
            }
            previous = Some(raw_offset);
        }
    }

    /// Writes a sled into every padding region that follows a return.
    pub fn patch(&mut self) {
        for candidate in &self.candidates {
            let record = &candidate.record;
            match patch_padding(&self.arch, &mut self.image, record) {
                Ok(written) => {
                    tracing::info!("{}: Wrote nop sled to {:#x}", record.name, record.pad_start);
                    self.report.patched += 1;
                    self.report.bytes_rewritten += written;
                }
                Err(reason) => self.report.skip(record, reason),
            }
        }
    }

    /// Enriched records, in file order once [`PadSmasher::scan`] has run.
    pub fn records(&self) -> impl Iterator<Item = &SymbolRecord> {
        self.candidates.iter().map(|c| &c.record)
    }

    /// Releases the rewritten image.
    pub fn finish(self) -> (Vec<u8>, SmashReport) {
        debug_assert_eq!(self.image.len(), self.input_len);
        (self.image, self.report)
    }
}

/// Runs every stage over an in-memory image and map file.
pub fn smash<A: Architecture>(arch: A, image: Vec<u8>, map_text: &str) -> Result<(Vec<u8>, SmashReport)> {
    let mut smasher = PadSmasher::new(arch, image)?;
    smasher.add_map(map_text);
    smasher.scan();
    smasher.patch();
    Ok(smasher.finish())
}
