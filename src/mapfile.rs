//! Linker map file parser.
//!
//! MSVC-style `.map` files have no formal grammar. The part we care about is the
//! "Publics by Value" table, laid out in fixed columns:
//!
//! ```text
//!   Address         Publics by Value              Rva+Base       Lib:Object
//!
//!  0001:00000000       _WinMain@16                00401000 f   MAPFILE.obj
//! ```
//!
//! Columns `[0, 21)` hold `Section:Offset` and are ignored. The mangled name
//! starts at column 21; the `Rva+Base` address is the next whitespace-separated
//! token. Flags and object file columns are ignored.

use crate::symbol::SymbolRecord;

/// Text that introduces the symbol table.
pub const PUBLICS_MARKER: &str = "Publics by Value";

/// Width of the `Section:Offset` column; the name starts here.
pub const NAME_COLUMN: usize = 21;

/// Fixed lines between the marker and the first record.
const HEADER_LINES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekingMarker,
    SkippingHeader(usize),
    Records,
}

/// Single-pass, line-oriented scanner over map file text.
#[derive(Debug)]
pub struct MapParser {
    state: State,
}

impl Default for MapParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MapParser {
    pub fn new() -> Self {
        Self {
            state: State::SeekingMarker,
        }
    }

    /// Parses a whole map file, returning records in line order.
    ///
    /// A file without the marker yields no records.
    pub fn parse(text: &str) -> Vec<SymbolRecord> {
        let mut parser = Self::new();
        text.lines().filter_map(|line| parser.feed_line(line)).collect()
    }

    /// Advances the scanner by one line.
    pub fn feed_line(&mut self, line: &str) -> Option<SymbolRecord> {
        match self.state {
            State::SeekingMarker => {
                if line.len() > NAME_COLUMN && line.contains(PUBLICS_MARKER) {
                    tracing::trace!("Found symbol table marker");
                    self.state = State::SkippingHeader(0);
                }
                None
            }
            State::SkippingHeader(skipped) => {
                let skipped = skipped + 1;
                self.state = if skipped < HEADER_LINES {
                    State::SkippingHeader(skipped)
                } else {
                    State::Records
                };
                None
            }
            State::Records => {
                if line.len() <= NAME_COLUMN {
                    return None;
                }
                let record = parse_record(line);
                if record.is_none() {
                    tracing::trace!("Not a symbol record: {:?}", line);
                }
                record
            }
        }
    }
}

/// Parses one fixed-column record line.
fn parse_record(line: &str) -> Option<SymbolRecord> {
    let rest = line.get(NAME_COLUMN..)?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }

    let mut fields = rest.split_whitespace();
    let name = fields.next()?;
    let address = fields.next().map(parse_address).unwrap_or(0);

    Some(SymbolRecord::new(name, address))
}

/// Base-16 address column; anything that is not hexadecimal reads as zero.
fn parse_address(token: &str) -> u64 {
    u64::from_str_radix(token, 16).unwrap_or(0)
}
