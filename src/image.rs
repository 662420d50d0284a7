//! PE header navigation and address translation.
//!
//! Reads just enough of the image header to build a [`SectionTable`]: the
//! virtual range of every section and the file offset its data starts at.
//! Everything else in the header is left alone.

use object::pe;
use object::read::coff::CoffHeader;
use object::read::pe::{ImageNtHeaders, ImageOptionalHeader};
use object::LittleEndian as LE;

use crate::error::{PadError, Result};
use crate::symbol::SkipReason;

/// Bytes above the image base that belong to the headers and never hold code.
pub const HEADER_RESERVED_SIZE: u64 = 0x1000;

/// Offset of the optional header magic from the start of the NT headers.
const OPTIONAL_MAGIC_OFFSET: usize = 4 + 20;

/// One entry of the section table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDescriptor {
    pub name: String,
    /// Section RVA.
    pub virtual_begin: u64,
    pub virtual_size: u64,
    /// File offset of the section data.
    pub raw_offset: u64,
    pub raw_size: u64,
}

impl SectionDescriptor {
    /// Inclusive at the upper end: an address one past the last byte still
    /// maps to this section.
    pub fn contains(&self, rva: u64) -> bool {
        self.virtual_begin <= rva && rva <= self.virtual_begin + self.virtual_size
    }
}

/// Ordered section table, read once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionTable {
    sections: Vec<SectionDescriptor>,
}

impl SectionTable {
    pub fn new(sections: Vec<SectionDescriptor>) -> Self {
        Self { sections }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionDescriptor> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// First section whose virtual range contains `rva`.
    pub fn find(&self, rva: u64) -> Option<&SectionDescriptor> {
        self.sections.iter().find(|section| section.contains(rva))
    }

    /// File offset of `rva` together with the section that maps it.
    pub fn translate(&self, rva: u64) -> Option<(u64, &SectionDescriptor)> {
        let section = self.find(rva)?;
        Some((rva - section.virtual_begin + section.raw_offset, section))
    }

    /// Converts an RVA to a file offset, or `None` if no section maps it.
    pub fn to_raw_offset(&self, rva: u64) -> Option<u64> {
        self.translate(rva).map(|(raw_offset, _)| raw_offset)
    }
}

/// Where a virtual address lands in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// File offset of the address.
    pub raw_offset: usize,
    /// Start of the containing section's data; padding never extends below it.
    pub floor: usize,
    /// Whether the address is inside the section's raw data rather than its
    /// zero-filled tail.
    pub backed: bool,
}

/// The parts of the image header the smasher needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLayout {
    pub is_64: bool,
    pub image_base: u64,
    pub sections: SectionTable,
}

impl ImageLayout {
    /// Parses the DOS, NT and section headers of a PE32 or PE32+ image.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let dos_header = pe::ImageDosHeader::parse(data).map_err(|e| PadError::format("e_magic", e))?;
        let nt_offset = dos_header.nt_headers_offset() as usize;

        let signature = data
            .get(nt_offset..nt_offset + 4)
            .ok_or_else(|| PadError::format("e_lfanew", format!("offset {nt_offset:#x} is past the end of the file")))?;
        if signature != pe::IMAGE_NT_SIGNATURE.to_le_bytes() {
            return Err(PadError::format("Signature", format!("expected PE\\0\\0, found {signature:02x?}")));
        }

        let magic_at = nt_offset + OPTIONAL_MAGIC_OFFSET;
        let magic = data
            .get(magic_at..magic_at + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .ok_or_else(|| PadError::format("OptionalHeader.Magic", "truncated optional header"))?;

        match magic {
            pe::IMAGE_NT_OPTIONAL_HDR32_MAGIC => Self::parse_with::<pe::ImageNtHeaders32>(data, nt_offset),
            pe::IMAGE_NT_OPTIONAL_HDR64_MAGIC => Self::parse_with::<pe::ImageNtHeaders64>(data, nt_offset),
            other => Err(PadError::format("OptionalHeader.Magic", format!("unknown magic {other:#x}"))),
        }
    }

    fn parse_with<Pe: ImageNtHeaders>(data: &[u8], nt_offset: usize) -> Result<Self> {
        let mut offset = nt_offset as u64;
        let (nt_headers, _) =
            Pe::parse(data, &mut offset).map_err(|e| PadError::format("SizeOfOptionalHeader", e))?;
        let file_header = nt_headers.file_header();
        let image_base = nt_headers.optional_header().image_base();
        let table = file_header
            .sections(data, offset)
            .map_err(|e| PadError::format("NumberOfSections", e))?;

        let sections: Vec<SectionDescriptor> = table
            .iter()
            .map(|section| SectionDescriptor {
                name: String::from_utf8_lossy(section.raw_name()).into_owned(),
                virtual_begin: u64::from(section.virtual_address.get(LE)),
                virtual_size: u64::from(section.virtual_size.get(LE)),
                raw_offset: u64::from(section.pointer_to_raw_data.get(LE)),
                raw_size: u64::from(section.size_of_raw_data.get(LE)),
            })
            .collect();

        for section in &sections {
            tracing::debug!(
                "Section {:<8} RVA: {:#x} Size: {:#x} Raw: {:#x}",
                section.name,
                section.virtual_begin,
                section.virtual_size,
                section.raw_offset
            );
        }

        Ok(Self {
            is_64: nt_headers.is_type_64(),
            image_base,
            sections: SectionTable::new(sections),
        })
    }

    /// Translates an absolute virtual address to its place in the file.
    pub fn place(&self, virtual_address: u64) -> std::result::Result<Placement, SkipReason> {
        if virtual_address < self.image_base.saturating_add(HEADER_RESERVED_SIZE) {
            return Err(SkipReason::ReservedHeader);
        }
        let rva = virtual_address - self.image_base;
        let (raw_offset, section) = self.sections.translate(rva).ok_or(SkipReason::Unmapped)?;
        Ok(Placement {
            raw_offset: usize::try_from(raw_offset).map_err(|_| SkipReason::Unmapped)?,
            floor: usize::try_from(section.raw_offset).map_err(|_| SkipReason::Unmapped)?,
            backed: rva - section.virtual_begin <= section.raw_size,
        })
    }
}
