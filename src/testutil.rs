//! Synthetic PE images for tests.

const DOS_HEADER_SIZE: usize = 0x40;
const FILE_HEADER_SIZE: usize = 20;
const SECTION_HEADER_SIZE: usize = 40;
const FILE_ALIGNMENT: usize = 0x200;
const SECTION_ALIGNMENT: u32 = 0x1000;

fn align(value: usize, to: usize) -> usize {
    (value + to - 1) & !(to - 1)
}

fn put(buf: &mut [u8], at: usize, bytes: &[u8]) {
    buf[at..at + bytes.len()].copy_from_slice(bytes);
}

/// Builds a minimal but well-formed PE32 or PE32+ image with the given sections.
pub(crate) struct PeBuilder {
    is_64: bool,
    image_base: u64,
    sections: Vec<(String, u32, Vec<u8>)>,
    virtual_sizes: Vec<Option<u32>>,
}

impl PeBuilder {
    pub(crate) fn pe32(image_base: u32) -> Self {
        Self {
            is_64: false,
            image_base: u64::from(image_base),
            sections: Vec::new(),
            virtual_sizes: Vec::new(),
        }
    }

    pub(crate) fn pe64(image_base: u64) -> Self {
        Self {
            is_64: true,
            image_base,
            sections: Vec::new(),
            virtual_sizes: Vec::new(),
        }
    }

    pub(crate) fn section(mut self, name: &str, rva: u32, data: Vec<u8>) -> Self {
        self.sections.push((name.to_string(), rva, data));
        self.virtual_sizes.push(None);
        self
    }

    /// Overrides VirtualSize of the last section added.
    pub(crate) fn virtual_size(mut self, size: u32) -> Self {
        if let Some(last) = self.virtual_sizes.last_mut() {
            *last = Some(size);
        }
        self
    }

    fn optional_header_size(&self) -> usize {
        if self.is_64 {
            240
        } else {
            224
        }
    }

    fn headers_end(&self) -> usize {
        DOS_HEADER_SIZE
            + 4
            + FILE_HEADER_SIZE
            + self.optional_header_size()
            + SECTION_HEADER_SIZE * self.sections.len()
    }

    /// File offset where the data of section `index` is placed.
    pub(crate) fn raw_offset_of(&self, index: usize) -> usize {
        let mut offset = align(self.headers_end(), FILE_ALIGNMENT);
        for (_, _, data) in &self.sections[..index] {
            offset += align(data.len().max(1), FILE_ALIGNMENT);
        }
        offset
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let total = self.raw_offset_of(self.sections.len());
        let mut buf = vec![0u8; total];

        // DOS header
        put(&mut buf, 0, b"MZ");
        put(&mut buf, 0x3C, &(DOS_HEADER_SIZE as u32).to_le_bytes());

        // NT signature and file header
        let nt = DOS_HEADER_SIZE;
        put(&mut buf, nt, b"PE\0\0");
        let file_header = nt + 4;
        let machine: u16 = if self.is_64 { 0x8664 } else { 0x014C };
        put(&mut buf, file_header, &machine.to_le_bytes());
        put(&mut buf, file_header + 2, &(self.sections.len() as u16).to_le_bytes());
        put(&mut buf, file_header + 16, &(self.optional_header_size() as u16).to_le_bytes());
        put(&mut buf, file_header + 18, &0x0102u16.to_le_bytes());

        // Optional header, no data directories
        let optional = file_header + FILE_HEADER_SIZE;
        if self.is_64 {
            put(&mut buf, optional, &0x20Bu16.to_le_bytes());
            put(&mut buf, optional + 24, &self.image_base.to_le_bytes());
        } else {
            put(&mut buf, optional, &0x10Bu16.to_le_bytes());
            put(&mut buf, optional + 28, &(self.image_base as u32).to_le_bytes());
        }
        put(&mut buf, optional + 32, &SECTION_ALIGNMENT.to_le_bytes());
        put(&mut buf, optional + 36, &(FILE_ALIGNMENT as u32).to_le_bytes());
        put(&mut buf, optional + 60, &(self.raw_offset_of(0) as u32).to_le_bytes());

        // Section headers and data
        let mut header = optional + self.optional_header_size();
        for (index, (name, rva, data)) in self.sections.iter().enumerate() {
            let raw = self.raw_offset_of(index);
            let raw_size = align(data.len().max(1), FILE_ALIGNMENT);
            let mut raw_name = [0u8; 8];
            let len = name.len().min(8);
            raw_name[..len].copy_from_slice(&name.as_bytes()[..len]);

            put(&mut buf, header, &raw_name);
            let virtual_size = self.virtual_sizes[index].unwrap_or(data.len() as u32);
            put(&mut buf, header + 8, &virtual_size.to_le_bytes());
            put(&mut buf, header + 12, &rva.to_le_bytes());
            put(&mut buf, header + 16, &(raw_size as u32).to_le_bytes());
            put(&mut buf, header + 20, &(raw as u32).to_le_bytes());
            put(&mut buf, header + 36, &0x6000_0020u32.to_le_bytes());
            put(&mut buf, raw, data);
            header += SECTION_HEADER_SIZE;
        }

        buf
    }
}
