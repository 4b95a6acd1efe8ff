//! Synthetic container and capsule files.

#![allow(dead_code)]

pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::max())
        .try_init();
}

fn put(buf: &mut Vec<u8>, at: usize, bytes: &[u8]) {
    if buf.len() < at + bytes.len() {
        buf.resize(at + bytes.len(), 0);
    }
    buf[at..at + bytes.len()].copy_from_slice(bytes);
}

fn words(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn patch_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

pub fn patch_u64(buf: &mut [u8], at: usize, value: u64) {
    buf[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

const UNKNOWN: u32 = 0xaaaa_aaaa;

/// Generic nested image container.
pub struct Container {
    pub header_offset: u32,
    /// Declared sizes of the file header and headers 1 to 3
    pub sizes: [u32; 4],
    pub image: Vec<u8>,
}

impl Container {
    pub const MIN_SIZES: [u32; 4] = [20, 48, 36, 24];

    pub fn new(image: &[u8]) -> Self {
        Self {
            header_offset: 32,
            sizes: Self::MIN_SIZES,
            image: image.to_vec(),
        }
    }

    pub fn build(&self) -> Vec<u8> {
        self.build_with_image_size(self.image.len() as u32)
    }

    /// Builds the file with `image_size` declared in header 2.
    pub fn build_with_image_size(&self, image_size: u32) -> Vec<u8> {
        let advance = |level: usize| self.sizes[level].max(Self::MIN_SIZES[level]) as usize;
        let h1 = self.header_offset as usize;
        let h2 = h1 + advance(1);
        let h3 = h2 + advance(2);
        let image_offset = h3 + advance(3);

        let mut buf = Vec::new();
        put(
            &mut buf,
            0,
            &words(&[self.sizes[0], UNKNOWN, UNKNOWN, self.header_offset, image_offset as u32]),
        );
        let mut header1 = vec![self.sizes[1]];
        header1.extend([UNKNOWN; 7]);
        header1.extend([(h2 - h1) as u32, UNKNOWN, UNKNOWN, (h3 - h1) as u32]);
        put(&mut buf, h1, &words(&header1));
        let mut header2 = vec![self.sizes[2]];
        header2.extend([UNKNOWN; 5]);
        header2.extend([image_offset as u32, UNKNOWN, image_size]);
        put(&mut buf, h2, &words(&header2));
        put(&mut buf, h3, &words(&[self.sizes[3], UNKNOWN, UNKNOWN, UNKNOWN, UNKNOWN, UNKNOWN]));
        put(&mut buf, image_offset, &self.image);
        buf
    }
}

pub const FMP_GUID_BYTES: [u8; 16] = [
    0xed, 0xd5, 0xcb, 0x6d, 0x2d, 0xe8, 0x44, 0x4c, 0xbd, 0xa1, 0x71, 0x94, 0x19, 0x9a, 0xd9, 0x2a,
];

/// One FMP payload item carrying a vendor firmware blob.
#[derive(Clone)]
pub struct Item {
    pub version: u32,
    /// Length of the certificate data following the authentication header
    pub auth_len: u32,
    pub num_chunks: u16,
    /// Chunks `(address, payload)` of each image
    pub images: Vec<Vec<(u32, Vec<u8>)>>,
    /// Bytes inside the update image but past the vendor payload
    pub trailer: Vec<u8>,
    pub update_image_size: Option<u32>,
    pub payload_size: Option<u32>,
}

impl Item {
    /// An item with one image split into consecutive chunks of `sizes`.
    pub fn with_chunk_sizes(sizes: &[u8]) -> Self {
        let mut address = 0u32;
        let chunks = sizes
            .iter()
            .map(|&size| {
                let payload: Vec<u8> = (0..size).map(|i| (address as u8) ^ i).collect();
                let chunk = (address, payload);
                address += u32::from(size);
                chunk
            })
            .collect();
        Self {
            version: 2,
            auth_len: 24,
            num_chunks: sizes.len() as u16,
            images: vec![chunks],
            trailer: Vec::new(),
            update_image_size: None,
            payload_size: None,
        }
    }

    /// Concatenated chunk payloads of each image.
    pub fn expected_images(&self) -> Vec<Vec<u8>> {
        self.images
            .iter()
            .map(|chunks| chunks.iter().flat_map(|(_, p)| p.clone()).collect())
            .collect()
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        for chunks in &self.images {
            payload.extend([0x11; 16]);
            for (address, data) in chunks {
                payload.extend(address.to_le_bytes());
                payload.push(data.len() as u8);
                payload.extend(data);
            }
        }

        let mut body = Vec::new();
        body.extend(7u64.to_le_bytes());
        body.extend(self.auth_len.to_le_bytes());
        body.extend(0x0200u16.to_le_bytes());
        body.extend(0x0ef1u16.to_le_bytes());
        body.extend([0x22; 16]);
        body.extend(vec![0x33; self.auth_len as usize]);
        body.extend([0x44; 7]);
        body.extend(self.num_chunks.to_le_bytes());
        body.extend(self.payload_size.unwrap_or(payload.len() as u32).to_le_bytes());
        body.extend([3, 0x2c, 0x01, 1]);
        body.extend(payload);
        body.extend(&self.trailer);

        let mut out = Vec::new();
        out.extend(self.version.to_le_bytes());
        out.extend([0x55; 16]);
        out.push(1);
        out.extend([0; 3]);
        out.extend(self.update_image_size.unwrap_or(body.len() as u32).to_le_bytes());
        out.extend(0u32.to_le_bytes());
        out.extend(0u64.to_le_bytes());
        out.extend(body);
        out
    }
}

/// UEFI FMP capsule.
pub struct Capsule {
    pub guid: [u8; 16],
    pub header_size: u32,
    pub fmp_version: u32,
    pub embedded_driver_count: u16,
    pub items: Vec<Item>,
    pub capsule_image_size: Option<u32>,
}

impl Capsule {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            guid: FMP_GUID_BYTES,
            header_size: 28,
            fmp_version: 1,
            embedded_driver_count: 0,
            items,
            capsule_image_size: None,
        }
    }

    /// Absolute offset of the FMP capsule header.
    pub fn fmp_offset(&self) -> usize {
        self.header_size.max(28) as usize
    }

    /// Absolute offset of the offset table entry for item `index`.
    pub fn item_entry_offset(&self, index: usize) -> usize {
        self.fmp_offset() + 8 + (usize::from(self.embedded_driver_count) + index) * 8
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        put(&mut buf, 0, &self.guid);
        put(&mut buf, 16, &words(&[self.header_size, 0x0005_0000, 0]));

        let fmp = self.fmp_offset();
        let mut fmp_header = self.fmp_version.to_le_bytes().to_vec();
        fmp_header.extend(self.embedded_driver_count.to_le_bytes());
        fmp_header.extend((self.items.len() as u16).to_le_bytes());
        put(&mut buf, fmp, &fmp_header);

        let mut next = self.item_entry_offset(self.items.len());
        for (index, item) in self.items.iter().enumerate() {
            let bytes = item.bytes();
            put(&mut buf, self.item_entry_offset(index), &((next - fmp) as u64).to_le_bytes());
            put(&mut buf, next, &bytes);
            next += bytes.len();
        }
        if buf.len() < next {
            buf.resize(next, 0);
        }

        let size = self.capsule_image_size.unwrap_or(buf.len() as u32);
        patch_u32(&mut buf, 24, size);
        buf
    }
}
