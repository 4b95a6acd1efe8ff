//! Vendor firmware payload carried inside an FMP capsule image.
//!
//! The layout is the one used by Microsoft Surface firmware updates: a
//! [`VendorFirmwareHeader`] followed by one or more images, each made of a
//! [`VendorImageHeader`] and `num_chunks` chunks.

use binrw::BinRead;

use crate::{
    error::{Error, Result},
    reader::{ByteView, FixedSize},
    trace::{Describe, Trace},
    version::FirmwareVersion,
};

/// Vendor firmware header
#[derive(BinRead, Clone, Debug, PartialEq, Eq, Hash)]
#[br(little)]
pub struct VendorFirmwareHeader {
    /// Number of chunks making up each image
    #[br(pad_before = 7)]
    pub num_chunks: u16,
    /// Size of the image stream following this header
    pub payload_size: u32,
    pub firmware_version: FirmwareVersion,
}

impl FixedSize for VendorFirmwareHeader {
    const SIZE: usize = 17;
}

impl Describe for VendorFirmwareHeader {
    const NAME: &'static str = "SURFACE_FIRMWARE_HEADER";
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("NumChunks", self.num_chunks.to_string()),
            ("PayloadSize", self.payload_size.to_string()),
            ("FirmwareVersion", self.firmware_version.to_string()),
        ]
    }
}

/// Opaque header in front of every image's chunk run
#[derive(BinRead, Clone, Debug, PartialEq, Eq, Hash)]
#[br(little)]
pub struct VendorImageHeader {
    pub unknown: [u8; 16],
}

impl FixedSize for VendorImageHeader {
    const SIZE: usize = 16;
}

impl Describe for VendorImageHeader {
    const NAME: &'static str = "SURFACE_FIRMWARE_IMAGE_HEADER";
    fn fields(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

#[derive(BinRead, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[br(little)]
pub struct ChunkHeader {
    /// Position of the chunk within the reassembled image
    pub address: u32,
    pub size: u8,
}

impl FixedSize for ChunkHeader {
    const SIZE: usize = 5;
}

/// Reassembles the images stored in `region`.
///
/// Reads images until `region` is exhausted. Each image is `num_chunks`
/// chunks whose addresses must start at 0 and follow each other exactly.
pub fn reassemble(
    mut region: ByteView<'_>,
    num_chunks: u16,
    trace: &mut Trace,
) -> Result<Vec<Vec<u8>>> {
    let mut images = Vec::new();
    while !region.is_empty() {
        let header: VendorImageHeader = region.read()?;
        trace.record(region.origin(), &header);
        region = region.skip(VendorImageHeader::SIZE)?;

        let mut image = Vec::new();
        for _ in 0..num_chunks {
            let chunk: ChunkHeader = region.read()?;
            log::trace!(
                "chunk at {:#x}: address {:#x}, size {}",
                region.origin(),
                chunk.address,
                chunk.size
            );
            if u64::from(chunk.address) != image.len() as u64 {
                return Err(Error::NonConsecutiveChunk {
                    offset: region.origin(),
                    expected: image.len(),
                    found: chunk.address,
                });
            }
            let (payload, rest) = region
                .skip(ChunkHeader::SIZE)?
                .split(usize::from(chunk.size))?;
            image.extend_from_slice(payload.as_slice());
            region = rest;
        }

        log::debug!("image {} reassembled, {} bytes", images.len(), image.len());
        images.push(image);
    }
    Ok(images)
}
