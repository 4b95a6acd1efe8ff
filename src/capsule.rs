//! UEFI firmware management (FMP) capsules carrying vendor chunked images.
//!
//! ```text
//! EFI_CAPSULE_HEADER
//! EFI_FIRMWARE_MANAGEMENT_CAPSULE_HEADER    <- offsets below are relative to this
//! u64 ItemOffsetList[EmbeddedDriverCount + PayloadItemCount]
//! ...
//! per payload item:
//!   EFI_FIRMWARE_MANAGEMENT_CAPSULE_IMAGE_HEADER
//!   EFI_FIRMWARE_IMAGE_AUTHENTICATION + certificate data
//!   vendor firmware header + images (see `vendor`)
//! ```

use binrw::BinRead;

use crate::{
    error::{Error, Result, Unsupported},
    guid::{Guid, FIRMWARE_MANAGEMENT_CAPSULE_GUID},
    reader::{ByteView, FixedSize},
    trace::{Describe, Trace},
    vendor::{reassemble, VendorFirmwareHeader},
};

const FMP_CAPSULE_VERSION: u32 = 1;
const FMP_IMAGE_VERSION: u32 = 2;

/// `EFI_CAPSULE_HEADER`
#[derive(BinRead, Clone, Debug, PartialEq, Eq, Hash)]
#[br(little)]
pub struct CapsuleHeader {
    pub capsule_guid: Guid,
    pub header_size: u32,
    pub flags: u32,
    /// Size of the whole capsule, including this header
    pub capsule_image_size: u32,
}

impl FixedSize for CapsuleHeader {
    const SIZE: usize = 28;
}

impl Describe for CapsuleHeader {
    const NAME: &'static str = "EFI_CAPSULE_HEADER";
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("CapsuleGuid", self.capsule_guid.to_string()),
            ("HeaderSize", self.header_size.to_string()),
            ("Flags", format!("{:08x}h", self.flags)),
            ("CapsuleImageSize", self.capsule_image_size.to_string()),
        ]
    }
}

/// `EFI_FIRMWARE_MANAGEMENT_CAPSULE_HEADER`
#[derive(BinRead, Clone, Debug, PartialEq, Eq, Hash)]
#[br(little)]
pub struct FmpCapsuleHeader {
    pub version: u32,
    pub embedded_driver_count: u16,
    pub payload_item_count: u16,
}

impl FmpCapsuleHeader {
    /// Offset of the entry for payload item `index` in the offset table.
    fn item_offset_position(&self, index: u16) -> usize {
        let entries = usize::from(self.embedded_driver_count) + usize::from(index);
        Self::SIZE + entries * <u64 as FixedSize>::SIZE
    }
    /// Smallest offset that lies past the header and the whole offset table.
    pub fn min_item_offset(&self) -> usize {
        self.item_offset_position(self.payload_item_count)
    }
}

impl FixedSize for FmpCapsuleHeader {
    const SIZE: usize = 8;
}

impl Describe for FmpCapsuleHeader {
    const NAME: &'static str = "EFI_FIRMWARE_MANAGEMENT_CAPSULE_HEADER";
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Version", self.version.to_string()),
            ("EmbeddedDriverCount", self.embedded_driver_count.to_string()),
            ("PayloadItemCount", self.payload_item_count.to_string()),
        ]
    }
}

/// `EFI_FIRMWARE_MANAGEMENT_CAPSULE_IMAGE_HEADER`, version 2 layout
#[derive(BinRead, Clone, Debug, PartialEq, Eq, Hash)]
#[br(little)]
pub struct FmpImageHeader {
    pub version: u32,
    pub update_image_type_id: Guid,
    #[br(pad_after = 3)]
    pub update_image_index: u8,
    /// Size of the image following this header
    pub update_image_size: u32,
    pub update_vendor_code_size: u32,
    pub update_hardware_instance: u64,
}

impl FixedSize for FmpImageHeader {
    const SIZE: usize = 40;
}

impl Describe for FmpImageHeader {
    const NAME: &'static str = "EFI_FIRMWARE_MANAGEMENT_CAPSULE_IMAGE_HEADER";
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Version", self.version.to_string()),
            ("UpdateImageTypeId", self.update_image_type_id.to_string()),
            ("UpdateImageIndex", self.update_image_index.to_string()),
            ("UpdateImageSize", self.update_image_size.to_string()),
            ("UpdateVendorCodeSize", self.update_vendor_code_size.to_string()),
            (
                "UpdateHardwareInstance",
                self.update_hardware_instance.to_string(),
            ),
        ]
    }
}

/// `WIN_CERTIFICATE`
#[derive(BinRead, Clone, Debug, PartialEq, Eq, Hash)]
#[br(little)]
pub struct WinCertificate {
    pub length: u32,
    pub revision: u16,
    pub certificate_type: u16,
}

/// `EFI_FIRMWARE_IMAGE_AUTHENTICATION` without its certificate data
///
/// The certificate itself is skipped, never verified.
#[derive(BinRead, Clone, Debug, PartialEq, Eq, Hash)]
#[br(little)]
pub struct FirmwareImageAuthentication {
    pub monotonic_count: u64,
    pub hdr: WinCertificate,
    pub cert_type: Guid,
}

impl FixedSize for FirmwareImageAuthentication {
    const SIZE: usize = 32;
}

impl Describe for FirmwareImageAuthentication {
    const NAME: &'static str = "EFI_FIRMWARE_IMAGE_AUTHENTICATION";
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("MonotonicCount", self.monotonic_count.to_string()),
            ("dwLength", self.hdr.length.to_string()),
            ("wRevision", self.hdr.revision.to_string()),
            ("wCertificateType", self.hdr.certificate_type.to_string()),
            ("CertType", self.cert_type.to_string()),
        ]
    }
}

/// A payload item left out because of its image header version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkippedPayload {
    pub index: u16,
    pub version: u32,
}

/// Result of [`unwrap_capsule`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnwrappedCapsule {
    /// Reassembled images of all accepted payload items, in file order
    pub images: Vec<Vec<u8>>,
    pub skipped: Vec<SkippedPayload>,
    pub trace: Trace,
}

/// Extracts the vendor firmware images from an FMP capsule.
///
/// Payload items with an unsupported image header version are skipped and
/// listed in [`UnwrappedCapsule::skipped`]. Any other inconsistency aborts
/// the whole capsule.
pub fn unwrap_capsule(data: &[u8]) -> Result<UnwrappedCapsule> {
    let mut out = UnwrappedCapsule::default();
    let capsule = ByteView::new(data);

    let header: CapsuleHeader = capsule.read()?;
    out.trace.record(0, &header);
    if header.capsule_image_size as usize != data.len() {
        return Err(Error::SizeMismatch {
            declared: header.capsule_image_size,
            actual: data.len(),
        });
    }
    if (header.header_size as usize) < CapsuleHeader::SIZE {
        return Err(Error::InvalidHeaderSize {
            header: CapsuleHeader::NAME,
            minimum: CapsuleHeader::SIZE,
            declared: header.header_size,
        });
    }
    if header.capsule_guid != FIRMWARE_MANAGEMENT_CAPSULE_GUID {
        return Err(Unsupported::Guid {
            expected: FIRMWARE_MANAGEMENT_CAPSULE_GUID,
            found: header.capsule_guid,
        }
        .into());
    }

    let fmp = capsule.skip(header.header_size as usize)?;
    let fmp_header: FmpCapsuleHeader = fmp.read()?;
    out.trace.record(fmp.origin(), &fmp_header);
    if fmp_header.version != FMP_CAPSULE_VERSION {
        return Err(Unsupported::Version {
            expected: FMP_CAPSULE_VERSION,
            found: fmp_header.version,
        }
        .into());
    }

    let min_offset = fmp_header.min_item_offset();
    for index in 0..fmp_header.payload_item_count {
        let offset: u64 = fmp.read_at(fmp_header.item_offset_position(index))?;
        if offset < min_offset as u64 {
            return Err(Error::InvalidOffset {
                index,
                offset,
                minimum: min_offset,
            });
        }
        let item = fmp.skip(usize::try_from(offset).unwrap_or(usize::MAX))?;
        match unwrap_payload(item, &mut out.trace)? {
            Payload::Images(images) => out.images.extend(images),
            Payload::Skipped { version } => {
                log::warn!(
                    "payload item {index}: unsupported image header version, expected {FMP_IMAGE_VERSION}, got {version}, skipping"
                );
                out.skipped.push(SkippedPayload { index, version });
            }
        }
    }

    Ok(out)
}

enum Payload {
    Images(Vec<Vec<u8>>),
    Skipped { version: u32 },
}

/// Decodes one payload item starting at its image header.
fn unwrap_payload(item: ByteView<'_>, trace: &mut Trace) -> Result<Payload> {
    let header: FmpImageHeader = item.read()?;
    trace.record(item.origin(), &header);
    if header.version != FMP_IMAGE_VERSION {
        return Ok(Payload::Skipped {
            version: header.version,
        });
    }

    let available = item.len() - FmpImageHeader::SIZE;
    if header.update_image_size as usize > available {
        return Err(Error::OversizedImage {
            declared: header.update_image_size,
            available,
        });
    }
    let region = item
        .skip(FmpImageHeader::SIZE)?
        .truncate(header.update_image_size as usize)?;

    let auth: FirmwareImageAuthentication = region.read()?;
    trace.record(region.origin(), &auth);
    let region = region
        .skip(FirmwareImageAuthentication::SIZE)?
        .skip(auth.hdr.length as usize)?;

    let vendor: VendorFirmwareHeader = region.read()?;
    trace.record(region.origin(), &vendor);
    let available = region.len() - VendorFirmwareHeader::SIZE;
    if vendor.payload_size as usize > available {
        return Err(Error::OversizedPayload {
            declared: vendor.payload_size,
            available,
        });
    }
    let region = region
        .skip(VendorFirmwareHeader::SIZE)?
        .truncate(vendor.payload_size as usize)?;

    reassemble(region, vendor.num_chunks, trace).map(Payload::Images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::consumed;

    #[test]
    fn layout() {
        assert_eq!(consumed::<CapsuleHeader>(), 28);
        assert_eq!(consumed::<FmpCapsuleHeader>(), 8);
        assert_eq!(consumed::<FmpImageHeader>(), 40);
        assert_eq!(consumed::<FirmwareImageAuthentication>(), 32);
    }

    #[test]
    fn offset_table_positions() {
        let hdr = FmpCapsuleHeader {
            version: 1,
            embedded_driver_count: 2,
            payload_item_count: 3,
        };
        assert_eq!(hdr.item_offset_position(0), 8 + 2 * 8);
        assert_eq!(hdr.item_offset_position(2), 8 + 4 * 8);
        assert_eq!(hdr.min_item_offset(), 8 + 5 * 8);
    }

    #[test]
    fn flags_render_as_hex() {
        let hdr = CapsuleHeader {
            capsule_guid: FIRMWARE_MANAGEMENT_CAPSULE_GUID,
            header_size: 28,
            flags: 0x50000,
            capsule_image_size: 100,
        };
        let mut trace = Trace::new();
        trace.record(0, &hdr);
        assert_eq!(trace.records()[0].field("Flags"), Some("00050000h"));
    }
}
