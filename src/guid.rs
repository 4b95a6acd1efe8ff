use std::fmt;

use binrw::BinRead;

use crate::reader::FixedSize;

/// EFI GUID in its mixed-endian on-disk form
///
/// The first three fields are little-endian integers, the last eight bytes
/// are stored as-is.
#[derive(BinRead, Clone, Copy, PartialEq, Eq, Hash)]
#[br(little)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

/// `EFI_FIRMWARE_MANAGEMENT_CAPSULE_ID_GUID`
pub const FIRMWARE_MANAGEMENT_CAPSULE_GUID: Guid = Guid::new(
    0x6dcbd5ed,
    0xe82d,
    0x4c44,
    [0xbd, 0xa1, 0x71, 0x94, 0x19, 0x9a, 0xd9, 0x2a],
);

impl Guid {
    /// Creates a new `Guid` from its four fields.
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }
}

impl FixedSize for Guid {
    const SIZE: usize = 16;
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.data4;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}
impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({self})")
    }
}
