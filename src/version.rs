use std::fmt;

use binrw::BinRead;

use crate::reader::FixedSize;

/// Vendor firmware version
///
/// # Byte format
///
/// * 1 byte: third part of version
/// * 2 bytes: second part of version
/// * 1 byte: first part of version
#[derive(BinRead, Clone, Copy, PartialEq, Eq, Hash)]
#[br(little)]
pub struct FirmwareVersion {
    c: u8,
    b: u16,
    a: u8,
}

impl FirmwareVersion {
    /// Creates a new `FirmwareVersion`.
    pub fn new(a: u8, b: u16, c: u8) -> Self {
        Self { a, b, c }
    }
    /// Returns the version parts, most significant first.
    pub fn version_parts(self) -> (u8, u16, u8) {
        (self.a, self.b, self.c)
    }
}

impl FixedSize for FirmwareVersion {
    const SIZE: usize = 4;
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b, c) = self.version_parts();
        write!(f, "{a}.{b}.{c}")
    }
}
impl fmt::Debug for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FirmwareVersion({self})")
    }
}

#[cfg(test)]
#[test]
fn test() {
    let v: FirmwareVersion = crate::reader::read_struct(&[0x05, 0x9c, 0x01, 0x07], 0).unwrap();
    assert_eq!(format!("{v:?}"), "FirmwareVersion(7.412.5)");
    assert_eq!(v.to_string(), "7.412.5");
    assert_eq!(v, FirmwareVersion::new(7, 412, 5));
    assert_eq!(crate::reader::consumed::<FirmwareVersion>(), 4);
}
