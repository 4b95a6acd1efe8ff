//! Generic nested firmware image container.
//!
//! A file header points at a chain of three headers, each advanced over by
//! its own declared size. The second header locates the image, which must
//! run to the end of the file.

use binrw::BinRead;

use crate::{
    error::{Error, Result},
    reader::{ByteView, FixedSize},
    trace::{Describe, Trace},
};

#[derive(BinRead, Clone, Debug, PartialEq, Eq, Hash)]
#[br(little)]
pub struct FileHeader {
    pub file_header_size: u32,
    /// Absolute offset of [`ImageHeader1`]
    #[br(pad_before = 8)]
    pub header_offset: u32,
    pub image_offset: u32,
}

impl FixedSize for FileHeader {
    const SIZE: usize = 20;
}

impl Describe for FileHeader {
    const NAME: &'static str = "IMAGE_FILE_HEADER";
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("FileHeaderSize", self.file_header_size.to_string()),
            ("HeaderStart", self.header_offset.to_string()),
            ("ImageStart", self.image_offset.to_string()),
        ]
    }
}

#[derive(BinRead, Clone, Debug, PartialEq, Eq, Hash)]
#[br(little)]
pub struct ImageHeader1 {
    pub header_size: u32,
    #[br(pad_before = 28)]
    pub header2_offset: u32,
    #[br(pad_before = 8)]
    pub header3_offset: u32,
}

impl FixedSize for ImageHeader1 {
    const SIZE: usize = 48;
}

impl Describe for ImageHeader1 {
    const NAME: &'static str = "IMAGE_HEADER1";
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("HeaderSize", self.header_size.to_string()),
            ("Header2Offset", self.header2_offset.to_string()),
            ("Header3Offset", self.header3_offset.to_string()),
        ]
    }
}

#[derive(BinRead, Clone, Debug, PartialEq, Eq, Hash)]
#[br(little)]
pub struct ImageHeader2 {
    pub header_size: u32,
    /// Absolute offset of the image
    #[br(pad_before = 20)]
    pub image_offset: u32,
    #[br(pad_before = 4)]
    pub image_size: u32,
}

impl FixedSize for ImageHeader2 {
    const SIZE: usize = 36;
}

impl Describe for ImageHeader2 {
    const NAME: &'static str = "IMAGE_HEADER2";
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("HeaderSize", self.header_size.to_string()),
            ("ImageOffset", self.image_offset.to_string()),
            ("ImageSize", self.image_size.to_string()),
        ]
    }
}

#[derive(BinRead, Clone, Debug, PartialEq, Eq, Hash)]
#[br(little)]
pub struct ImageHeader3 {
    #[br(pad_after = 20)]
    pub header_size: u32,
}

impl FixedSize for ImageHeader3 {
    const SIZE: usize = 24;
}

impl Describe for ImageHeader3 {
    const NAME: &'static str = "IMAGE_HEADER3";
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![("HeaderSize", self.header_size.to_string())]
    }
}

/// Result of [`unwrap_image`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnwrappedImage<'a> {
    pub image: &'a [u8],
    pub trace: Trace,
}

/// Extracts the image from a nested image container.
pub fn unwrap_image(data: &[u8]) -> Result<UnwrappedImage<'_>> {
    let mut trace = Trace::new();
    let file = ByteView::new(data);

    let file_header: FileHeader = file.read()?;
    trace.record(0, &file_header);
    check_header_size::<FileHeader>(file_header.file_header_size)?;

    // Unlike the inner headers, the file header is not advanced over.
    let view = file.skip(file_header.header_offset as usize)?;
    let header1: ImageHeader1 = view.read()?;
    trace.record(view.origin(), &header1);
    check_header_size::<ImageHeader1>(header1.header_size)?;

    let view = view.skip(header1.header_size as usize)?;
    let header2: ImageHeader2 = view.read()?;
    trace.record(view.origin(), &header2);
    check_header_size::<ImageHeader2>(header2.header_size)?;

    let view = view.skip(header2.header_size as usize)?;
    let header3: ImageHeader3 = view.read()?;
    trace.record(view.origin(), &header3);
    check_header_size::<ImageHeader3>(header3.header_size)?;

    let start = header2.image_offset as usize;
    let end = u64::from(header2.image_offset) + u64::from(header2.image_size);
    if end != data.len() as u64 {
        return Err(Error::ImageSizeMismatch {
            image_offset: header2.image_offset,
            image_size: header2.image_size,
            file_size: data.len(),
        });
    }

    Ok(UnwrappedImage {
        image: &data[start..],
        trace,
    })
}

fn check_header_size<H: FixedSize + Describe>(declared: u32) -> Result<()> {
    if (declared as usize) < H::SIZE {
        return Err(Error::InvalidHeaderSize {
            header: H::NAME,
            minimum: H::SIZE,
            declared,
        });
    }
    Ok(())
}
