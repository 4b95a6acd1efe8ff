//! Extraction of raw firmware payloads from vendor firmware containers.
//!
//! Two formats are supported:
//!
//! * a generic nested image container, see [`unwrap_image`]
//! * UEFI firmware management capsules wrapping chunked vendor images, see
//!   [`unwrap_capsule`]
//!
//! Both decoders work on the complete file contents and only ever read
//! inside its bounds.

pub mod capsule;
mod error;
pub mod guid;
pub mod image;
pub mod reader;
mod trace;
pub mod vendor;
mod version;

pub use capsule::{unwrap_capsule, SkippedPayload, UnwrappedCapsule};
pub use error::{Error, Result, Unsupported};
pub use guid::{Guid, FIRMWARE_MANAGEMENT_CAPSULE_GUID};
pub use image::{unwrap_image, UnwrappedImage};
pub use trace::{Describe, HeaderRecord, Trace};
pub use version::FirmwareVersion;
