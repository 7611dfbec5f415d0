//! Metadata stage: what the output file says about itself.
//!
//! - [`record`]: the structured tag record.
//! - [`policy`]: pure decision of the record to write.
//! - [`detect`]: read-only scan for no-AI markers.
//! - [`codec`]: EXIF block encode/decode and container splicing.
//! - [`inspect`]: file summary used by the inspection command.

pub mod codec;
pub mod detect;
pub mod inspect;
pub mod policy;
pub mod record;

pub use codec::{read_record, read_record_strict, write_record, MetadataError};
pub use detect::{detect_no_ai_markers, MarkerReport};
pub use inspect::{inspect, InspectReport};
pub use policy::{decide, decide_detailed, Decision, FakeType, MetadataPolicy};
pub use record::{Group, MetadataRecord, TagValue};
