//! List and unpack zip and tar archives (plain, gzip, bzip2 or xz).
//!
//! An archive with a single member is unpacked in place; one with more
//! members gets its own folder named after the archive. Every member name
//! is checked so nothing is written outside that destination.

mod adapter;
mod driver;
mod entry;
mod error;
mod extractor;
mod format;
mod lister;
mod plan;
mod prefix;
mod report;
mod sanitize;
mod text;

pub use adapter::{ArchiveHandle, Flow, Scan, TarAdapter, ZipAdapter};
pub use driver::{Action, ArchiveState, Driver, Summary};
pub use entry::{Entry, EntryKind};
pub use error::{Error, Scope};
pub use extractor::{Extractor, Outcome, Report};
pub use format::{folder_name, Format};
pub use lister::{Lister, Listing};
pub use plan::{CollisionPolicy, DestinationPolicy, ExtractionPlan};
pub use prefix::common_prefix;
pub use report::{MemoryReporter, Problem, Reporter};
pub use sanitize::{clean_name, SafePath, Sanitizer};
pub use text::{count_noun, group_thousands, plural_suffix};
