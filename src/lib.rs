pub mod error;
pub mod digest;
pub mod record;
pub mod meta;
pub mod writer;
pub mod reader;

pub use error::{BaleError, ChecksumError, FormatError, IoError, Result};
pub use record::{MemberFooter, MemberHeader};
pub use writer::BaleWriter;
pub use reader::{BaleReader, DataRegion, Input, MemberVisitor};
