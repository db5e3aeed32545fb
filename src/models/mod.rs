pub mod record;
pub mod result;
pub mod status;
pub mod step;

pub use record::{Attachment, TestCaseRecord};
pub use result::RunSummary;
pub use status::Status;
pub use step::Step;
