pub mod approver;
pub mod error;
pub mod review;

pub use approver::{Approver, IterationOutcome};
pub use error::{ApproveError, Result};
pub use review::{capture_file_present, NotConfigured, ReviewCollaborator, ReviewError, SensitivityVerdict};
