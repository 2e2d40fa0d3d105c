pub mod backend;
pub mod body;
pub mod media;
pub mod publisher;

pub use backend::{segment_boundaries, BackendError, NotConfigured, PostResult, SocialBackend};
pub use body::{short_date, status_body, truncate_title, wayback_url, PLUGIN_EMOJI};
pub use media::MediaCollaborator;
pub use media::NotConfigured as NotConfiguredMedia;
pub use publisher::{IterationOutcome, PublishError, Publisher};
