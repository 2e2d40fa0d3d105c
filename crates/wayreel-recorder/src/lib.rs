pub mod backfill;
pub mod collaborators;
pub mod crash_timer;
pub mod error;
pub mod recorder;
pub mod redirect;

pub use collaborators::{
    AudioProbe, CaptureCollaborator, CaptureResult, CollaboratorError, MediaProbe, NotConfiguredCapture,
    NotConfiguredSpeech, NotConfiguredTranscode, SpeechCollaborator, TranscodeCollaborator,
};
pub use crash_timer::{PluginCrashTimer, PluginKiller};
pub use crash_timer::NotConfigured as NotConfiguredPluginKiller;
pub use error::{RecorderError, Result};
pub use recorder::{IterationOutcome, Recorder, RecorderTiming};
pub use redirect::{is_redirected, ObservedNavigation};
