pub mod compiler;
pub mod idlist;
pub mod mux;
pub mod sidecar;

pub use compiler::{CompileError, Compiler, IdListMode, Result, Selection, TransitionOptions};
pub use idlist::{parse_id_list, IdListError};
pub use mux::{file_list_body, MuxCollaborator, MuxError, NotConfigured, Resolution, TransitionSpec};
pub use sidecar::{format_timestamp, render_sidecar, SidecarEntry};
