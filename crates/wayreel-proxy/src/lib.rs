pub mod bridge;
pub mod protocol;
pub mod rewrite;

pub use bridge::{NotConfigured, ProcessProxyBridge, ProxyCollaborator, ProxyError, Result};
pub use protocol::{ProxyCommand, ProxyEvent};
