//! Wire models of the VPC API
//!
//! Polymorphic payloads (rule protocols, floating IP targets, flow log
//! targets, ...) are closed enums discriminated by the API's own tag field.

mod bare_metal_server;
mod common;
mod dedicated_host;
mod floating_ip;
mod flow_log;
mod key;
mod public_gateway;
mod reserved_ip;
mod security_group;
mod share_snapshot;
mod subnet;
mod vpc;

pub use bare_metal_server::*;
pub use common::*;
pub use dedicated_host::*;
pub use floating_ip::*;
pub use flow_log::*;
pub use key::*;
pub use public_gateway::*;
pub use reserved_ip::*;
pub use security_group::*;
pub use share_snapshot::*;
pub use subnet::*;
pub use vpc::*;

/// Objects that report a lifecycle status the waiter can poll
pub trait Lifecycle {
    fn lifecycle_status(&self) -> &str;
}
