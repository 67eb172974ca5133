//! vpcform Core
//!
//! Provider-neutral model shared by every vpcform provider: resources and
//! their observed state, schemas, flattening helpers, the generic status
//! waiter and the named lock registry.

pub mod differ;
pub mod flatten;
pub mod lock;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod waiter;
