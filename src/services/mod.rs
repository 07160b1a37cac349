//! Orchestration services: the resolution read path and the get-or-create
//! write path.

pub mod links;
pub mod resolver;

pub use links::{CreateLinkRequest, GetOrCreateResult, LinkService};
pub use resolver::{Resolution, Resolver};
