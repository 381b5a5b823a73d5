//! Request extractors shared by all routes.

pub mod workspace;

pub use workspace::{WORKSPACE_HEADER, WorkspaceContext};
