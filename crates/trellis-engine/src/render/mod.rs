//! Renderer plumbing shared by GPU passes.
//!
//! Convention:
//! - vertex positions are uploaded in world space
//! - the caller supplies the view-projection matrix (camera math is external)

mod ctx;

pub use ctx::RenderCtx;
