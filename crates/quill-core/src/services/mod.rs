//! Domain services - the components that own the platform's invariants.
//!
//! The tag ledger is the single writer of tag `post_count`; the post
//! service is the single component allowed to create, mutate, or delete
//! posts. Handlers never touch those invariants directly.

mod comments;
mod posts;
mod tag_ledger;

pub use comments::{CommentDetail, CommentService};
pub use posts::{NewPost, PostDetail, PostPatch, PostService};
pub use tag_ledger::TagLedger;

#[cfg(test)]
pub(crate) mod support;
