//! Data model shared by the crawler and the upstream bindings
//!
//! This module contains:
//! - Jobs, their sort order and their live counters
//! - Continuation tokens and fetched comment pages
//! - Comment and video records

mod comment;
mod job;

pub use comment::{Comment, CommentPage, ContinuationToken, Video};
pub use job::{BranchGuard, Job, SortOrder};
