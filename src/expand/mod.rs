//! Deferred expansion of partial trees
//!
//! Some sources return a reply tree with placeholders ("stubs") for omitted
//! subtrees. [`DeferredExpansion`] yields every real record of such a tree,
//! fetching each placeholder's subtree exactly once.
//!
//! Failure policy: an expansion failure is skipped only when
//! `skip_inner_errors` is set and the failure is recoverable. Anything else
//! is fatal for the whole traversal, since a partial reply tree is
//! incomplete data.

mod traversal;
mod tree;

pub use traversal::{DeferredExpansion, ExpansionPhase, DEFAULT_CHUNK_SIZE};
pub use tree::{ListingTree, Node, Stub, TreeAdapter, TreeConfig};
