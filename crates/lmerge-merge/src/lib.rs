//! Merge engine for lmerge.
//!
//! Combines readers that are each sorted under the same ordering into a
//! single sorted reader, lazily: a line is only pulled from a leaf once the
//! consumer has taken the line ahead of it.
//!
//! - [`MergePair`] merges exactly two readers with one line of lookahead per side
//! - [`merge_all`] builds a balanced tree of pairs over any number of readers
//! - [`LessThan`] / [`LineOrder`] select the ordering

pub mod order;
pub mod pair;
pub mod tree;

pub use order::{lexicographic, numeric, reverse_lexicographic, LessThan, LineOrder, UnknownOrder};
pub use pair::MergePair;
pub use tree::{merge_all, merge_all_traced, tree_depth};
