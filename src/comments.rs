//! Threaded comment trees.
//!
//! Comments live flat in the database with an optional parent id; the
//! API returns them nested. Tree manipulation is iterative with an
//! explicit stack, so a deeply nested thread cannot blow the call stack.

use crate::db::Comment;
use serde::Serialize;

/// A comment with its nested replies.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    /// The comment itself.
    #[serde(flatten)]
    pub comment: Comment,
    /// Direct replies, oldest first.
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Wrap a comment with no replies yet.
    pub fn new(comment: Comment) -> Self {
        Self {
            comment,
            replies: Vec::new(),
        }
    }
}

/// Insert `node` under the comment with id `parent_id`, or at the top
/// level when `parent_id` is `None`.
///
/// Returns `false` (dropping the node) when the parent is not in the
/// tree. Traversal is depth-first over an explicit stack.
pub fn insert_under_parent(
    tree: &mut Vec<CommentNode>,
    parent_id: Option<i64>,
    node: CommentNode,
) -> bool {
    try_insert(tree, parent_id, node).is_ok()
}

/// Assemble a nested tree from flat rows.
///
/// Rows must be ordered so parents precede their replies (the queries
/// order by creation time, which guarantees that). A row whose parent is
/// missing, e.g. filtered out upstream, surfaces at the top level rather
/// than being lost.
pub fn build_tree(rows: Vec<Comment>) -> Vec<CommentNode> {
    let mut tree = Vec::new();

    for comment in rows {
        let parent_id = comment.parent_id;
        if let Err(orphan) = try_insert(&mut tree, parent_id, CommentNode::new(comment)) {
            tree.push(orphan);
        }
    }

    tree
}

/// Like [`insert_under_parent`] but hands the node back on failure so
/// orphans can be re-homed.
fn try_insert(
    tree: &mut Vec<CommentNode>,
    parent_id: Option<i64>,
    node: CommentNode,
) -> Result<(), CommentNode> {
    let Some(parent_id) = parent_id else {
        tree.push(node);
        return Ok(());
    };

    let mut stack: Vec<&mut CommentNode> = tree.iter_mut().collect();

    while let Some(current) = stack.pop() {
        if current.comment.id == parent_id {
            current.replies.push(node);
            return Ok(());
        }
        stack.extend(current.replies.iter_mut());
    }

    Err(node)
}
