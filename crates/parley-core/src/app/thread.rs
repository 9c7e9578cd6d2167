//! Conversation threading over the bus history.
//!
//! - `conversation`: 線形のスレッド。各メッセージに対して最初に見つかった返信だけを辿る
//! - `conversation_tree`: 分岐も表現できる木構造。同じ `in_reply_to` を持つ返信をすべて子にする。
//!
//! どちらも `in_reply_to` の索引を一度だけ作り、再帰せずに辿ります（長いチェーンでもスタックを使わない）。
//! 循環（自分自身への返信など）で無限ループしないよう訪問済みを記録します。

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::domain::{Envelope, MessageId};

/// parent id → reply positions in history order.
fn reply_index<E: Envelope>(history: &[E]) -> HashMap<&MessageId, Vec<usize>> {
    let mut replies: HashMap<&MessageId, Vec<usize>> = HashMap::new();
    for (i, m) in history.iter().enumerate() {
        if let Some(parent) = m.in_reply_to() {
            replies.entry(parent).or_default().push(i);
        }
    }
    replies
}

fn position<E: Envelope>(history: &[E], message_id: &MessageId) -> Option<usize> {
    history.iter().position(|m| m.message_id() == message_id)
}

/// Linear reply chain starting at `message_id`; empty when the id is unknown.
pub fn conversation<E: Envelope>(history: &[E], message_id: &MessageId) -> Vec<E> {
    let Some(start) = position(history, message_id) else {
        return Vec::new();
    };
    let replies = reply_index(history);

    let mut visited = HashSet::from([start]);
    let mut chain = vec![history[start].clone()];
    let mut current = start;
    while let Some(&next) = replies
        .get(history[current].message_id())
        .and_then(|kids| kids.iter().find(|kid| !visited.contains(*kid)))
    {
        visited.insert(next);
        chain.push(history[next].clone());
        current = next;
    }
    chain
}

/// One envelope of a [`ThreadTree`]. `parent` / `replies` are node indexes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadNode<E> {
    pub envelope: E,
    pub parent: Option<usize>,
    pub replies: Vec<usize>,
}

/// Reply tree stored flat in pre-order (parent before replies, replies in
/// history order). Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadTree<E> {
    nodes: Vec<ThreadNode<E>>,
}

impl<E> ThreadTree<E> {
    /// A tree built by [`conversation_tree`] always holds its root.
    pub fn root(&self) -> &ThreadNode<E> {
        &self.nodes[0]
    }

    pub fn node(&self, index: usize) -> Option<&ThreadNode<E>> {
        self.nodes.get(index)
    }

    /// Direct replies of node `index`.
    pub fn replies(&self, index: usize) -> impl Iterator<Item = &ThreadNode<E>> {
        self.nodes
            .get(index)
            .into_iter()
            .flat_map(|node| node.replies.iter().filter_map(|&i| self.nodes.get(i)))
    }

    pub fn nodes(&self) -> &[ThreadNode<E>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Does any node have more than one reply?
    pub fn is_branching(&self) -> bool {
        self.nodes.iter().any(|node| node.replies.len() > 1)
    }

    /// Longest root-to-leaf path, counted in envelopes.
    pub fn depth(&self) -> usize {
        // pre-order: a parent always sits before its replies
        let mut depths = vec![0usize; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            depths[i] = node.parent.map_or(1, |p| depths[p] + 1);
        }
        depths.into_iter().max().unwrap_or(0)
    }

    /// Envelopes in pre-order.
    pub fn flatten(&self) -> Vec<&E> {
        self.nodes.iter().map(|node| &node.envelope).collect()
    }
}

/// Full reply tree rooted at `message_id`.
pub fn conversation_tree<E: Envelope>(history: &[E], message_id: &MessageId) -> Option<ThreadTree<E>> {
    let root = position(history, message_id)?;
    let replies = reply_index(history);

    let mut nodes: Vec<ThreadNode<E>> = Vec::new();
    let mut visited = HashSet::new();
    // (history position, parent node)
    let mut stack: Vec<(usize, Option<usize>)> = vec![(root, None)];
    while let Some((index, parent)) = stack.pop() {
        if !visited.insert(index) {
            continue;
        }
        let node = nodes.len();
        if let Some(p) = parent {
            nodes[p].replies.push(node);
        }
        nodes.push(ThreadNode {
            envelope: history[index].clone(),
            parent,
            replies: Vec::new(),
        });
        if let Some(kids) = replies.get(history[index].message_id()) {
            stack.extend(kids.iter().rev().map(|&kid| (kid, Some(node))));
        }
    }
    Some(ThreadTree { nodes })
}
