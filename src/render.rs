//! Deterministic text rendering of one family tree.

use std::fmt;
use std::sync::atomic::Ordering::Acquire;

use crossbeam_epoch::{self as epoch, Guard, Shared};

use crate::node::Node;
use crate::{Family, NetTrie, Network};

struct Frame<'g, T> {
    node: Shared<'g, Node<T>>,
    indent: String,
    slot: usize,
    last: bool,
    root: bool,
}

impl<T> NetTrie<T> {
    /// Render the tree of one family as text, one line per node.
    ///
    /// Routing nodes are marked with a leading `@`, and every node except
    /// the root names the child slot it occupies in its parent. The output
    /// is deterministic and depends only on the set of stored networks.
    ///
    /// ```
    /// use net_trie::{Family, NetTrie};
    ///
    /// let mut trie: NetTrie<u32> = NetTrie::new();
    /// trie.insert("10.0.0.0/24".parse()?, 1)?;
    /// trie.insert("10.0.1.0/24".parse()?, 2)?;
    /// assert_eq!(
    ///     trie.to_text_tree(Family::V4),
    ///     "@0.0.0.0/0\n\
    ///      └──@10.0.0.0/23 [0]\n\
    ///      \u{20}\u{20}\u{20}├──10.0.0.0/24 [0]\n\
    ///      \u{20}\u{20}\u{20}└──10.0.1.0/24 [1]"
    /// );
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    pub fn to_text_tree(&self, family: Family) -> String {
        self.render(family, None)
    }

    /// Like [`NetTrie::to_text_tree`], appending `display(network, value)`
    /// to the line of every value node.
    pub fn to_text_tree_with<F>(&self, family: Family, display: F) -> String
    where
        F: Fn(&Network, &T) -> String,
    {
        self.render(family, Some(&display))
    }

    fn render(
        &self,
        family: Family,
        display: Option<&dyn Fn(&Network, &T) -> String>,
    ) -> String {
        let guard = epoch::pin();
        let mut lines = Vec::new();
        let mut stack = vec![Frame {
            node: self.root(family).load(Acquire, &guard),
            indent: String::new(),
            slot: 0,
            last: true,
            root: true,
        }];
        while let Some(frame) = stack.pop() {
            let node = unsafe { frame.node.deref() };
            lines.push(render_line(node, &frame, display, &guard));

            let child_indent = if frame.root {
                String::new()
            } else {
                let mut indent = frame.indent.clone();
                indent.push_str(if frame.last { "   " } else { "│  " });
                indent
            };
            let left = node.children[0].load(Acquire, &guard);
            let right = node.children[1].load(Acquire, &guard);
            // right child first, so the left one is emitted first
            if !right.is_null() {
                stack.push(Frame {
                    node: right,
                    indent: child_indent.clone(),
                    slot: 1,
                    last: true,
                    root: false,
                });
            }
            if !left.is_null() {
                stack.push(Frame {
                    node: left,
                    indent: child_indent,
                    slot: 0,
                    last: right.is_null(),
                    root: false,
                });
            }
        }
        lines.join("\n")
    }
}

fn render_line<T>(
    node: &Node<T>,
    frame: &Frame<'_, T>,
    display: Option<&dyn Fn(&Network, &T) -> String>,
    guard: &Guard,
) -> String {
    let mut line = String::new();
    if !frame.root {
        line.push_str(&frame.indent);
        line.push_str(if frame.last { "└──" } else { "├──" });
    }
    let value = node.load_value(guard);
    if value.is_none() {
        line.push('@');
    }
    line.push_str(&node.net.to_string());
    if !frame.root {
        line.push_str(&format!(" [{}]", frame.slot));
    }
    if let (Some(value), Some(display)) = (value, display) {
        line.push(' ');
        line.push_str(&display(&node.net, value));
    }
    line
}

impl<T> fmt::Debug for NetTrie<T> {
    /// Both family trees, rendered as text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.to_text_tree(Family::V4))?;
        write!(f, "{}", self.to_text_tree(Family::V6))
    }
}
