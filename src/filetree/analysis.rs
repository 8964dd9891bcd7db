//! Ephemeral tree over the visible lines of a [`FileTree`](super::FileTree).
//!
//! Built per shrinking operation and dropped afterwards. Nodes live in an
//! arena; detaching a node only unlinks it from its parent.

/// Arena index of the synthetic root.
pub(super) const ROOT: usize = 0;

#[derive(Debug)]
pub(super) struct Node {
    /// Index into the file tree's lines, `None` for the synthetic root
    pub line: Option<usize>,
    pub depth: isize,
    pub is_dir: bool,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

#[derive(Debug)]
pub(super) struct AnalysisTree {
    nodes: Vec<Node>,
}

impl AnalysisTree {
    /// `lines` are `(line index, depth, is_dir)` in listing order.
    pub fn build(lines: impl IntoIterator<Item = (usize, usize, bool)>) -> Self {
        let mut nodes = vec![Node {
            line: None,
            depth: -1,
            is_dir: true,
            parent: None,
            children: Vec::new(),
        }];
        let mut stack = vec![ROOT];

        for (line, depth, is_dir) in lines {
            let depth = depth as isize;
            while let Some(&top) = stack.last() {
                if top != ROOT && depth <= nodes[top].depth {
                    stack.pop();
                } else {
                    break;
                }
            }
            let parent = stack.last().copied().unwrap_or(ROOT);
            let id = nodes.len();
            nodes.push(Node {
                line: Some(line),
                depth,
                is_dir,
                parent: Some(parent),
                children: Vec::new(),
            });
            nodes[parent].children.push(id);
            stack.push(id);
        }

        Self { nodes }
    }

    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    /// Attached nodes without children, excluding the synthetic root.
    pub fn leaves(&self) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.children.is_empty() {
                if id != ROOT {
                    leaves.push(id);
                }
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        leaves
    }

    /// Lines of `id` and all of its attached descendants.
    pub fn subtree_lines(&self, id: usize) -> Vec<usize> {
        let mut lines = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current];
            lines.extend(node.line);
            stack.extend(node.children.iter().copied());
        }
        lines
    }

    pub fn detach(&mut self, id: usize) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&child| child != id);
        }
    }
}
