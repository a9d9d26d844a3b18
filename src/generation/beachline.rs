//! Arena-backed red-black tree with in-order neighbour links
//!
//! The sweep keeps its beachline arcs here. Nodes are never reused after
//! removal, so a [`NodeId`] stays a valid handle to the node's payload for
//! the whole sweep even once the node has left the tree. Ordering is purely
//! positional: callers insert relative to an existing node, there is no key
//! comparison.

/// Handle to a node in a [`RbArena`]
pub(crate) type NodeId = usize;

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    red: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RbArena<T> {
    nodes: Vec<Node<T>>,
    root: Option<NodeId>,
}

impl<T> Default for RbArena<T> {
    fn default() -> Self {
        Self { nodes: Vec::new(), root: None }
    }
}

impl<T> RbArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[inline]
    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].left
    }

    #[inline]
    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].right
    }

    #[inline]
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].prev
    }

    #[inline]
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].next
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &T {
        &self.nodes[id].value
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.nodes[id].value
    }

    /// Leftmost node of the whole tree
    pub fn first(&self) -> Option<NodeId> {
        self.root.map(|root| self.leftmost(root))
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.nodes[id].left {
            id = left;
        }
        id
    }

    #[inline]
    fn is_red(&self, id: Option<NodeId>) -> bool {
        id.is_some_and(|id| self.nodes[id].red)
    }

    fn set_black(&mut self, id: Option<NodeId>) {
        if let Some(id) = id {
            self.nodes[id].red = false;
        }
    }

    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            Some(p) if self.nodes[p].left == Some(old) => self.nodes[p].left = new,
            Some(p) => self.nodes[p].right = new,
            None => self.root = new,
        }
    }

    /// Insert `value` directly after `anchor` in order, or first when `anchor` is `None`
    pub fn insert_after(&mut self, anchor: Option<NodeId>, value: T) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            value,
            parent: None,
            left: None,
            right: None,
            prev: None,
            next: None,
            red: true,
        });

        let mut parent = match anchor {
            Some(node) => {
                let following = self.nodes[node].next;
                self.nodes[id].prev = Some(node);
                self.nodes[id].next = following;
                if let Some(following) = following {
                    self.nodes[following].prev = Some(id);
                }
                self.nodes[node].next = Some(id);

                match self.nodes[node].right {
                    Some(right) => {
                        let slot = self.leftmost(right);
                        self.nodes[slot].left = Some(id);
                        Some(slot)
                    }
                    None => {
                        self.nodes[node].right = Some(id);
                        Some(node)
                    }
                }
            }
            None => match self.first() {
                Some(first) => {
                    self.nodes[id].next = Some(first);
                    self.nodes[first].prev = Some(id);
                    self.nodes[first].left = Some(id);
                    Some(first)
                }
                None => {
                    self.root = Some(id);
                    None
                }
            },
        };
        self.nodes[id].parent = parent;

        let mut node = id;
        while let Some(mut p) = parent {
            if !self.nodes[p].red {
                break;
            }
            let Some(grandpa) = self.nodes[p].parent else {
                break;
            };
            if self.nodes[grandpa].left == Some(p) {
                let uncle = self.nodes[grandpa].right;
                if self.is_red(uncle) {
                    self.nodes[p].red = false;
                    self.set_black(uncle);
                    self.nodes[grandpa].red = true;
                    node = grandpa;
                } else {
                    if self.nodes[p].right == Some(node) {
                        self.rotate_left(p);
                        node = p;
                        p = self.nodes[node].parent.unwrap_or(p);
                    }
                    self.nodes[p].red = false;
                    self.nodes[grandpa].red = true;
                    self.rotate_right(grandpa);
                }
            } else {
                let uncle = self.nodes[grandpa].left;
                if self.is_red(uncle) {
                    self.nodes[p].red = false;
                    self.set_black(uncle);
                    self.nodes[grandpa].red = true;
                    node = grandpa;
                } else {
                    if self.nodes[p].left == Some(node) {
                        self.rotate_right(p);
                        node = p;
                        p = self.nodes[node].parent.unwrap_or(p);
                    }
                    self.nodes[p].red = false;
                    self.nodes[grandpa].red = true;
                    self.rotate_left(grandpa);
                }
            }
            parent = self.nodes[node].parent;
        }
        self.set_black(self.root);

        id
    }

    /// Unlink `id` from the tree; its payload stays readable
    pub fn remove(&mut self, id: NodeId) {
        let (prev, next) = (self.nodes[id].prev, self.nodes[id].next);
        if let Some(next) = next {
            self.nodes[next].prev = prev;
        }
        if let Some(prev) = prev {
            self.nodes[prev].next = next;
        }
        self.nodes[id].prev = None;
        self.nodes[id].next = None;

        let mut parent = self.nodes[id].parent;
        let left = self.nodes[id].left;
        let right = self.nodes[id].right;
        let successor = match (left, right) {
            (None, _) => right,
            (_, None) => left,
            (Some(_), Some(r)) => Some(self.leftmost(r)),
        };
        self.replace_child(parent, id, successor);

        let removed_red;
        let mut node;
        match (left, right, successor) {
            (Some(l), Some(r), Some(s)) => {
                removed_red = self.nodes[s].red;
                self.nodes[s].red = self.nodes[id].red;
                self.nodes[s].left = Some(l);
                self.nodes[l].parent = Some(s);
                if s != r {
                    parent = self.nodes[s].parent;
                    self.nodes[s].parent = self.nodes[id].parent;
                    node = self.nodes[s].right;
                    if let Some(p) = parent {
                        self.nodes[p].left = node;
                    }
                    self.nodes[s].right = Some(r);
                    self.nodes[r].parent = Some(s);
                } else {
                    self.nodes[s].parent = parent;
                    parent = Some(s);
                    node = self.nodes[s].right;
                }
            }
            _ => {
                removed_red = self.nodes[id].red;
                node = successor;
            }
        }
        if let Some(n) = node {
            self.nodes[n].parent = parent;
        }
        self.nodes[id].parent = None;
        self.nodes[id].left = None;
        self.nodes[id].right = None;

        if removed_red {
            return;
        }
        if self.is_red(node) {
            self.set_black(node);
            return;
        }

        loop {
            if node == self.root {
                break;
            }
            let Some(p) = parent else {
                break;
            };
            if node == self.nodes[p].left {
                let Some(mut sibling) = self.nodes[p].right else {
                    break;
                };
                if self.nodes[sibling].red {
                    self.nodes[sibling].red = false;
                    self.nodes[p].red = true;
                    self.rotate_left(p);
                    let Some(s) = self.nodes[p].right else {
                        break;
                    };
                    sibling = s;
                }
                let (near, far) = (self.nodes[sibling].left, self.nodes[sibling].right);
                if self.is_red(near) || self.is_red(far) {
                    if !self.is_red(far) {
                        self.set_black(near);
                        self.nodes[sibling].red = true;
                        self.rotate_right(sibling);
                        let Some(s) = self.nodes[p].right else {
                            break;
                        };
                        sibling = s;
                    }
                    self.nodes[sibling].red = self.nodes[p].red;
                    self.nodes[p].red = false;
                    self.set_black(self.nodes[sibling].right);
                    self.rotate_left(p);
                    node = self.root;
                    break;
                }
                self.nodes[sibling].red = true;
            } else {
                let Some(mut sibling) = self.nodes[p].left else {
                    break;
                };
                if self.nodes[sibling].red {
                    self.nodes[sibling].red = false;
                    self.nodes[p].red = true;
                    self.rotate_right(p);
                    let Some(s) = self.nodes[p].left else {
                        break;
                    };
                    sibling = s;
                }
                let (near, far) = (self.nodes[sibling].right, self.nodes[sibling].left);
                if self.is_red(near) || self.is_red(far) {
                    if !self.is_red(far) {
                        self.set_black(near);
                        self.nodes[sibling].red = true;
                        self.rotate_left(sibling);
                        let Some(s) = self.nodes[p].left else {
                            break;
                        };
                        sibling = s;
                    }
                    self.nodes[sibling].red = self.nodes[p].red;
                    self.nodes[p].red = false;
                    self.set_black(self.nodes[sibling].left);
                    self.rotate_right(p);
                    node = self.root;
                    break;
                }
                self.nodes[sibling].red = true;
            }
            node = Some(p);
            parent = self.nodes[p].parent;
            if self.nodes[p].red {
                break;
            }
        }
        self.set_black(node);
    }

    fn rotate_left(&mut self, p: NodeId) {
        let Some(q) = self.nodes[p].right else {
            return;
        };
        let parent = self.nodes[p].parent;
        self.replace_child(parent, p, Some(q));
        self.nodes[q].parent = parent;
        self.nodes[p].parent = Some(q);
        self.nodes[p].right = self.nodes[q].left;
        if let Some(moved) = self.nodes[p].right {
            self.nodes[moved].parent = Some(p);
        }
        self.nodes[q].left = Some(p);
    }

    fn rotate_right(&mut self, p: NodeId) {
        let Some(q) = self.nodes[p].left else {
            return;
        };
        let parent = self.nodes[p].parent;
        self.replace_child(parent, p, Some(q));
        self.nodes[q].parent = parent;
        self.nodes[p].parent = Some(q);
        self.nodes[p].left = self.nodes[q].right;
        if let Some(moved) = self.nodes[p].left {
            self.nodes[moved].parent = Some(p);
        }
        self.nodes[q].right = Some(p);
    }
}
