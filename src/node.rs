use std::iter::FusedIterator;
use std::ops::{Index, IndexMut};

use crate::error::{Error, Result};

/// Handle to a node stored in a [`NodeArena`].
///
/// Handles are only meaningful for the arena that issued them. Using a handle with another
/// arena either refers to an unrelated node or panics on the out-of-range access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Slot<T> {
    next: Option<NodeId>,
    // Non-owning; every slot is owned by the arena.
    previous: Option<NodeId>,
    payload: T,
}

/// Storage for doubly-linked nodes.
///
/// The arena does not impose a single list: it may hold any number of independent chains,
/// and a freshly inserted node is a chain of its own until it is linked next to another
/// one. Payload is composed into each node, so `NodeArena<()>` is a plain value-less list.
///
/// ```
/// use pivoting::node::link;
///
/// let (nodes, head) = link([1, 2, 3]);
/// let head = head.unwrap();
/// let values: Vec<_> = nodes.iter(head).map(|(_, v)| *v).collect();
/// assert_eq!(values, [1, 2, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct NodeArena<T> {
    slots: Vec<Slot<T>>,
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeArena<T> {
    pub const fn new() -> Self {
        NodeArena { slots: Vec::new() }
    }

    /// Number of nodes in the arena, across all chains.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Creates a detached node holding `payload`.
    pub fn insert(&mut self, payload: T) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            next: None,
            previous: None,
            payload,
        });
        id
    }

    pub fn get(&self, id: NodeId) -> &T {
        &self.slots[id.0].payload
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.slots[id.0].payload
    }

    /// Returns the node after `id`.
    pub fn next(&self, id: NodeId) -> Result<NodeId> {
        self.slots[id.0].next.ok_or(Error::NoNextNode)
    }

    /// Returns the node before `id`.
    pub fn previous(&self, id: NodeId) -> Result<NodeId> {
        self.slots[id.0].previous.ok_or(Error::NoPreviousNode)
    }

    pub fn is_head(&self, id: NodeId) -> bool {
        self.slots[id.0].previous.is_none()
    }

    pub fn is_tail(&self, id: NodeId) -> bool {
        self.slots[id.0].next.is_none()
    }

    /// Links `node` directly after `this`.
    ///
    /// If `node` already belongs to a chain it is first spliced out of it, so the links of
    /// its former neighbours stay consistent.
    pub fn insert_after(&mut self, this: NodeId, node: NodeId) -> Result<()> {
        if this == node {
            return Err(Error::SelfInsertion);
        }
        self.detach(node);
        let next = self.slots[this.0].next;
        if let Some(next) = next {
            self.slots[next.0].previous = Some(node);
        }
        let slot = &mut self.slots[node.0];
        slot.next = next;
        slot.previous = Some(this);
        self.slots[this.0].next = Some(node);
        Ok(())
    }

    /// Links `node` directly before `this`.
    ///
    /// If `node` already belongs to a chain it is first spliced out of it.
    pub fn insert_before(&mut self, this: NodeId, node: NodeId) -> Result<()> {
        if this == node {
            return Err(Error::SelfInsertion);
        }
        self.detach(node);
        let previous = self.slots[this.0].previous;
        if let Some(previous) = previous {
            self.slots[previous.0].next = Some(node);
        }
        let slot = &mut self.slots[node.0];
        slot.previous = previous;
        slot.next = Some(this);
        self.slots[this.0].previous = Some(node);
        Ok(())
    }

    /// Returns the first node of the chain containing `id`.
    ///
    /// #   Complexity
    ///
    /// O(N) in the distance between `id` and the head.
    pub fn head(&self, id: NodeId) -> NodeId {
        self.backtrace(id, |_| false)
    }

    /// Returns the last node of the chain containing `id`.
    pub fn tail(&self, id: NodeId) -> NodeId {
        self.seek(id, |_| false)
    }

    /// Returns the first node from `id` onwards (inclusive) whose payload satisfies
    /// `predicate`, or the tail if there is none.
    pub fn seek<F>(&self, id: NodeId, mut predicate: F) -> NodeId
    where
        F: FnMut(&T) -> bool,
    {
        let mut tail = id;
        for (node, payload) in self.iter(id) {
            if predicate(payload) {
                return node;
            }
            tail = node;
        }
        tail
    }

    /// Returns the first node from `id` backwards (inclusive) whose payload satisfies
    /// `predicate`, or the head if there is none.
    pub fn backtrace<F>(&self, id: NodeId, mut predicate: F) -> NodeId
    where
        F: FnMut(&T) -> bool,
    {
        let mut head = id;
        for (node, payload) in self.iter_rev(id) {
            if predicate(payload) {
                return node;
            }
            head = node;
        }
        head
    }

    /// Iterates from `id` (inclusive) to the tail of its chain.
    pub fn iter(&self, id: NodeId) -> Iter<'_, T> {
        Iter {
            arena: self,
            node: Some(id),
            forward: true,
        }
    }

    /// Iterates from `id` (inclusive) back to the head of its chain.
    pub fn iter_rev(&self, id: NodeId) -> Iter<'_, T> {
        Iter {
            arena: self,
            node: Some(id),
            forward: false,
        }
    }

    /// Collects the whole chain containing `id`, head to tail.
    pub fn to_vec(&self, id: NodeId) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.iter_rev(id).map(|(node, _)| node).collect();
        nodes.reverse();
        if let Some(next) = self.slots[id.0].next {
            nodes.extend(self.iter(next).map(|(node, _)| node));
        }
        nodes
    }

    //  Internal: splices `node` out of its chain, joining its neighbours.
    fn detach(&mut self, node: NodeId) {
        let next = self.slots[node.0].next;
        let previous = self.slots[node.0].previous;
        if let Some(previous) = previous {
            self.slots[previous.0].next = next;
        }
        if let Some(next) = next {
            self.slots[next.0].previous = previous;
        }
        let slot = &mut self.slots[node.0];
        slot.next = None;
        slot.previous = None;
    }
}

impl<T> Index<NodeId> for NodeArena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        self.get(id)
    }
}

impl<T> IndexMut<NodeId> for NodeArena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        self.get_mut(id)
    }
}

/// Iterator over a chain of nodes, in either direction.
pub struct Iter<'a, T> {
    arena: &'a NodeArena<T>,
    node: Option<NodeId>,
    forward: bool,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.node?;
        let slot = &self.arena.slots[node.0];
        self.node = if self.forward { slot.next } else { slot.previous };
        Some((node, &slot.payload))
    }
}

impl<'a, T> FusedIterator for Iter<'a, T> {}

/// Creates an arena holding one chain made of `payloads`, in order.
///
/// Returns the arena and the head of the chain, if `payloads` was not empty.
pub fn link<T, I>(payloads: I) -> (NodeArena<T>, Option<NodeId>)
where
    I: IntoIterator<Item = T>,
{
    let mut arena = NodeArena::new();
    let mut head = None;
    let mut current: Option<NodeId> = None;
    for payload in payloads {
        let node = arena.insert(payload);
        match current {
            Some(current) => {
                let linked = arena.insert_after(current, node);
                debug_assert!(linked.is_ok(), "a new node cannot neighbour itself");
            }
            None => head = Some(node),
        }
        current = Some(node);
    }
    (arena, head)
}
