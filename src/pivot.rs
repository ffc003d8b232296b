use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::rc::Rc;

use crate::node::{NodeArena, NodeId};

/// A position in some larger sequence, together with a value specific to that position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pivot<P, V> {
    position: P,
    pub value: V,
}

impl<P, V> Pivot<P, V> {
    pub fn new(position: P, value: V) -> Self {
        Pivot { position, value }
    }

    pub fn position(&self) -> &P {
        &self.position
    }

    pub fn into_parts(self) -> (P, V) {
        (self.position, self.value)
    }
}

impl<P: Display, V: Display> Display for Pivot<P, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.value, self.position)
    }
}

/// A pivot chain that several pivot iterators can hold at once.
///
/// Pivots inserted through any holder are visible to all of them.
pub type SharedPivots<P, V> = Rc<RefCell<PivotChain<P, V>>>;

/// A list of pivots, sorted by strictly ascending position.
#[derive(Debug, Clone)]
pub struct PivotChain<P, V> {
    nodes: NodeArena<Pivot<P, V>>,
    // First pivot ever created. Every later pivot is linked into its chain.
    anchor: Option<NodeId>,
}

impl<P, V> Default for PivotChain<P, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, V> PivotChain<P, V> {
    pub const fn new() -> Self {
        PivotChain {
            nodes: NodeArena::new(),
            anchor: None,
        }
    }

    pub fn shared() -> SharedPivots<P, V> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &Pivot<P, V> {
        &self.nodes[id]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Pivot<P, V> {
        &mut self.nodes[id]
    }

    /// The underlying nodes, for walking the chain by hand.
    pub fn nodes(&self) -> &NodeArena<Pivot<P, V>> {
        &self.nodes
    }

    /// Returns the pivot with the lowest position, if any.
    pub fn head(&self) -> Option<NodeId> {
        self.anchor.map(|anchor| self.nodes.head(anchor))
    }

    /// Iterates over every pivot, in ascending position.
    ///
    /// #   Complexity
    ///
    /// O(N) in the number of pivots, plus the walk from the first pivot created back to the
    /// head.
    pub fn iter(&self) -> impl Iterator<Item = &Pivot<P, V>> + '_ {
        self.head()
            .into_iter()
            .flat_map(move |head| self.nodes.iter(head).map(|(_, pivot)| pivot))
    }
}

impl<P: Ord, V> PivotChain<P, V> {
    /// Returns the pivot at `position`, inserting it in order if it does not exist yet.
    ///
    /// The search starts at `from` and walks towards `position`, so its cost is the number
    /// of pivots between the two rather than the length of the chain. `value` is only
    /// invoked if a new pivot is created.
    pub fn get_or_insert<F>(&mut self, from: NodeId, position: P, value: F) -> NodeId
    where
        F: FnOnce() -> V,
    {
        let node = match position.cmp(&self.nodes[from].position) {
            Ordering::Equal => return from,
            Ordering::Less => self.nodes.backtrace(from, |pivot| pivot.position <= position),
            Ordering::Greater => self.nodes.seek(from, |pivot| pivot.position >= position),
        };
        if self.nodes[node].position == position {
            return node;
        }
        self.insert_next_to(node, position, value)
    }

    /// Like [`get_or_insert`](Self::get_or_insert), for callers that may not hold a pivot
    /// yet.
    ///
    /// Without `near`, the search starts from the first pivot ever created, or the pivot
    /// becomes the first of the chain if the chain is empty.
    pub fn locate<F>(&mut self, near: Option<NodeId>, position: P, value: F) -> NodeId
    where
        F: FnOnce() -> V,
    {
        match near.or(self.anchor) {
            Some(from) => self.get_or_insert(from, position, value),
            None => {
                let node = self.nodes.insert(Pivot::new(position, value()));
                self.anchor = Some(node);
                node
            }
        }
    }

    //  Internal: `node` is the closest pivot to `position`, with a different position.
    fn insert_next_to<F>(&mut self, node: NodeId, position: P, value: F) -> NodeId
    where
        F: FnOnce() -> V,
    {
        let before = self.nodes[node].position > position;
        let pivot = self.nodes.insert(Pivot::new(position, value()));
        let linked = if before {
            self.nodes.insert_before(node, pivot)
        } else {
            self.nodes.insert_after(node, pivot)
        };
        debug_assert!(linked.is_ok(), "a new pivot cannot neighbour itself");
        pivot
    }
}
