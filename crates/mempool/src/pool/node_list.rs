//! Address-ordered node list
//!
//! The pool buffer is partitioned into contiguous allocated and free
//! extents. Each extent is a [`Node`] living in a slot of a
//! [`GrowableArray`]; `prev`/`next` are slot indices forming a doubly
//! linked list in ascending offset order. Slots released by coalescing go
//! to an explicit free list and are reused LIFO.
//!
//! Node lifecycle:
//! `vacant -> gap -> allocated -> gap -> vacant`. A node becomes a gap on
//! open, as a split remainder or as a merge survivor, becomes allocated
//! when a split hands it out, and returns to vacant only when a neighbour
//! absorbs it.

use hashbrown::HashMap;

use crate::collections::GrowableArray;
use crate::core::{AllocationRecord, GrowthPolicy};
use crate::error::{MemoryError, MemoryResult};

/// Index of a node slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(usize);

impl NodeId {
    /// Raw slot index
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One extent of the pool buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Node {
    extent: AllocationRecord,
    live: bool,
    allocated: bool,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

impl Node {
    const VACANT: Self = Self {
        extent: AllocationRecord::new(0, 0),
        live: false,
        allocated: false,
        prev: None,
        next: None,
    };

    fn gap(extent: AllocationRecord, prev: Option<NodeId>, next: Option<NodeId>) -> Self {
        Self {
            extent,
            live: true,
            allocated: false,
            prev,
            next,
        }
    }

    /// Extent covered by the node
    #[inline]
    pub fn extent(&self) -> AllocationRecord {
        self.extent
    }

    /// Offset of the extent
    #[inline]
    pub fn offset(&self) -> usize {
        self.extent.offset()
    }

    /// Size of the extent
    #[inline]
    pub fn size(&self) -> usize {
        self.extent.size()
    }

    /// Whether the slot is part of the list
    #[inline]
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Whether the node is an allocation
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Whether the node is a live gap
    #[inline]
    pub fn is_gap(&self) -> bool {
        self.live && !self.allocated
    }

    /// Previous node in address order
    #[inline]
    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    /// Next node in address order
    #[inline]
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }
}

/// Doubly linked list of nodes over a slot arena
#[derive(Debug)]
pub(crate) struct NodeList {
    slots: GrowableArray<Node>,
    free_slots: Vec<NodeId>,
    head: Option<NodeId>,
    used: usize,
    // Live allocated nodes keyed by base offset
    allocations: HashMap<usize, NodeId>,
}

impl NodeList {
    /// Create a list holding a single gap that covers `[0, total_size)`
    pub fn new(total_size: usize, growth: GrowthPolicy) -> MemoryResult<Self> {
        let mut slots = GrowableArray::with_policy("node storage", growth)?;

        let mut free_slots = Vec::new();
        free_slots
            .try_reserve_exact(slots.capacity())
            .map_err(|_| MemoryError::out_of_memory("node free list", slots.capacity()))?;

        slots.push(Node::gap(AllocationRecord::new(0, total_size), None, None))?;

        Ok(Self {
            slots,
            free_slots,
            head: Some(NodeId(0)),
            used: 1,
            allocations: HashMap::new(),
        })
    }

    /// Get node by id
    ///
    /// Ids handed out by this list always refer to an existing slot.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.slots.as_slice()[id.0]
    }

    /// Get node by id, if the slot exists
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0)
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.slots.as_mut_slice()[id.0]
    }

    /// First node in address order
    #[inline]
    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// Number of live nodes
    #[inline]
    pub fn used_count(&self) -> usize {
        self.used
    }

    /// Number of slots ever handed out, live or vacant
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Logical capacity of the node storage
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Iterate over live nodes in address order
    pub fn iter(&self) -> Nodes<'_> {
        Nodes {
            list: self,
            cursor: self.head,
            remaining: self.used,
        }
    }

    /// Find the live allocated node whose extent is exactly `record`
    pub fn find_allocation(&self, record: AllocationRecord) -> Option<NodeId> {
        let id = *self.allocations.get(&record.offset())?;
        let node = self.node(id);
        (node.live && node.allocated && node.extent == record).then_some(id)
    }

    /// Lowest-addressed gap of at least `size` bytes
    pub fn first_fit(&self, size: usize) -> Option<NodeId> {
        self.iter()
            .find(|(_, node)| node.is_gap() && node.size() >= size)
            .map(|(id, _)| id)
    }

    /// Address-adjacent gaps of `id` as `(prev, next)`
    pub fn adjacent_gaps(&self, id: NodeId) -> (Option<NodeId>, Option<NodeId>) {
        let node = self.node(id);
        let is_gap = |neighbor: Option<NodeId>| neighbor.filter(|n| self.node(*n).is_gap());
        (is_gap(node.prev), is_gap(node.next))
    }

    /// Reserve everything a subsequent [`split`](Self::split) may need
    ///
    /// After this succeeds `split` cannot fail for lack of memory, which
    /// keeps allocation all-or-nothing.
    pub fn reserve_for_split(&mut self, needs_new_node: bool) -> MemoryResult<()> {
        if needs_new_node && self.free_slots.is_empty() {
            self.slots
                .ensure_capacity_for(self.slots.len() + 1)
                .map_err(|_| MemoryError::out_of_node_capacity(self.slots.capacity()))?;

            // Every slot may end up on the free list
            let spare = self.slots.capacity().saturating_sub(self.free_slots.len());
            self.free_slots
                .try_reserve(spare)
                .map_err(|_| MemoryError::out_of_node_capacity(self.slots.capacity()))?;
        }

        self.allocations
            .try_reserve(1)
            .map_err(|_| MemoryError::out_of_node_capacity(self.slots.capacity()))
    }

    /// Turn gap `id` into an allocation of exactly `size` bytes
    ///
    /// Any remainder becomes a new gap spliced in right after `id`; its id
    /// is returned. `id` itself always becomes the allocation.
    pub fn split(&mut self, id: NodeId, size: usize) -> MemoryResult<Option<NodeId>> {
        let node = *self.node(id);
        if !node.is_gap() || node.size() < size {
            return Err(MemoryError::corruption(
                "node list",
                "split requested on a node that is not a sufficient gap",
            ));
        }

        let remainder = node.size() - size;
        let tail = if remainder > 0 {
            let extent = AllocationRecord::new(node.offset() + size, remainder);
            let tail = self.acquire_slot(Node::gap(extent, Some(id), node.next))?;
            if let Some(next) = node.next {
                self.node_mut(next).prev = Some(tail);
            }
            Some(tail)
        } else {
            None
        };

        let allocated = self.node_mut(id);
        allocated.extent = AllocationRecord::new(node.offset(), size);
        allocated.allocated = true;
        if tail.is_some() {
            allocated.next = tail;
        }
        self.allocations.insert(node.offset(), id);

        Ok(tail)
    }

    /// Turn allocation `id` back into a gap without coalescing
    pub fn release(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.allocated = false;
        let offset = node.offset();
        self.allocations.remove(&offset);
    }

    /// Coalesce gap `id` with adjacent gaps
    ///
    /// The next neighbour is absorbed into `id` first, then `id` into the
    /// previous neighbour. Returns the surviving node, which is the previous
    /// neighbour when it was a gap.
    pub fn merge_free(&mut self, id: NodeId) -> NodeId {
        if let Some(next) = self.node(id).next {
            if self.node(next).is_gap() {
                self.absorb_next(id, next);
            }
        }

        match self.node(id).prev {
            Some(prev) if self.node(prev).is_gap() => {
                self.absorb_next(prev, id);
                prev
            }
            _ => id,
        }
    }

    // Fold `next` into `survivor`, unlink it and recycle its slot.
    fn absorb_next(&mut self, survivor: NodeId, next: NodeId) {
        let absorbed = *self.node(next);
        let after = absorbed.next;

        let node = self.node_mut(survivor);
        node.extent = AllocationRecord::new(node.offset(), node.size() + absorbed.size());
        node.next = after;
        if let Some(after) = after {
            self.node_mut(after).prev = Some(survivor);
        }

        self.recycle(next);
    }

    fn acquire_slot(&mut self, node: Node) -> MemoryResult<NodeId> {
        let id = if let Some(id) = self.free_slots.pop() {
            *self.node_mut(id) = node;
            id
        } else {
            let id = NodeId(self.slots.len());
            self.slots
                .push(node)
                .map_err(|_| MemoryError::out_of_node_capacity(self.slots.capacity()))?;
            id
        };

        self.used += 1;
        Ok(id)
    }

    fn recycle(&mut self, id: NodeId) {
        *self.node_mut(id) = Node::VACANT;
        self.free_slots.push(id);
        self.used -= 1;
    }
}

/// Iterator over live nodes in address order
#[derive(Debug, Clone)]
pub(crate) struct Nodes<'a> {
    list: &'a NodeList,
    cursor: Option<NodeId>,
    remaining: usize,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let list: &'a NodeList = self.list;
        let node = list.node(id);
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((id, node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Nodes<'_> {}

impl core::iter::FusedIterator for Nodes<'_> {}
