//! Inspection views over a pool's layout

use core::fmt;
use core::iter::FusedIterator;

use crate::core::PoolSegment;
use crate::pool::node_list::Nodes;

/// Address-ordered segments of a pool
///
/// Borrowing the pool keeps it from changing while the view is alive. The
/// iterator is consumed as it goes; inspect again for a fresh pass.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    nodes: Nodes<'a>,
}

impl<'a> Segments<'a> {
    pub(crate) fn new(nodes: Nodes<'a>) -> Self {
        Self { nodes }
    }
}

impl Iterator for Segments<'_> {
    type Item = PoolSegment;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes
            .next()
            .map(|(_, node)| PoolSegment::new(node.offset(), node.size(), node.is_allocated()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl ExactSizeIterator for Segments<'_> {}

impl FusedIterator for Segments<'_> {}

/// Human-readable layout, e.g. `|alloc[0..100]|gap[100..1000]|`
#[derive(Debug, Clone)]
pub struct PoolLayout<'a> {
    segments: Segments<'a>,
}

impl<'a> PoolLayout<'a> {
    pub(crate) fn new(segments: Segments<'a>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for PoolLayout<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|")?;
        for segment in self.segments.clone() {
            write!(f, "{segment}|")?;
        }
        Ok(())
    }
}
