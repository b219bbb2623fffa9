// SPDX-License-Identifier: MIT

//! The collection tree, see Section 6.2.2.6.
//!
//! > A Collection item identifies a relationship between two or more data (Input,
//! > Output, or Feature.) For example, a mouse could be described as a collection of
//! > two to four data (x, y, button 1, button 2). While the Collection item opens a
//! > collection of data, the End Collection item closes a collection.
//!
//! Collections are kept in an arena and refer to their parent by
//! [CollectionId]. The root of the tree is implicit and does not
//! correspond to any item in the report descriptor.

use crate::types::Usage;
use crate::ParserError;

/// The index of a [Collection] in [ReportDescriptor::collections()](crate::ReportDescriptor::collections).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionId(pub(crate) usize);

impl CollectionId {
    /// The implicit root collection.
    pub const ROOT: CollectionId = CollectionId(0);

    pub fn index(&self) -> usize {
        self.0
    }
}

/// The collection type as given by the lower two bits of the Collection
/// item's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Physical,
    Application,
    Logical,
    VendorDefined,
}

impl From<u32> for CollectionKind {
    fn from(value: u32) -> CollectionKind {
        match value & 0b11 {
            0 => CollectionKind::Physical,
            1 => CollectionKind::Application,
            2 => CollectionKind::Logical,
            _ => CollectionKind::VendorDefined,
        }
    }
}

impl From<CollectionKind> for u8 {
    fn from(kind: CollectionKind) -> u8 {
        match kind {
            CollectionKind::Physical => 0,
            CollectionKind::Application => 1,
            CollectionKind::Logical => 2,
            CollectionKind::VendorDefined => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    kind: Option<CollectionKind>,
    value: u32,
    usage: Usage,
    parent: Option<CollectionId>,
}

impl Collection {
    fn root() -> Self {
        Collection {
            kind: None,
            value: 0,
            usage: Usage(0),
            parent: None,
        }
    }

    /// The type of this collection, `None` for the root collection.
    pub fn kind(&self) -> Option<CollectionKind> {
        self.kind
    }

    /// The unmodified data of the Collection item.
    pub fn value(&self) -> u32 {
        self.value
    }

    /// The first usage pending when this collection was opened, or zero.
    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn parent(&self) -> Option<CollectionId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Builds the collection tree while parsing. Tracks the innermost open
/// collection.
#[derive(Debug)]
pub(crate) struct CollectionTree {
    nodes: Vec<Collection>,
    current: CollectionId,
}

impl Default for CollectionTree {
    fn default() -> Self {
        CollectionTree {
            nodes: vec![Collection::root()],
            current: CollectionId::ROOT,
        }
    }
}

impl CollectionTree {
    fn node(&self, id: CollectionId) -> &Collection {
        &self.nodes[id.0]
    }

    /// Opens a new collection as child of the current one.
    pub fn open(&mut self, value: u32, usage: Usage) -> CollectionId {
        let id = CollectionId(self.nodes.len());
        self.nodes.push(Collection {
            kind: Some(CollectionKind::from(value)),
            value,
            usage,
            parent: Some(self.current),
        });
        self.current = id;
        id
    }

    /// Closes the current collection. The root can never be closed.
    pub fn close(&mut self, offset: usize) -> Result<(), ParserError> {
        let parent = self
            .node(self.current)
            .parent
            .ok_or(ParserError::CollectionUnderflow { offset })?;
        self.current = parent;
        Ok(())
    }

    pub fn is_balanced(&self) -> bool {
        self.current == CollectionId::ROOT
    }

    /// The innermost open collection of the given kind, starting with
    /// (and including) the current collection.
    pub fn nearest(&self, kind: CollectionKind) -> Option<CollectionId> {
        let mut id = self.current;
        loop {
            let node = self.node(id);
            if node.kind == Some(kind) {
                return Some(id);
            }
            id = node.parent?;
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn into_collections(self) -> Vec<Collection> {
        self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_value() {
        assert_eq!(CollectionKind::from(0), CollectionKind::Physical);
        assert_eq!(CollectionKind::from(1), CollectionKind::Application);
        assert_eq!(CollectionKind::from(2), CollectionKind::Logical);
        assert_eq!(CollectionKind::from(3), CollectionKind::VendorDefined);
        assert_eq!(CollectionKind::from(0x81), CollectionKind::Application);
    }

    #[test]
    fn open_close() {
        let mut tree = CollectionTree::default();
        assert!(tree.is_balanced());
        let app = tree.open(1, Usage(0x0001_0002));
        let phys = tree.open(0, Usage(0x0001_0001));
        assert!(!tree.is_balanced());
        assert_eq!(tree.node(phys).parent(), Some(app));
        assert_eq!(tree.node(app).parent(), Some(CollectionId::ROOT));

        tree.close(10).unwrap();
        tree.close(11).unwrap();
        assert!(tree.is_balanced());
        assert_eq!(
            tree.close(12),
            Err(ParserError::CollectionUnderflow { offset: 12 })
        );
        assert_eq!(tree.len(), 3);

        let collections = tree.into_collections();
        assert!(collections[0].is_root());
        assert_eq!(collections[1].usage(), Usage(0x0001_0002));
        assert_eq!(collections[2].kind(), Some(CollectionKind::Physical));
    }

    #[test]
    fn nearest() {
        let mut tree = CollectionTree::default();
        assert_eq!(tree.nearest(CollectionKind::Physical), None);

        let app = tree.open(1, Usage(0));
        let logical = tree.open(2, Usage(0));
        let phys = tree.open(0, Usage(0));
        assert_eq!(tree.nearest(CollectionKind::Physical), Some(phys));
        assert_eq!(tree.nearest(CollectionKind::Logical), Some(logical));
        assert_eq!(tree.nearest(CollectionKind::Application), Some(app));
        assert_eq!(tree.nearest(CollectionKind::VendorDefined), None);

        tree.close(0).unwrap();
        assert_eq!(tree.nearest(CollectionKind::Physical), None);
        let inner = tree.open(2, Usage(0));
        assert_eq!(tree.nearest(CollectionKind::Logical), Some(inner));
    }
}
