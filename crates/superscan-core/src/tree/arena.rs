//! Index-based scratch tree used while a builder is still discovering entries.
//!
//! Builders need to append children to a node that was discovered earlier
//! while other nodes are still pending. Doing that with owned `TreeNode`s
//! would require parent pointers, so builders work on flat slots and convert
//! to the owned tree once at the end.

use super::node::TreeNode;

/// Handle to a slot in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(0);
}

#[derive(Debug)]
struct Slot {
    name: String,
    is_dir: bool,
    size: u64,
    children: Vec<NodeId>,
}

#[derive(Debug)]
pub(crate) struct NodeArena {
    root: Slot,
    // Slot for `NodeId(i)` lives at `descendants[i - 1]`.
    descendants: Vec<Slot>,
}

impl NodeArena {
    pub(crate) fn new(root_name: &str) -> Self {
        Self {
            root: Slot {
                name: root_name.to_string(),
                is_dir: true,
                size: 0,
                children: Vec::new(),
            },
            descendants: Vec::new(),
        }
    }

    /// Appends a child to `parent` and returns its handle.
    pub(crate) fn push_child(
        &mut self,
        parent: NodeId,
        name: &str,
        is_dir: bool,
        size: u64,
    ) -> NodeId {
        self.descendants.push(Slot {
            name: name.to_string(),
            is_dir,
            size: if is_dir { 0 } else { size },
            children: Vec::new(),
        });
        let id = NodeId(self.descendants.len());
        self.slot_mut(parent).children.push(id);
        id
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        match id.0 {
            0 => &mut self.root,
            n => &mut self.descendants[n - 1],
        }
    }

    /// Converts the arena into an owned tree without recursion.
    ///
    /// A child is always pushed after its parent, so walking the slots from
    /// the last to the first sees every child before the node that owns it.
    pub(crate) fn into_tree(self) -> TreeNode {
        let NodeArena {
            root,
            mut descendants,
        } = self;
        let mut built: Vec<Option<TreeNode>> = Vec::with_capacity(descendants.len() + 1);
        built.resize_with(descendants.len() + 1, || None);

        while let Some(slot) = descendants.pop() {
            let id = descendants.len() + 1;
            let node = assemble(slot, &mut built);
            built[id] = Some(node);
        }
        assemble(root, &mut built)
    }
}

fn assemble(slot: Slot, built: &mut [Option<TreeNode>]) -> TreeNode {
    let children = slot
        .children
        .iter()
        .filter_map(|child| built[child.0].take())
        .collect();
    TreeNode::from_parts(slot.name, slot.is_dir, slot.size, children)
}
