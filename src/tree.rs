//! Crafting tree built by the recursive algorithm
//!
//! Nodes live in a single arena and refer to each other by index, so the
//! tree can be built and walked without recursion.

use serde::Serialize;

use crate::models::{Equation, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// `None` only for the root sentinel
    pub resource: Option<Resource>,
    pub station: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquationTree {
    nodes: Vec<Node>,
}

impl Default for EquationTree {
    fn default() -> Self {
        Self::new()
    }
}

impl EquationTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                resource: None,
                station: None,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn push(&mut self, parent: NodeId, resource: Resource, station: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            resource: Some(resource),
            station,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Number of nodes excluding the root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distance from the root; root children are at depth 0
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            current = self.node(parent).parent;
            if current.is_some() {
                depth += 1;
            }
        }
        depth
    }

    /// Pre-order walk over every node below the root
    pub fn walk(&self) -> Walk<'_> {
        let mut stack: Vec<NodeId> = self.children(self.root()).to_vec();
        stack.reverse();
        Walk { tree: self, stack }
    }

    /// Resources in pre-order, each as a one-term equation
    pub fn equations(&self) -> Vec<Equation> {
        self.walk()
            .filter_map(|id| self.node(id).resource.clone())
            .map(Equation::from)
            .collect()
    }

    /// Nested form for JSON output
    pub fn to_entries(&self) -> Vec<TreeEntry> {
        self.children(self.root())
            .iter()
            .map(|&id| self.entry(id))
            .collect()
    }

    fn entry(&self, id: NodeId) -> TreeEntry {
        // Built bottom-up from an explicit post-order to avoid deep recursion.
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.children(current).iter().copied());
        }

        let mut built: Vec<Option<TreeEntry>> = vec![None; self.nodes.len()];
        for &current in order.iter().rev() {
            let node = self.node(current);
            let children = node
                .children
                .iter()
                .filter_map(|child| built[child.0].take())
                .collect();
            let (name, amount) = node
                .resource
                .as_ref()
                .map(|r| (r.name().to_string(), whole(r)))
                .unwrap_or_default();
            built[current.0] = Some(TreeEntry {
                name,
                amount,
                count: 1,
                station: node.station.clone(),
                children,
            });
        }

        built[id.0].take().unwrap_or_default()
    }
}

fn whole(resource: &Resource) -> i64 {
    use num_traits::{Signed, ToPrimitive};

    let value = resource.display_amount();
    value.to_i64().unwrap_or(if value.is_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

pub struct Walk<'a> {
    tree: &'a EquationTree,
    stack: Vec<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub name: String,
    pub amount: i64,
    pub count: u32,
    pub station: Option<String>,
    pub children: Vec<TreeEntry>,
}
