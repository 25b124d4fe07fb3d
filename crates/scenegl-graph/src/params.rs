//! Declarative parameter schema and values.
//!
//! Node-typed parameters (`Node`, `NodeList`, `NodeDict`) are the edges of the scene DAG. The
//! engine never looks at parameter layouts beyond their kind; traversal goes through
//! [`ParamValue::node_refs`], which yields every referenced node regardless of the container.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::ops::BitOr;

use crate::class::NodeCategory;
use crate::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Bool,
    Int,
    Float,
    Vec4,
    Str,
    Node,
    NodeList,
    NodeDict,
}

impl ParamKind {
    pub fn name(self) -> &'static str {
        match self {
            ParamKind::Bool => "bool",
            ParamKind::Int => "int",
            ParamKind::Float => "float",
            ParamKind::Vec4 => "vec4",
            ParamKind::Str => "str",
            ParamKind::Node => "node",
            ParamKind::NodeList => "node list",
            ParamKind::NodeDict => "node dict",
        }
    }

    /// True for the kinds that hold references to other nodes.
    pub fn is_node(self) -> bool {
        matches!(self, ParamKind::Node | ParamKind::NodeList | ParamKind::NodeDict)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Vec4([f32; 4]),
    Str(String),
    Node(Option<NodeId>),
    NodeList(Vec<NodeId>),
    NodeDict(BTreeMap<String, NodeId>),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::Vec4(_) => ParamKind::Vec4,
            ParamValue::Str(_) => ParamKind::Str,
            ParamValue::Node(_) => ParamKind::Node,
            ParamValue::NodeList(_) => ParamKind::NodeList,
            ParamValue::NodeDict(_) => ParamKind::NodeDict,
        }
    }

    /// The empty value of a kind, used as the default of node-typed fields.
    pub fn empty(kind: ParamKind) -> Self {
        match kind {
            ParamKind::Bool => ParamValue::Bool(false),
            ParamKind::Int => ParamValue::Int(0),
            ParamKind::Float => ParamValue::Float(0.0),
            ParamKind::Vec4 => ParamValue::Vec4([0.0; 4]),
            ParamKind::Str => ParamValue::Str(String::new()),
            ParamKind::Node => ParamValue::Node(None),
            ParamKind::NodeList => ParamValue::NodeList(Vec::new()),
            ParamKind::NodeDict => ParamValue::NodeDict(BTreeMap::new()),
        }
    }

    /// Iterate the nodes referenced by this value (empty for scalar kinds).
    pub fn node_refs(&self) -> NodeRefs<'_> {
        match self {
            ParamValue::Node(n) => NodeRefs::One(*n),
            ParamValue::NodeList(v) => NodeRefs::List(v.iter()),
            ParamValue::NodeDict(m) => NodeRefs::Dict(m.values()),
            _ => NodeRefs::Empty,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_vec4(&self) -> Option<[f32; 4]> {
        match self {
            ParamValue::Vec4(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<Option<NodeId>> {
        match self {
            ParamValue::Node(n) => Some(*n),
            _ => None,
        }
    }
}

/// Iterator over the node references of a [`ParamValue`].
#[derive(Debug)]
pub enum NodeRefs<'a> {
    Empty,
    One(Option<NodeId>),
    List(std::slice::Iter<'a, NodeId>),
    Dict(btree_map::Values<'a, String, NodeId>),
}

impl Iterator for NodeRefs<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        match self {
            NodeRefs::Empty => None,
            NodeRefs::One(slot) => slot.take(),
            NodeRefs::List(it) => it.next().copied(),
            NodeRefs::Dict(it) => it.next().copied(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamFlags(u32);

impl ParamFlags {
    pub const NONE: ParamFlags = ParamFlags(0);
    /// A `Node` field that must reference a node before the owner can initialize.
    pub const NON_NULL: ParamFlags = ParamFlags(1 << 0);

    pub const fn contains(self, other: ParamFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ParamFlags {
    type Output = ParamFlags;

    fn bitor(self, rhs: ParamFlags) -> ParamFlags {
        ParamFlags(self.0 | rhs.0)
    }
}

/// One entry of a class parameter schema.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub flags: ParamFlags,
    pub default: ParamValue,
    /// Categories a node-typed field may reference. Empty means any.
    pub accepts: &'static [NodeCategory],
}

impl ParamSpec {
    fn scalar(name: &'static str, default: ParamValue) -> Self {
        Self {
            name,
            kind: default.kind(),
            flags: ParamFlags::NONE,
            default,
            accepts: &[],
        }
    }

    fn nodes(name: &'static str, kind: ParamKind, accepts: &'static [NodeCategory]) -> Self {
        Self {
            name,
            kind,
            flags: ParamFlags::NONE,
            default: ParamValue::empty(kind),
            accepts,
        }
    }

    pub fn bool(name: &'static str, default: bool) -> Self {
        Self::scalar(name, ParamValue::Bool(default))
    }

    pub fn int(name: &'static str, default: i64) -> Self {
        Self::scalar(name, ParamValue::Int(default))
    }

    pub fn float(name: &'static str, default: f64) -> Self {
        Self::scalar(name, ParamValue::Float(default))
    }

    pub fn vec4(name: &'static str, default: [f32; 4]) -> Self {
        Self::scalar(name, ParamValue::Vec4(default))
    }

    pub fn string(name: &'static str, default: &str) -> Self {
        Self::scalar(name, ParamValue::Str(default.to_string()))
    }

    pub fn node(name: &'static str, accepts: &'static [NodeCategory]) -> Self {
        Self::nodes(name, ParamKind::Node, accepts)
    }

    pub fn node_list(name: &'static str, accepts: &'static [NodeCategory]) -> Self {
        Self::nodes(name, ParamKind::NodeList, accepts)
    }

    pub fn node_dict(name: &'static str, accepts: &'static [NodeCategory]) -> Self {
        Self::nodes(name, ParamKind::NodeDict, accepts)
    }

    pub fn with_flags(mut self, flags: ParamFlags) -> Self {
        self.flags = self.flags | flags;
        self
    }

    /// Whether `category` may be referenced from this field.
    pub fn accepts(&self, category: NodeCategory) -> bool {
        self.accepts.is_empty() || self.accepts.contains(&category)
    }
}
