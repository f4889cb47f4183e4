//! Bound query nodes for filter/orderby expressions
//!
//! Each node is an immutable, typed AST node built bottom-up by the
//! expression binder: `source` references point from a node toward the
//! range variable it is rooted in, never back down, so the tree is acyclic
//! by construction. Kind discrimination is a closed enum with exhaustive
//! matching; [`QueryNode::kind`] exposes the discriminant where code wants
//! to branch without destructuring.

use std::sync::Arc;
use uriql_ast::{BinaryOp, Literal, SortDirection, UnaryOp};
use uriql_model::{EntitySet, EntityType, PrimitiveKind, Property};

/// Name of the implicit range variable filter/orderby expressions are
/// bound against
pub const IMPLICIT_RANGE_VARIABLE: &str = "$it";

/// The implicit "current item" variable of a filter/orderby scope
#[derive(Debug, Clone, PartialEq)]
pub struct RangeVariable {
    /// Variable name
    pub name: String,
    /// Entity type of the current item
    pub entity_type: Arc<EntityType>,
    /// Entity set the current item ranges over, when one is known
    pub entity_set: Option<Arc<EntitySet>>,
}

impl RangeVariable {
    /// Create the implicit `$it` range variable over a type/set
    pub fn implicit(entity_type: Arc<EntityType>, entity_set: Option<Arc<EntitySet>>) -> Self {
        Self {
            name: IMPLICIT_RANGE_VARIABLE.to_owned(),
            entity_type,
            entity_set,
        }
    }
}

/// Discriminant of a bound query node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryNodeKind {
    Constant,
    BinaryOp,
    UnaryOp,
    RangeVariable,
    PropertyAccess,
    SingleNavigation,
    CollectionNavigation,
    FunctionCall,
}

/// A literal constant
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantNode {
    /// The literal value
    pub value: Literal,
    /// Value kind; `None` for the untyped `null` literal
    pub value_kind: Option<PrimitiveKind>,
}

/// A binary operator application
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOpNode {
    pub op: BinaryOp,
    pub left: Box<QueryNode>,
    pub right: Box<QueryNode>,
    /// Result kind: `Boolean` for logical/comparison operators, the
    /// promoted operand kind for arithmetic
    pub value_kind: Option<PrimitiveKind>,
}

/// A unary operator application
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOpNode {
    pub op: UnaryOp,
    pub operand: Box<QueryNode>,
    pub value_kind: Option<PrimitiveKind>,
}

/// Reference to the enclosing range variable
#[derive(Debug, Clone, PartialEq)]
pub struct RangeVariableNode {
    pub name: String,
    pub entity_type: Arc<EntityType>,
}

/// Access to a structural property of the source node
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAccessNode {
    /// The owning node
    pub source: Box<QueryNode>,
    /// The resolved structural property
    pub property: Property,
    /// The property's value kind
    pub value_kind: PrimitiveKind,
}

/// Traversal of a single-valued navigation property
#[derive(Debug, Clone, PartialEq)]
pub struct SingleNavigationNode {
    pub source: Box<QueryNode>,
    /// The resolved navigation property
    pub navigation: Property,
    /// Element type of the target
    pub entity_type: Arc<EntityType>,
    /// Target entity set, when resolvable
    pub entity_set: Option<Arc<EntitySet>>,
}

/// Traversal of a collection-valued navigation property
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionNavigationNode {
    pub source: Box<QueryNode>,
    pub navigation: Property,
    pub entity_type: Arc<EntityType>,
    pub entity_set: Option<Arc<EntitySet>>,
}

/// A bound call to a built-in query function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallNode {
    pub name: String,
    pub args: Vec<QueryNode>,
    pub value_kind: Option<PrimitiveKind>,
}

/// A bound filter/orderby expression node
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    Constant(ConstantNode),
    BinaryOp(BinaryOpNode),
    UnaryOp(UnaryOpNode),
    RangeVariable(RangeVariableNode),
    PropertyAccess(PropertyAccessNode),
    SingleNavigation(SingleNavigationNode),
    CollectionNavigation(CollectionNavigationNode),
    FunctionCall(FunctionCallNode),
}

impl QueryNode {
    /// The node-kind discriminant
    pub fn kind(&self) -> QueryNodeKind {
        match self {
            QueryNode::Constant(_) => QueryNodeKind::Constant,
            QueryNode::BinaryOp(_) => QueryNodeKind::BinaryOp,
            QueryNode::UnaryOp(_) => QueryNodeKind::UnaryOp,
            QueryNode::RangeVariable(_) => QueryNodeKind::RangeVariable,
            QueryNode::PropertyAccess(_) => QueryNodeKind::PropertyAccess,
            QueryNode::SingleNavigation(_) => QueryNodeKind::SingleNavigation,
            QueryNode::CollectionNavigation(_) => QueryNodeKind::CollectionNavigation,
            QueryNode::FunctionCall(_) => QueryNodeKind::FunctionCall,
        }
    }

    /// The primitive value kind this node evaluates to, when it has one
    ///
    /// Navigation and range-variable nodes are entity-valued and return
    /// `None`.
    pub fn value_kind(&self) -> Option<PrimitiveKind> {
        match self {
            QueryNode::Constant(n) => n.value_kind,
            QueryNode::BinaryOp(n) => n.value_kind,
            QueryNode::UnaryOp(n) => n.value_kind,
            QueryNode::PropertyAccess(n) => Some(n.value_kind),
            QueryNode::FunctionCall(n) => n.value_kind,
            QueryNode::RangeVariable(_)
            | QueryNode::SingleNavigation(_)
            | QueryNode::CollectionNavigation(_) => None,
        }
    }

    /// Whether this node is collection-valued
    pub fn is_collection(&self) -> bool {
        matches!(self, QueryNode::CollectionNavigation(_))
    }
}

/// A bound `$filter` option: the Boolean expression plus the range
/// variable it is scoped to
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub expression: QueryNode,
    pub range_variable: RangeVariable,
}

/// One bound `$orderby` key
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expression: QueryNode,
    pub direction: SortDirection,
}

/// A bound `$orderby` option
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    pub items: Vec<OrderByItem>,
    pub range_variable: RangeVariable,
}
