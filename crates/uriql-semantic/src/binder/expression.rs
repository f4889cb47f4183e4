//! Generic filter/orderby expression binder
//!
//! Binds the untyped expression AST against an entity type with an
//! implicit range variable, producing typed [`QueryNode`]s. Property paths
//! resolve through the model; operators check operand kinds and comparisons
//! yield Boolean.

use crate::{
    BinaryOpNode, CollectionNavigationNode, ConstantNode, FilterClause, FunctionCallNode,
    OrderByClause, OrderByItem, PropertyAccessNode, QueryNode, RangeVariable, RangeVariableNode,
    SingleNavigationNode, UnaryOpNode,
};
use uriql_ast::{BinaryExpr, Expression, Literal, OrderByToken, PropertyPath, UnaryExpr, UnaryOp};
use uriql_diagnostics::{
    Result, UriqlError, UQL0200, UQL0203, UQL0204, UQL0205, UQL0206,
};
use uriql_model::{EdmModel, PrimitiveKind, PropertyKind};

/// Binds filter/orderby expressions within one range-variable scope
#[derive(Debug)]
pub struct ExpressionBinder<'m> {
    model: &'m EdmModel,
    range_variable: RangeVariable,
}

impl<'m> ExpressionBinder<'m> {
    /// Create a binder scoped to a range variable
    pub fn new(model: &'m EdmModel, range_variable: RangeVariable) -> Self {
        Self {
            model,
            range_variable,
        }
    }

    /// Bind a `$filter` expression; the result must be Boolean-valued
    pub fn bind_filter(&self, expression: &Expression) -> Result<FilterClause> {
        let node = self.bind(expression)?;
        if node.value_kind() != Some(PrimitiveKind::Boolean) {
            return Err(UriqlError::binding(
                UQL0205,
                "A filter expression must be Boolean-valued",
            ));
        }
        Ok(FilterClause {
            expression: node,
            range_variable: self.range_variable.clone(),
        })
    }

    /// Bind an `$orderby` list; every key must be primitive-valued
    pub fn bind_order_by(&self, items: &[OrderByToken]) -> Result<OrderByClause> {
        let mut bound = Vec::with_capacity(items.len());
        for item in items {
            let node = self.bind(&item.expression)?;
            if node.value_kind().is_none() {
                return Err(UriqlError::binding(
                    UQL0205,
                    "An orderby key must be primitive-valued",
                ));
            }
            bound.push(OrderByItem {
                expression: node,
                direction: item.direction,
            });
        }
        Ok(OrderByClause {
            items: bound,
            range_variable: self.range_variable.clone(),
        })
    }

    /// Bind one expression to a typed query node
    pub fn bind(&self, expression: &Expression) -> Result<QueryNode> {
        match expression {
            Expression::Literal(literal) => Ok(bind_literal(literal)),
            Expression::Property(path) => self.bind_property_path(path),
            Expression::Unary(unary) => self.bind_unary(unary),
            Expression::Binary(binary) => self.bind_binary(binary),
            Expression::FunctionCall(call) => self.bind_function_call(&call.name, &call.args),
        }
    }

    fn bind_unary(&self, unary: &UnaryExpr) -> Result<QueryNode> {
        let operand = self.bind(&unary.operand)?;
        let kind = operand.value_kind();
        let value_kind = match unary.op {
            UnaryOp::Not => {
                if !matches!(kind, Some(PrimitiveKind::Boolean) | None) {
                    return Err(self.type_mismatch("'not' requires a Boolean operand", kind));
                }
                Some(PrimitiveKind::Boolean)
            }
            UnaryOp::Negate => {
                if !kind.is_some_and(is_numeric) {
                    return Err(self.type_mismatch("Negation requires a numeric operand", kind));
                }
                kind
            }
        };
        Ok(QueryNode::UnaryOp(UnaryOpNode {
            op: unary.op,
            operand: Box::new(operand),
            value_kind,
        }))
    }

    fn bind_binary(&self, binary: &BinaryExpr) -> Result<QueryNode> {
        let left = self.bind(&binary.left)?;
        let right = self.bind(&binary.right)?;
        let (lk, rk) = (left.value_kind(), right.value_kind());
        let op = binary.op;

        let value_kind = if op.is_logical() {
            for kind in [lk, rk] {
                if !matches!(kind, Some(PrimitiveKind::Boolean) | None) {
                    return Err(self.type_mismatch(
                        &format!("'{op}' requires Boolean operands"),
                        kind,
                    ));
                }
            }
            Some(PrimitiveKind::Boolean)
        } else if op.is_comparison() {
            if !kinds_comparable(lk, rk) {
                return Err(UriqlError::binding(
                    UQL0205,
                    format!("Operands of '{op}' have incomparable types {lk:?} and {rk:?}"),
                ));
            }
            Some(PrimitiveKind::Boolean)
        } else {
            // arithmetic
            for kind in [lk, rk] {
                if !(kind.is_none() || kind.is_some_and(is_numeric)) {
                    return Err(self.type_mismatch(
                        &format!("'{op}' requires numeric operands"),
                        kind,
                    ));
                }
            }
            promote_numeric(lk, rk)
        };

        Ok(QueryNode::BinaryOp(BinaryOpNode {
            op,
            left: Box::new(left),
            right: Box::new(right),
            value_kind,
        }))
    }

    /// Resolve a property path rooted at the range variable, producing
    /// navigation nodes for every traversed navigation property and a
    /// property-access node for the terminal structural property
    fn bind_property_path(&self, path: &PropertyPath) -> Result<QueryNode> {
        let mut node = QueryNode::RangeVariable(RangeVariableNode {
            name: self.range_variable.name.clone(),
            entity_type: self.range_variable.entity_type.clone(),
        });
        let mut current_type = self.range_variable.entity_type.clone();
        let mut current_set = self.range_variable.entity_set.clone();

        let last_index = path.segments.len() - 1;
        for (index, segment) in path.segments.iter().enumerate() {
            // A dotted segment is a type cast, narrowing the current type
            if segment.contains('.') {
                let cast_type = self.model.entity_type(segment).ok_or_else(|| {
                    UriqlError::binding(UQL0204, format!("Unknown type '{segment}'"))
                })?;
                if !self
                    .model
                    .are_related(&current_type.qualified_name(), segment)
                {
                    return Err(UriqlError::binding(
                        UQL0203,
                        format!(
                            "Type '{segment}' is not related to type '{}'",
                            current_type.qualified_name()
                        ),
                    ));
                }
                current_type = cast_type;
                continue;
            }

            let property = self
                .model
                .resolve_property(&current_type, segment)
                .ok_or_else(|| {
                    UriqlError::binding_for(
                        UQL0200,
                        format!(
                            "Property '{segment}' is not declared on type '{}'",
                            current_type.qualified_name()
                        ),
                        segment.clone(),
                        current_type.qualified_name(),
                    )
                })?;

            match &property.kind {
                PropertyKind::Structural { value_kind } => {
                    if index != last_index {
                        return Err(UriqlError::binding(
                            UQL0205,
                            format!(
                                "Structural property '{segment}' must be the last segment of the path"
                            ),
                        ));
                    }
                    node = QueryNode::PropertyAccess(PropertyAccessNode {
                        source: Box::new(node),
                        value_kind: *value_kind,
                        property,
                    });
                }
                PropertyKind::Navigation {
                    target_type,
                    multiplicity,
                } => {
                    if multiplicity.is_collection() && index != last_index {
                        return Err(UriqlError::binding(
                            UQL0205,
                            format!(
                                "Cannot traverse collection navigation property '{segment}' inside an expression"
                            ),
                        ));
                    }
                    let element_type = self.model.entity_type(target_type).ok_or_else(|| {
                        UriqlError::binding(UQL0204, format!("Unknown type '{target_type}'"))
                    })?;
                    let target_set = current_set
                        .as_deref()
                        .and_then(|set| self.model.find_navigation_target(set, segment));
                    node = if multiplicity.is_collection() {
                        QueryNode::CollectionNavigation(CollectionNavigationNode {
                            source: Box::new(node),
                            navigation: property,
                            entity_type: element_type.clone(),
                            entity_set: target_set.clone(),
                        })
                    } else {
                        QueryNode::SingleNavigation(SingleNavigationNode {
                            source: Box::new(node),
                            navigation: property,
                            entity_type: element_type.clone(),
                            entity_set: target_set.clone(),
                        })
                    };
                    current_type = element_type;
                    current_set = target_set;
                }
            }
        }
        Ok(node)
    }

    fn bind_function_call(&self, name: &str, args: &[Expression]) -> Result<QueryNode> {
        let bound: Vec<QueryNode> = args
            .iter()
            .map(|arg| self.bind(arg))
            .collect::<Result<_>>()?;
        let kinds: Vec<Option<PrimitiveKind>> = bound.iter().map(QueryNode::value_kind).collect();

        let signature_error = |expected: &str| {
            UriqlError::binding(
                UQL0205,
                format!("Function '{name}' expects {expected}"),
            )
        };

        let value_kind = match name {
            "contains" | "startswith" | "endswith" => {
                check_args(&kinds, &[PrimitiveKind::String, PrimitiveKind::String])
                    .map_err(|()| signature_error("(String, String)"))?;
                Some(PrimitiveKind::Boolean)
            }
            "concat" => {
                check_args(&kinds, &[PrimitiveKind::String, PrimitiveKind::String])
                    .map_err(|()| signature_error("(String, String)"))?;
                Some(PrimitiveKind::String)
            }
            "length" => {
                check_args(&kinds, &[PrimitiveKind::String])
                    .map_err(|()| signature_error("(String)"))?;
                Some(PrimitiveKind::Int32)
            }
            "tolower" | "toupper" | "trim" => {
                check_args(&kinds, &[PrimitiveKind::String])
                    .map_err(|()| signature_error("(String)"))?;
                Some(PrimitiveKind::String)
            }
            "year" | "month" | "day" | "hour" | "minute" | "second" => {
                let ok = kinds.len() == 1
                    && matches!(
                        kinds[0],
                        Some(PrimitiveKind::Date) | Some(PrimitiveKind::DateTimeOffset) | None
                    );
                if !ok {
                    return Err(signature_error("(Date or DateTimeOffset)"));
                }
                Some(PrimitiveKind::Int32)
            }
            "round" | "floor" | "ceiling" => {
                let ok = kinds.len() == 1 && (kinds[0].is_none() || kinds[0].is_some_and(is_numeric));
                if !ok {
                    return Err(signature_error("(numeric)"));
                }
                kinds[0]
            }
            _ => {
                return Err(UriqlError::binding(
                    UQL0206,
                    format!("Unknown function '{name}'"),
                ));
            }
        };

        Ok(QueryNode::FunctionCall(FunctionCallNode {
            name: name.to_owned(),
            args: bound,
            value_kind,
        }))
    }

    fn type_mismatch(&self, message: &str, found: Option<PrimitiveKind>) -> UriqlError {
        UriqlError::binding(UQL0205, format!("{message}, found {found:?}"))
    }
}

fn bind_literal(literal: &Literal) -> QueryNode {
    let value_kind = match literal {
        Literal::Null => None,
        Literal::Boolean(_) => Some(PrimitiveKind::Boolean),
        Literal::Integer(_) => Some(PrimitiveKind::Int64),
        Literal::Decimal(_) => Some(PrimitiveKind::Decimal),
        Literal::String(_) => Some(PrimitiveKind::String),
    };
    QueryNode::Constant(ConstantNode {
        value: literal.clone(),
        value_kind,
    })
}

fn is_numeric(kind: PrimitiveKind) -> bool {
    matches!(
        kind,
        PrimitiveKind::Byte
            | PrimitiveKind::Int16
            | PrimitiveKind::Int32
            | PrimitiveKind::Int64
            | PrimitiveKind::Single
            | PrimitiveKind::Double
            | PrimitiveKind::Decimal
    )
}

/// Two kinds compare when either side is untyped (`null`), the kinds are
/// equal, or both are numeric
fn kinds_comparable(a: Option<PrimitiveKind>, b: Option<PrimitiveKind>) -> bool {
    match (a, b) {
        (None, _) | (_, None) => true,
        (Some(a), Some(b)) => a == b || (is_numeric(a) && is_numeric(b)),
    }
}

fn promote_numeric(a: Option<PrimitiveKind>, b: Option<PrimitiveKind>) -> Option<PrimitiveKind> {
    match (a, b) {
        (Some(a), Some(b)) => {
            if a == PrimitiveKind::Double || b == PrimitiveKind::Double {
                Some(PrimitiveKind::Double)
            } else if a == PrimitiveKind::Decimal || b == PrimitiveKind::Decimal {
                Some(PrimitiveKind::Decimal)
            } else if a == PrimitiveKind::Single || b == PrimitiveKind::Single {
                Some(PrimitiveKind::Single)
            } else {
                Some(PrimitiveKind::Int64)
            }
        }
        (a, b) => a.or(b),
    }
}

fn check_args(
    kinds: &[Option<PrimitiveKind>],
    expected: &[PrimitiveKind],
) -> std::result::Result<(), ()> {
    if kinds.len() != expected.len() {
        return Err(());
    }
    for (kind, want) in kinds.iter().zip(expected) {
        // An untyped null argument is accepted anywhere
        if kind.is_some_and(|k| k != *want) {
            return Err(());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IMPLICIT_RANGE_VARIABLE;
    use uriql_model::{EntitySet, EntityTypeBuilder, Multiplicity};
    use uriql_parser::parse_filter_clause;

    fn model() -> EdmModel {
        EdmModel::builder()
            .entity_type(
                EntityTypeBuilder::new("Ns", "Order")
                    .structural("Amount", PrimitiveKind::Decimal)
                    .structural("Note", PrimitiveKind::String)
                    .structural("Placed", PrimitiveKind::DateTimeOffset)
                    .navigation("Customer", "Ns.Customer", Multiplicity::One)
                    .navigation("Items", "Ns.Item", Multiplicity::Many)
                    .build(),
            )
            .entity_type(
                EntityTypeBuilder::new("Ns", "Customer")
                    .structural("Name", PrimitiveKind::String)
                    .build(),
            )
            .entity_type(
                EntityTypeBuilder::new("Ns", "Item")
                    .structural("Sku", PrimitiveKind::String)
                    .build(),
            )
            .entity_set(
                EntitySet::new("Orders", "Ns.Order").with_navigation_target("Customer", "Customers"),
            )
            .entity_set(EntitySet::new("Customers", "Ns.Customer"))
            .build()
    }

    fn binder(model: &EdmModel) -> ExpressionBinder<'_> {
        let ty = model.entity_type("Ns.Order").unwrap();
        let set = model.entity_set("Orders");
        ExpressionBinder::new(model, RangeVariable::implicit(ty, set))
    }

    fn bind_filter(text: &str) -> Result<FilterClause> {
        let model = model();
        let expr = parse_filter_clause(text, 100).unwrap();
        binder(&model).bind_filter(&expr)
    }

    #[test]
    fn test_comparison_binds_to_boolean() {
        let clause = bind_filter("Amount gt 10").unwrap();
        assert_eq!(clause.expression.value_kind(), Some(PrimitiveKind::Boolean));
        assert_eq!(clause.range_variable.name, IMPLICIT_RANGE_VARIABLE);
        match &clause.expression {
            QueryNode::BinaryOp(b) => {
                assert_eq!(b.left.kind(), crate::QueryNodeKind::PropertyAccess);
                assert_eq!(b.right.kind(), crate::QueryNodeKind::Constant);
            }
            _ => panic!("Expected BinaryOp"),
        }
    }

    #[test]
    fn test_navigation_path_in_filter() {
        let clause = bind_filter("Customer/Name eq 'Ada'").unwrap();
        match &clause.expression {
            QueryNode::BinaryOp(b) => match b.left.as_ref() {
                QueryNode::PropertyAccess(p) => {
                    assert_eq!(p.property.name, "Name");
                    match p.source.as_ref() {
                        QueryNode::SingleNavigation(nav) => {
                            assert_eq!(nav.navigation.name, "Customer");
                            assert_eq!(nav.entity_set.as_ref().unwrap().name, "Customers");
                        }
                        _ => panic!("Expected SingleNavigation source"),
                    }
                }
                _ => panic!("Expected PropertyAccess"),
            },
            _ => panic!("Expected BinaryOp"),
        }
    }

    #[test]
    fn test_collection_navigation_not_traversable() {
        let err = bind_filter("Items/Sku eq 'A'").unwrap_err();
        assert_eq!(err.code(), UQL0205);
    }

    #[test]
    fn test_filter_must_be_boolean() {
        let err = bind_filter("Amount add 1").unwrap_err();
        assert_eq!(err.code(), UQL0205);
    }

    #[test]
    fn test_undeclared_property() {
        let err = bind_filter("Missing eq 1").unwrap_err();
        assert_eq!(err.code(), UQL0200);
        match err {
            UriqlError::Binding { identifier, type_name, .. } => {
                assert_eq!(identifier.as_deref(), Some("Missing"));
                assert_eq!(type_name.as_deref(), Some("Ns.Order"));
            }
            _ => panic!("Expected Binding"),
        }
    }

    #[test]
    fn test_null_comparison_allowed() {
        assert!(bind_filter("Note eq null").is_ok());
    }

    #[test]
    fn test_incomparable_kinds_rejected() {
        let err = bind_filter("Note eq 5").unwrap_err();
        assert_eq!(err.code(), UQL0205);
    }

    #[test]
    fn test_string_functions() {
        let clause = bind_filter("contains(Note,'x') and startswith(Note,'a')").unwrap();
        assert_eq!(clause.expression.value_kind(), Some(PrimitiveKind::Boolean));

        let err = bind_filter("contains(Amount,'x')").unwrap_err();
        assert_eq!(err.code(), UQL0205);
    }

    #[test]
    fn test_unknown_function() {
        let err = bind_filter("frobnicate(Note) eq 1").unwrap_err();
        assert_eq!(err.code(), UQL0206);
    }

    #[test]
    fn test_date_component_function() {
        assert!(bind_filter("year(Placed) eq 2024").is_ok());
    }

    #[test]
    fn test_orderby_requires_primitive_keys() {
        let model = model();
        let items = uriql_parser::parse_order_by_clause("Amount desc,Customer/Name", 100).unwrap();
        let clause = binder(&model).bind_order_by(&items).unwrap();
        assert_eq!(clause.items.len(), 2);

        let items = uriql_parser::parse_order_by_clause("Customer", 100).unwrap();
        let err = binder(&model).bind_order_by(&items).unwrap_err();
        assert_eq!(err.code(), UQL0205);
    }
}
