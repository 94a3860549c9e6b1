//! Foreign-key resolution from relationship declarations.
//!
//! Which side of a relationship receives the foreign key depends on its
//! join type and on the position of the current table in `models`:
//!
//! | join type     | table receiving the key | key column       | references |
//! |---------------|-------------------------|------------------|------------|
//! | `MANY_TO_ONE` | `models[0]`             | left of `=`      | `models[1]` |
//! | `ONE_TO_MANY` | `models[1]`             | right of `=`     | `models[0]` |
//! | `ONE_TO_ONE`  | either                  | same side as table | the other |
//!
//! Any other join type contributes no foreign key.

use std::collections::HashMap;
use std::fmt;

use mdl_core::{JoinType, MdlError, Model, Relationship, ResolutionFailure, Result};

/// A foreign-key constraint line of a compiled table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: String,
    pub references: String,
    pub primary_key: String,
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FOREIGN KEY ({}) REFERENCES {}({})",
            self.column, self.references, self.primary_key
        )
    }
}

/// Side of a join condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// A `table.column` reference inside a join condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnRef<'a> {
    table: &'a str,
    column: &'a str,
}

impl<'a> ColumnRef<'a> {
    fn parse(text: &'a str) -> Option<Self> {
        let (table, column) = text.trim().split_once('.')?;
        let table = unquote(table.trim());
        let column = unquote(column.trim());
        if table.is_empty() || column.is_empty() {
            return None;
        }
        Some(Self { table, column })
    }
}

fn unquote(ident: &str) -> &str {
    ident
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(ident)
}

/// A parsed `a.col = b.col` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JoinCondition<'a> {
    left: ColumnRef<'a>,
    right: ColumnRef<'a>,
}

impl<'a> JoinCondition<'a> {
    fn parse(condition: &'a str) -> Option<Self> {
        let mut parts = condition.split('=');
        let left = ColumnRef::parse(parts.next()?)?;
        let right = ColumnRef::parse(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { left, right })
    }

    fn side(&self, side: Side) -> ColumnRef<'a> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Resolves foreign-key constraints for models against one relationship list.
///
/// The primary-key lookup table is built once and is read-only afterwards.
pub struct RelationshipResolver<'a> {
    primary_keys: HashMap<&'a str, Option<&'a str>>,
    relationships: &'a [Relationship],
}

impl<'a> RelationshipResolver<'a> {
    #[must_use]
    pub fn new(models: &'a [Model], relationships: &'a [Relationship]) -> Self {
        let primary_keys = models
            .iter()
            .map(|m| (m.name.as_str(), m.primary_key()))
            .collect();
        Self {
            primary_keys,
            relationships,
        }
    }

    /// Foreign keys for `table`, in relationship-list order.
    ///
    /// Relationships that do not involve `table` contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns [`MdlError::RelationshipResolution`] when the referenced
    /// model is unknown or has no primary key, or when the condition is not
    /// two dotted references naming the relationship's models in order.
    pub fn resolve(&self, table: &str) -> Result<Vec<ForeignKey>> {
        let mut keys = Vec::new();
        for relationship in self.relationships {
            if let Some(key) = self.resolve_one(table, relationship)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn resolve_one(
        &self,
        table: &str,
        relationship: &Relationship,
    ) -> Result<Option<ForeignKey>> {
        let [first, second] = &relationship.models;

        let target = match &relationship.join_type {
            JoinType::ManyToOne => (first == table).then_some((Side::Left, second)),
            JoinType::OneToMany => (second == table).then_some((Side::Right, first)),
            JoinType::OneToOne => {
                if first == table {
                    Some((Side::Left, second))
                } else if second == table {
                    Some((Side::Right, first))
                } else {
                    None
                }
            }
            JoinType::Other(tag) => {
                tracing::debug!(
                    relationship = relationship.label(),
                    join_type = %tag,
                    "join type adds no foreign key"
                );
                None
            }
        };
        let Some((side, referenced)) = target else {
            return Ok(None);
        };

        let fail = |reason: ResolutionFailure| MdlError::RelationshipResolution {
            model: table.to_string(),
            relationship: relationship.label().to_string(),
            reason,
        };

        let condition = JoinCondition::parse(&relationship.condition).ok_or_else(|| {
            fail(ResolutionFailure::MalformedCondition(
                relationship.condition.clone(),
            ))
        })?;
        if condition.left.table != first || condition.right.table != second {
            return Err(fail(ResolutionFailure::TableMismatch {
                left: condition.left.table.to_string(),
                right: condition.right.table.to_string(),
                first: first.clone(),
                second: second.clone(),
            }));
        }

        let primary_key = match self.primary_keys.get(referenced.as_str()) {
            None => return Err(fail(ResolutionFailure::UnknownModel(referenced.clone()))),
            Some(None) => {
                return Err(fail(ResolutionFailure::MissingPrimaryKey(
                    referenced.clone(),
                )))
            }
            Some(Some(pk)) => *pk,
        };

        Ok(Some(ForeignKey {
            column: condition.side(side).column.to_string(),
            references: referenced.clone(),
            primary_key: primary_key.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str, pk: Option<&str>) -> Model {
        Model {
            name: name.to_string(),
            primary_key: pk.map(str::to_string),
            ..Model::default()
        }
    }

    fn rel(a: &str, b: &str, join_type: JoinType, condition: &str) -> Relationship {
        Relationship {
            name: format!("{a}_{b}"),
            models: [a.to_string(), b.to_string()],
            join_type,
            condition: condition.to_string(),
            extra: Default::default(),
        }
    }

    #[test]
    fn many_to_one_keys_the_left_table() {
        let models = vec![model("orders", Some("order_id")), model("customers", Some("id"))];
        let rels = vec![rel(
            "orders",
            "customers",
            JoinType::ManyToOne,
            "orders.customer_id = customers.id",
        )];
        let resolver = RelationshipResolver::new(&models, &rels);

        let keys = resolver.resolve("orders").unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(
            keys[0].to_string(),
            "FOREIGN KEY (customer_id) REFERENCES customers(id)"
        );
        assert!(resolver.resolve("customers").unwrap().is_empty());
    }

    #[test]
    fn one_to_many_keys_the_right_table() {
        let models = vec![model("customers", Some("id")), model("orders", Some("order_id"))];
        let rels = vec![rel(
            "customers",
            "orders",
            JoinType::OneToMany,
            "customers.id = orders.customer_id",
        )];
        let resolver = RelationshipResolver::new(&models, &rels);

        let keys = resolver.resolve("orders").unwrap();
        assert_eq!(
            keys[0].to_string(),
            "FOREIGN KEY (customer_id) REFERENCES customers(id)"
        );
        assert!(resolver.resolve("customers").unwrap().is_empty());
    }

    #[test]
    fn one_to_one_keys_both_tables() {
        let models = vec![model("a", Some("a_id")), model("b", Some("b_id"))];
        let rels = vec![rel("a", "b", JoinType::OneToOne, "a.x = b.y")];
        let resolver = RelationshipResolver::new(&models, &rels);

        assert_eq!(
            resolver.resolve("a").unwrap()[0].to_string(),
            "FOREIGN KEY (x) REFERENCES b(b_id)"
        );
        assert_eq!(
            resolver.resolve("b").unwrap()[0].to_string(),
            "FOREIGN KEY (y) REFERENCES a(a_id)"
        );
    }

    #[test]
    fn unsupported_join_type_contributes_nothing() {
        let models = vec![model("a", Some("id")), model("b", None)];
        let rels = vec![rel(
            "a",
            "b",
            JoinType::Other("MANY_TO_MANY".to_string()),
            "a.x = b.y",
        )];
        let resolver = RelationshipResolver::new(&models, &rels);
        assert!(resolver.resolve("a").unwrap().is_empty());
        assert!(resolver.resolve("b").unwrap().is_empty());
    }

    #[test]
    fn unrelated_relationships_contribute_nothing() {
        let models = vec![model("a", Some("id")), model("b", Some("id")), model("c", Some("id"))];
        let rels = vec![rel("a", "b", JoinType::OneToOne, "a.x = b.y")];
        let resolver = RelationshipResolver::new(&models, &rels);
        assert!(resolver.resolve("c").unwrap().is_empty());
    }

    #[test]
    fn keys_follow_relationship_order() {
        let models = vec![
            model("orders", Some("id")),
            model("customers", Some("cid")),
            model("stores", Some("sid")),
        ];
        let rels = vec![
            rel("orders", "stores", JoinType::ManyToOne, "orders.store_id = stores.sid"),
            rel("orders", "customers", JoinType::ManyToOne, "orders.customer_id = customers.cid"),
        ];
        let resolver = RelationshipResolver::new(&models, &rels);
        let columns: Vec<String> = resolver
            .resolve("orders")
            .unwrap()
            .into_iter()
            .map(|k| k.column)
            .collect();
        assert_eq!(columns, vec!["store_id", "customer_id"]);
    }

    #[test]
    fn quoted_identifiers_are_unquoted() {
        let models = vec![model("orders", Some("id")), model("customers", Some("id"))];
        let rels = vec![rel(
            "orders",
            "customers",
            JoinType::ManyToOne,
            r#""orders"."customer_id" = "customers"."id""#,
        )];
        let resolver = RelationshipResolver::new(&models, &rels);
        assert_eq!(resolver.resolve("orders").unwrap()[0].column, "customer_id");
    }

    #[test]
    fn missing_primary_key_is_fatal() {
        let models = vec![model("orders", Some("id")), model("customers", None)];
        let rels = vec![rel(
            "orders",
            "customers",
            JoinType::ManyToOne,
            "orders.customer_id = customers.id",
        )];
        let err = RelationshipResolver::new(&models, &rels)
            .resolve("orders")
            .unwrap_err();
        match err {
            MdlError::RelationshipResolution {
                model,
                relationship,
                reason,
            } => {
                assert_eq!(model, "orders");
                assert_eq!(relationship, "orders_customers");
                assert_eq!(
                    reason,
                    ResolutionFailure::MissingPrimaryKey("customers".to_string())
                );
            }
            other => panic!("expected resolution error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_model_is_fatal() {
        let models = vec![model("orders", Some("id"))];
        let rels = vec![rel(
            "orders",
            "customers",
            JoinType::ManyToOne,
            "orders.customer_id = customers.id",
        )];
        let err = RelationshipResolver::new(&models, &rels)
            .resolve("orders")
            .unwrap_err();
        assert!(matches!(
            err,
            MdlError::RelationshipResolution {
                reason: ResolutionFailure::UnknownModel(_),
                ..
            }
        ));
    }

    #[test]
    fn malformed_conditions_are_fatal() {
        let models = vec![model("a", Some("id")), model("b", Some("id"))];
        for condition in ["a.x", "a.x = b.y = c.z", "ax = b.y", "a. = b.y", "a.x == b.y"] {
            let rels = vec![rel("a", "b", JoinType::OneToOne, condition)];
            let err = RelationshipResolver::new(&models, &rels)
                .resolve("a")
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    MdlError::RelationshipResolution {
                        reason: ResolutionFailure::MalformedCondition(_),
                        ..
                    }
                ),
                "condition {condition:?} should be rejected"
            );
        }
    }

    #[test]
    fn reversed_condition_is_a_table_mismatch() {
        let models = vec![model("a", Some("id")), model("b", Some("id"))];
        let rels = vec![rel("a", "b", JoinType::OneToOne, "b.y = a.x")];
        let err = RelationshipResolver::new(&models, &rels)
            .resolve("a")
            .unwrap_err();
        assert!(matches!(
            err,
            MdlError::RelationshipResolution {
                reason: ResolutionFailure::TableMismatch { .. },
                ..
            }
        ));
    }
}
