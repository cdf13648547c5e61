//! Read-only projection of a [`SchemaGraph`] for diagram front ends.

use serde::Serialize;

use crate::graph::SchemaGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailLevel {
    Tables,
    Pk,
    PkFk,
    #[default]
    All,
}

impl DetailLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tables" => Some(Self::Tables),
            "pk" => Some(Self::Pk),
            "pk_fk" => Some(Self::PkFk),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    fn includes(self, is_pk: bool, is_fk: bool) -> bool {
        match self {
            Self::Tables => false,
            Self::Pk => is_pk,
            Self::PkFk => is_pk || is_fk,
            Self::All => true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphIR {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: String,
    /// Table name without its schema qualifier
    pub label: String,
    pub columns: Vec<ColumnIR>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnIR {
    pub name: String,
    pub typ: String,
    pub is_pk: bool,
    pub is_fk: bool,
    pub not_null: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub constraint: String,
    pub from: String,
    pub from_column: String,
    pub to: String,
    pub to_column: String,
    pub is_self_ref: bool,
}

impl GraphIR {
    /// Project `graph`, keeping only tables named in `include` when given.
    pub fn from_graph(graph: &SchemaGraph, include: Option<&[String]>, detail: DetailLevel) -> Self {
        let included = |table: &str| include.is_none_or(|names| names.iter().any(|n| n == table));

        let nodes: Vec<Node> = graph
            .tables()
            .iter()
            .filter(|t| included(t.name()))
            .map(|t| {
                let columns = t
                    .columns()
                    .iter()
                    .filter(|c| detail.includes(c.is_primary_key(), c.is_foreign_key()))
                    .map(|c| ColumnIR {
                        name: c.name().to_string(),
                        typ: c.sql_type().to_string(),
                        is_pk: c.is_primary_key(),
                        is_fk: c.is_foreign_key(),
                        not_null: !c.is_nullable(),
                    })
                    .collect();

                let label = t.name().rsplit('.').next().unwrap_or(t.name());
                Node {
                    id: t.name().to_string(),
                    label: label.to_string(),
                    columns,
                }
            })
            .collect();

        let edges: Vec<Edge> = graph
            .references()
            .filter(|e| included(&e.source_table) && included(&e.target_table))
            .map(|e| Edge {
                constraint: e.constraint_name.clone(),
                from: e.source_table.clone(),
                from_column: e.source_column.clone(),
                to: e.target_table.clone(),
                to_column: e.target_column.clone(),
                is_self_ref: e.is_self_reference(),
            })
            .collect();

        GraphIR { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDescriptor, ConstraintDescriptor};
    use crate::graph::normalize;

    fn graph() -> SchemaGraph {
        let columns = vec![
            ColumnDescriptor::new("public.users", "id", "integer", false),
            ColumnDescriptor::new("public.users", "name", "character varying", true),
            ColumnDescriptor::new("public.users", "email", "text", true),
            ColumnDescriptor::new("public.orders", "id", "integer", false),
            ColumnDescriptor::new("public.orders", "user_id", "integer", false),
            ColumnDescriptor::new("public.products", "id", "integer", false),
        ];
        let constraints = vec![
            ConstraintDescriptor::primary_key("users_pkey", "public.users", "id"),
            ConstraintDescriptor::primary_key("orders_pkey", "public.orders", "id"),
            ConstraintDescriptor::primary_key("products_pkey", "public.products", "id"),
            ConstraintDescriptor::foreign_key("orders_fk1", "public.orders", "user_id", "public.users", "id"),
        ];
        normalize(&columns, &constraints).unwrap()
    }

    #[test]
    fn test_ir_all_detail() {
        let ir = GraphIR::from_graph(&graph(), None, DetailLevel::All);

        assert_eq!(ir.nodes.len(), 3);
        assert_eq!(ir.nodes[0].columns.len(), 3);
        assert_eq!(ir.nodes[0].label, "users");
        assert_eq!(ir.nodes[0].columns[1].typ, "VARCHAR(255)");
        assert_eq!(ir.edges.len(), 1);
        assert_eq!(ir.edges[0].to, "public.users");
    }

    #[test]
    fn test_ir_pk_detail() {
        let ir = GraphIR::from_graph(&graph(), None, DetailLevel::Pk);

        assert_eq!(ir.nodes[0].columns.len(), 1);
        assert_eq!(ir.nodes[0].columns[0].name, "id");
    }

    #[test]
    fn test_ir_pk_fk_detail() {
        let ir = GraphIR::from_graph(&graph(), None, DetailLevel::PkFk);

        let orders = &ir.nodes[1];
        assert_eq!(orders.columns.len(), 2);
        assert!(orders.columns[1].is_fk);
        assert!(orders.columns[1].not_null);
    }

    #[test]
    fn test_ir_tables_detail() {
        let ir = GraphIR::from_graph(&graph(), None, DetailLevel::Tables);

        assert!(ir.nodes.iter().all(|n| n.columns.is_empty()));
        assert_eq!(ir.edges.len(), 1);
    }

    #[test]
    fn test_ir_with_include_list() {
        let include = vec!["public.orders".to_string(), "public.products".to_string()];
        let ir = GraphIR::from_graph(&graph(), Some(include.as_slice()), DetailLevel::All);

        assert_eq!(ir.nodes.len(), 2);
        assert!(ir.edges.is_empty());
    }

    #[test]
    fn test_detail_from_str() {
        assert_eq!(DetailLevel::from_str("pk_fk"), Some(DetailLevel::PkFk));
        assert_eq!(DetailLevel::from_str("columns"), None);
    }
}
