//! The linked schema graph.
//!
//! A [`SchemaGraph`] is only built by the [`Normalizer`] and only edited
//! through [`SchemaGraph::add_reference`] / [`SchemaGraph::remove_reference`].
//! Everything else sees it read-only, which keeps these invariants without
//! revalidating the whole graph after each edit:
//!
//! 1. every reference targets an existing primary-key column,
//! 2. constraint names are unique within a referencing table,
//! 3. a column is a foreign key iff it owns at least one reference,
//! 4. every `(table, column)` identity occurs exactly once.

mod mutate;
mod normalize;

use std::collections::{HashMap, HashSet};

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::catalog::SqlType;
use crate::error::{Result, SchemaError};

pub use normalize::{normalize, Normalizer};

/// Which end of a reference the holder of the edge sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Held by the referencing (child) column.
    Outgoing,
    /// Viewed from the referenced (parent) column.
    Incoming,
}

/// One foreign-key linkage from `source` to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEdge {
    pub constraint_name: String,
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    pub direction: Direction,
}

impl ReferenceEdge {
    fn outgoing(
        constraint_name: &str,
        source_table: &str,
        source_column: &str,
        target_table: &str,
        target_column: &str,
    ) -> Self {
        Self {
            constraint_name: constraint_name.to_string(),
            source_table: source_table.to_string(),
            source_column: source_column.to_string(),
            target_table: target_table.to_string(),
            target_column: target_column.to_string(),
            direction: Direction::Outgoing,
        }
    }

    /// The same edge seen from its other end.
    pub fn reversed(&self) -> Self {
        let direction = match self.direction {
            Direction::Outgoing => Direction::Incoming,
            Direction::Incoming => Direction::Outgoing,
        };
        Self {
            direction,
            ..self.clone()
        }
    }

    pub fn is_self_reference(&self) -> bool {
        self.source_table == self.target_table
    }

    fn targets(&self, table: &str, column: &str) -> bool {
        self.target_table == table && self.target_column == column
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNode {
    table: String,
    name: String,
    sql_type: SqlType,
    not_null: bool,
    is_primary_key: bool,
    references: Vec<ReferenceEdge>,
}

impl ColumnNode {
    fn new(table: &str, name: &str, sql_type: SqlType, not_null: bool) -> Self {
        Self {
            table: table.to_string(),
            name: name.to_string(),
            sql_type,
            not_null,
            is_primary_key: false,
            references: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    pub fn is_nullable(&self) -> bool {
        !self.not_null
    }

    /// `NOT NULL` when the catalog marked the column non-nullable.
    pub fn nullable_constraint(&self) -> Option<&'static str> {
        self.not_null.then_some("NOT NULL")
    }

    pub fn is_primary_key(&self) -> bool {
        self.is_primary_key
    }

    pub fn is_foreign_key(&self) -> bool {
        !self.references.is_empty()
    }

    /// Outgoing references, in the order they were added.
    pub fn references(&self) -> &[ReferenceEdge] {
        &self.references
    }
}

impl Serialize for ColumnNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ColumnNode", 7)?;
        s.serialize_field("table", &self.table)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("data_type", &self.sql_type)?;
        s.serialize_field("additional_constraints", &self.nullable_constraint())?;
        s.serialize_field("is_primary_key", &self.is_primary_key)?;
        s.serialize_field("is_foreign_key", &self.is_foreign_key())?;
        s.serialize_field("references", &self.references)?;
        s.end()
    }
}

/// A table and its columns in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableNode {
    name: String,
    columns: Vec<ColumnNode>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl TableNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnNode] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnNode> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    /// All outgoing references declared by this table's columns.
    pub fn references(&self) -> impl Iterator<Item = &ReferenceEdge> {
        self.columns.iter().flat_map(|c| c.references.iter())
    }

    pub fn has_constraint(&self, constraint_name: &str) -> bool {
        self.references()
            .any(|edge| edge.constraint_name == constraint_name)
    }

    fn column_mut(&mut self, name: &str) -> Option<&mut ColumnNode> {
        let i = *self.index.get(name)?;
        Some(&mut self.columns[i])
    }

    /// Returns false if a column with the same name is already present.
    fn insert_column(&mut self, column: ColumnNode) -> bool {
        if self.index.contains_key(&column.name) {
            return false;
        }
        self.index.insert(column.name.clone(), self.columns.len());
        self.columns.push(column);
        true
    }
}

/// Tables keyed by name, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaGraph {
    tables: Vec<TableNode>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl SchemaGraph {
    pub fn tables(&self) -> &[TableNode] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableNode> {
        self.index.get(name).map(|&i| &self.tables[i])
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnNode> {
        self.table(table)?.column(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnNode> {
        self.tables.iter().flat_map(|t| t.columns.iter())
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &ColumnNode> {
        self.columns().filter(|c| c.is_primary_key)
    }

    /// Every outgoing reference in the graph.
    pub fn references(&self) -> impl Iterator<Item = &ReferenceEdge> {
        self.tables.iter().flat_map(|t| t.references())
    }

    /// References pointing at `table.column`, seen from the target side.
    pub fn references_to(&self, table: &str, column: &str) -> Vec<ReferenceEdge> {
        self.references()
            .filter(|edge| edge.targets(table, column))
            .map(ReferenceEdge::reversed)
            .collect()
    }

    /// Tables with at least one column referencing `table`, in graph order.
    pub fn referencing_tables(&self, table: &str) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| t.references().any(|edge| edge.target_table == table))
            .map(|t| t.name.as_str())
            .collect()
    }

    /// Tables that `table` references, in first-reference order.
    pub fn referenced_tables(&self, table: &str) -> Vec<&str> {
        let mut seen = HashSet::new();
        let Some(node) = self.table(table) else {
            return Vec::new();
        };
        node.references()
            .map(|edge| edge.target_table.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Verify invariants 1, 2 and 4 over the whole graph.
    pub fn check_invariants(&self) -> Result<()> {
        for table in &self.tables {
            let mut seen_columns = HashSet::new();
            let mut seen_constraints = HashSet::new();
            for column in &table.columns {
                if column.table != table.name || !seen_columns.insert(column.name.as_str()) {
                    return Err(SchemaError::DuplicateColumn {
                        table: column.table.clone(),
                        column: column.name.clone(),
                    });
                }
                for edge in &column.references {
                    if !seen_constraints.insert(edge.constraint_name.as_str()) {
                        return Err(SchemaError::DuplicateConstraintName {
                            table: table.name.clone(),
                            constraint: edge.constraint_name.clone(),
                        });
                    }
                }
            }
        }
        self.check_reference_targets()
    }

    /// Invariant 1: each reference lands on a primary-key column.
    fn check_reference_targets(&self) -> Result<()> {
        for edge in self.references() {
            let is_key = self
                .column(&edge.target_table, &edge.target_column)
                .is_some_and(ColumnNode::is_primary_key);
            if !is_key {
                return Err(SchemaError::DanglingReference {
                    constraint: edge.constraint_name.clone(),
                    table: edge.source_table.clone(),
                    column: edge.source_column.clone(),
                    target_table: edge.target_table.clone(),
                    target_column: edge.target_column.clone(),
                });
            }
        }
        Ok(())
    }

    fn table_mut(&mut self, name: &str) -> Option<&mut TableNode> {
        let i = *self.index.get(name)?;
        Some(&mut self.tables[i])
    }

    fn column_mut(&mut self, table: &str, column: &str) -> Option<&mut ColumnNode> {
        self.table_mut(table)?.column_mut(column)
    }

    fn ensure_table(&mut self, name: &str) -> &mut TableNode {
        let i = match self.index.get(name) {
            Some(&i) => i,
            None => {
                self.index.insert(name.to_string(), self.tables.len());
                self.tables.push(TableNode::new(name));
                self.tables.len() - 1
            }
        };
        &mut self.tables[i]
    }
}
