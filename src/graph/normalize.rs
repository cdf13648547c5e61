//! Catalog rows to a fully linked [`SchemaGraph`].
//!
//! Runs in three steps so that row order never matters:
//! columns first, then constraints, then a reconciliation pass that checks
//! every reference target became a primary key.

use tracing::{debug, info, instrument, warn};

use super::{ColumnNode, ReferenceEdge, SchemaGraph};
use crate::catalog::{
    canonicalize, CatalogRows, ColumnDescriptor, ConstraintDescriptor, ConstraintKind, Dialect,
};
use crate::error::{Result, SchemaError};

/// Builds schema graphs from catalog rows of one engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    dialect: Dialect,
}

/// Normalize PostgreSQL catalog rows.
pub fn normalize(
    columns: &[ColumnDescriptor],
    constraints: &[ConstraintDescriptor],
) -> Result<SchemaGraph> {
    Normalizer::default().normalize(columns, constraints)
}

impl Normalizer {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn normalize_rows(&self, rows: &CatalogRows) -> Result<SchemaGraph> {
        self.normalize(&rows.columns, &rows.constraints)
    }

    /// Either a graph satisfying every invariant or the first error found.
    #[instrument(skip_all, fields(
        dialect = self.dialect.name(),
        columns = columns.len(),
        constraints = constraints.len()
    ))]
    pub fn normalize(
        &self,
        columns: &[ColumnDescriptor],
        constraints: &[ConstraintDescriptor],
    ) -> Result<SchemaGraph> {
        let mut graph = SchemaGraph::default();

        for desc in columns {
            self.add_column(&mut graph, desc)?;
        }
        debug!(tables = graph.tables.len(), "column pass complete");

        for desc in constraints {
            apply_constraint(&mut graph, desc)?;
        }
        debug!("constraint pass complete");

        if let Err(err) = graph.check_reference_targets() {
            warn!(%err, "reconciliation failed");
            return Err(err);
        }

        info!(
            tables = graph.tables.len(),
            references = graph.references().count(),
            "schema normalized"
        );
        Ok(graph)
    }

    fn add_column(&self, graph: &mut SchemaGraph, desc: &ColumnDescriptor) -> Result<()> {
        let sql_type = canonicalize(&desc.data_type, self.dialect).map_err(|source| {
            SchemaError::UnsupportedType {
                table: desc.table_name.clone(),
                column: desc.column_name.clone(),
                source,
            }
        })?;

        let column = ColumnNode::new(
            &desc.table_name,
            &desc.column_name,
            sql_type,
            !desc.is_nullable,
        );
        if !graph.ensure_table(&desc.table_name).insert_column(column) {
            return Err(SchemaError::DuplicateColumn {
                table: desc.table_name.clone(),
                column: desc.column_name.clone(),
            });
        }
        Ok(())
    }
}

fn apply_constraint(graph: &mut SchemaGraph, desc: &ConstraintDescriptor) -> Result<()> {
    let table = desc.table_name.as_str();
    let column = desc.column_name.as_str();

    match &desc.kind {
        ConstraintKind::PrimaryKey => {
            let node = graph
                .column_mut(table, column)
                .ok_or_else(|| SchemaError::unknown_column(table, column))?;
            node.is_primary_key = true;
        }
        ConstraintKind::ForeignKey {
            table: target_table,
            column: target_column,
        } => {
            if graph.column(table, column).is_none() {
                return Err(SchemaError::unknown_column(table, column));
            }
            if graph.column(target_table, target_column).is_none() {
                return Err(SchemaError::unknown_column(target_table, target_column));
            }

            let owner = graph
                .table_mut(table)
                .ok_or_else(|| SchemaError::unknown_column(table, column))?;
            if owner.has_constraint(&desc.constraint_name) {
                return Err(SchemaError::DuplicateConstraintName {
                    table: table.to_string(),
                    constraint: desc.constraint_name.clone(),
                });
            }

            let edge = ReferenceEdge::outgoing(
                &desc.constraint_name,
                table,
                column,
                target_table,
                target_column,
            );
            let node = owner
                .column_mut(column)
                .ok_or_else(|| SchemaError::unknown_column(table, column))?;
            node.references.push(edge);
        }
    }

    debug!(constraint = %desc.constraint_name, table, column, "constraint applied");
    Ok(())
}
