//! Post-construction reference edits.
//!
//! Each call validates everything before touching the graph, so a rejected
//! edit leaves it unchanged. Callers sharing a graph across sessions must
//! serialize these calls.

use tracing::{info, warn};

use super::{ReferenceEdge, SchemaGraph};
use crate::error::{Result, SchemaError};

impl SchemaGraph {
    /// Link `referencing_table.referencing_column` to the primary key
    /// `target_table.target_column` under `constraint_name`.
    pub fn add_reference(
        &mut self,
        referencing_table: &str,
        referencing_column: &str,
        target_table: &str,
        target_column: &str,
        constraint_name: &str,
    ) -> Result<()> {
        let result = self.check_new_reference(
            referencing_table,
            referencing_column,
            target_table,
            target_column,
            constraint_name,
        );
        if let Err(err) = result {
            warn!(%err, "reference rejected");
            return Err(err);
        }

        let edge = ReferenceEdge::outgoing(
            constraint_name,
            referencing_table,
            referencing_column,
            target_table,
            target_column,
        );
        self.column_mut(referencing_table, referencing_column)
            .ok_or_else(|| SchemaError::unknown_column(referencing_table, referencing_column))?
            .references
            .push(edge);

        info!(
            constraint = constraint_name,
            table = referencing_table,
            column = referencing_column,
            target_table,
            target_column,
            "reference added"
        );
        Ok(())
    }

    /// Drop the reference named `constraint_name` from the column and
    /// return it.
    pub fn remove_reference(
        &mut self,
        referencing_table: &str,
        referencing_column: &str,
        constraint_name: &str,
    ) -> Result<ReferenceEdge> {
        let column = self
            .column_mut(referencing_table, referencing_column)
            .ok_or_else(|| SchemaError::unknown_column(referencing_table, referencing_column))?;

        let Some(pos) = column
            .references
            .iter()
            .position(|edge| edge.constraint_name == constraint_name)
        else {
            let err = SchemaError::UnknownConstraint {
                table: referencing_table.to_string(),
                column: referencing_column.to_string(),
                constraint: constraint_name.to_string(),
            };
            warn!(%err, "reference removal rejected");
            return Err(err);
        };

        let edge = column.references.remove(pos);
        info!(
            constraint = constraint_name,
            table = referencing_table,
            column = referencing_column,
            still_foreign_key = column.is_foreign_key(),
            "reference removed"
        );
        Ok(edge)
    }

    /// Default name for the next reference declared by
    /// `table.column`: `<table>_fk<n>`, bumped past names already used in
    /// the table.
    pub fn suggest_constraint_name(&self, table: &str, column: &str) -> Result<String> {
        let owner = self
            .table(table)
            .ok_or_else(|| SchemaError::unknown_column(table, column))?;
        let node = owner
            .column(column)
            .ok_or_else(|| SchemaError::unknown_column(table, column))?;

        let mut n = node.references.len() + 1;
        loop {
            let name = format!("{table}_fk{n}");
            if !owner.has_constraint(&name) {
                return Ok(name);
            }
            n += 1;
        }
    }

    fn check_new_reference(
        &self,
        referencing_table: &str,
        referencing_column: &str,
        target_table: &str,
        target_column: &str,
        constraint_name: &str,
    ) -> Result<()> {
        let owner = self
            .table(referencing_table)
            .ok_or_else(|| SchemaError::unknown_column(referencing_table, referencing_column))?;
        let source = owner
            .column(referencing_column)
            .ok_or_else(|| SchemaError::unknown_column(referencing_table, referencing_column))?;
        let target = self
            .column(target_table, target_column)
            .ok_or_else(|| SchemaError::unknown_column(target_table, target_column))?;

        if !target.is_primary_key() {
            return Err(SchemaError::InvalidReferenceTarget {
                table: target_table.to_string(),
                column: target_column.to_string(),
            });
        }

        if owner.has_constraint(constraint_name) {
            return Err(SchemaError::DuplicateConstraintName {
                table: referencing_table.to_string(),
                constraint: constraint_name.to_string(),
            });
        }

        if let Some(existing) = source
            .references
            .iter()
            .find(|edge| edge.targets(target_table, target_column))
        {
            return Err(SchemaError::DuplicateReference {
                table: referencing_table.to_string(),
                column: referencing_column.to_string(),
                target_table: target_table.to_string(),
                target_column: target_column.to_string(),
                existing: existing.constraint_name.clone(),
            });
        }

        Ok(())
    }
}
