//! The schema binding: identifier strings naming the node and edge
//! tables a handler call operates on.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sql::ident;

/// Names the relational shape of one graph: a node table, an edge
/// table, and the columns connecting them.
///
/// Every field is an identifier subject to allow-list validation; the
/// engine never interpolates an unvalidated string. Bindings usually
/// come from an [`Ontology`](crate::ontology::Ontology), but any source
/// of the same strings is equally valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSchema {
    /// Table holding vertex rows.
    pub nodes_table: String,
    /// Table holding directed edge rows.
    pub edges_table: String,
    /// Edge column referencing the origin node's primary key.
    pub edge_from_col: String,
    /// Edge column referencing the destination node's primary key.
    pub edge_to_col: String,
    /// Primary-key column of the node table. Defaults to `id`.
    pub node_pk_col: String,
    /// Numeric edge column used by weighted pathfinding, when present.
    pub weight_col: Option<String>,
    /// Node column whose non-NULL value marks a soft-deleted row.
    pub soft_delete_col: Option<String>,
    /// Ordering applied to hydrated rows: `col`, `col ASC`, `col DESC`.
    pub order_by: Option<String>,
}

impl GraphSchema {
    /// Creates a binding with the default `id` primary key and no
    /// optional columns.
    pub fn new(
        nodes_table: impl Into<String>,
        edges_table: impl Into<String>,
        edge_from_col: impl Into<String>,
        edge_to_col: impl Into<String>,
    ) -> Self {
        Self {
            nodes_table: nodes_table.into(),
            edges_table: edges_table.into(),
            edge_from_col: edge_from_col.into(),
            edge_to_col: edge_to_col.into(),
            node_pk_col: "id".to_string(),
            weight_col: None,
            soft_delete_col: None,
            order_by: None,
        }
    }

    /// Overrides the primary-key column.
    pub fn with_pk_col(mut self, col: impl Into<String>) -> Self {
        self.node_pk_col = col.into();
        self
    }

    /// Names the edge weight column.
    pub fn with_weight_col(mut self, col: impl Into<String>) -> Self {
        self.weight_col = Some(col.into());
        self
    }

    /// Names the soft-delete timestamp column on the node table.
    pub fn with_soft_delete(mut self, col: impl Into<String>) -> Self {
        self.soft_delete_col = Some(col.into());
        self
    }

    /// Sets the hydration ordering (`col`, `col ASC`, or `col DESC`).
    pub fn with_order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by = Some(expr.into());
        self
    }

    /// Validates every identifier in the binding against the
    /// allow-list. Called once when an engine is constructed.
    pub fn validate(&self) -> Result<()> {
        ident::validate_identifier(&self.nodes_table)?;
        ident::validate_identifier(&self.edges_table)?;
        ident::validate_identifier(&self.edge_from_col)?;
        ident::validate_identifier(&self.edge_to_col)?;
        ident::validate_identifier(&self.node_pk_col)?;
        if let Some(col) = &self.weight_col {
            ident::validate_identifier(col)?;
        }
        if let Some(col) = &self.soft_delete_col {
            ident::validate_identifier(col)?;
        }
        if let Some(expr) = &self.order_by {
            ident::parse_order_by(expr)?;
        }
        Ok(())
    }
}
