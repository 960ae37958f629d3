//! Ontology accessor for the TBox/RBox schema-binding format.
//!
//! The TBox (terminological box) describes classes and the node tables
//! that store them; the RBox (role box) describes relationships and
//! the edge tables that realize them. The engine itself never reads an
//! ontology, it receives identifier strings, so any other source of
//! the same strings is equally valid. This accessor simply packages
//! the lookup surface and can assemble a validated [`GraphSchema`] for
//! a named role.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{GraphError, Result};
use crate::schema::GraphSchema;

/// Ontology metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    /// Ontology name.
    pub name: String,
    /// Ontology version string.
    pub version: String,
}

/// A TBox class: one kind of node and the table that stores it.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassDef {
    /// Node table name.
    pub table: String,
    /// Primary-key column. Defaults to `id`.
    #[serde(default = "default_pk")]
    pub primary_key: String,
    /// Natural-key columns, if declared.
    #[serde(default)]
    pub identifier: Vec<String>,
    /// Soft-delete timestamp column, when the class uses one.
    #[serde(default)]
    pub soft_delete: Option<String>,
    /// Estimated row count, when known.
    #[serde(default)]
    pub row_count: Option<u64>,
}

fn default_pk() -> String {
    "id".to_string()
}

/// OWL-style property flags on a role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleProperties {
    /// Role composes with itself.
    #[serde(default)]
    pub transitive: bool,
    /// Role holds in both directions.
    #[serde(default)]
    pub symmetric: bool,
    /// Role graph is a DAG.
    #[serde(default)]
    pub acyclic: bool,
    /// Role models a containment hierarchy.
    #[serde(default)]
    pub is_hierarchical: bool,
    /// Role edges carry weights.
    #[serde(default)]
    pub is_weighted: bool,
    /// Name of the inverse role, if declared.
    #[serde(default)]
    pub inverse_of: Option<String>,
}

/// An RBox role: one kind of edge and the table that realizes it.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleDef {
    /// Class the edge starts from.
    pub domain: String,
    /// Class the edge points to.
    pub range: String,
    /// Edge table name.
    pub table: String,
    /// FK column referencing the domain class.
    pub domain_key: String,
    /// FK column referencing the range class.
    pub range_key: String,
    /// Numeric columns usable as edge weights.
    #[serde(default)]
    pub weight_columns: Vec<String>,
    /// Property flags.
    #[serde(default)]
    pub properties: RoleProperties,
    /// Estimated edge count, when known.
    #[serde(default)]
    pub row_count: Option<u64>,
}

/// Accessor over a parsed TBox/RBox ontology document.
#[derive(Debug, Clone, Deserialize)]
pub struct Ontology {
    /// Document metadata.
    pub meta: Meta,
    /// TBox class definitions by name.
    pub classes: BTreeMap<String, ClassDef>,
    /// RBox role definitions by name.
    pub roles: BTreeMap<String, RoleDef>,
}

impl Ontology {
    /// Parses an ontology from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| GraphError::Ontology(err.to_string()))
    }

    /// Reads and parses an ontology file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|err| GraphError::Ontology(err.to_string()))?;
        Self::from_toml_str(&text)
    }

    fn class(&self, name: &str) -> Result<&ClassDef> {
        self.classes
            .get(name)
            .ok_or_else(|| GraphError::Ontology(format!("unknown class {name:?}")))
    }

    fn role(&self, name: &str) -> Result<&RoleDef> {
        self.roles
            .get(name)
            .ok_or_else(|| GraphError::Ontology(format!("unknown role {name:?}")))
    }

    /// Node table for a class.
    pub fn get_class_table(&self, name: &str) -> Result<&str> {
        Ok(&self.class(name)?.table)
    }

    /// Primary-key column for a class.
    pub fn get_class_pk(&self, name: &str) -> Result<&str> {
        Ok(&self.class(name)?.primary_key)
    }

    /// Soft-delete column for a class, when declared.
    pub fn get_class_soft_delete(&self, name: &str) -> Result<Option<&str>> {
        Ok(self.class(name)?.soft_delete.as_deref())
    }

    /// Natural-key columns for a class.
    pub fn get_class_identifier(&self, name: &str) -> Result<&[String]> {
        Ok(&self.class(name)?.identifier)
    }

    /// Edge table for a role.
    pub fn get_role_table(&self, name: &str) -> Result<&str> {
        Ok(&self.role(name)?.table)
    }

    /// FK columns for a role as `(domain_key, range_key)`.
    pub fn get_role_keys(&self, name: &str) -> Result<(&str, &str)> {
        let role = self.role(name)?;
        Ok((&role.domain_key, &role.range_key))
    }

    /// Weight columns declared for a role.
    pub fn get_role_weight_columns(&self, name: &str) -> Result<&[String]> {
        Ok(&self.role(name)?.weight_columns)
    }

    /// Domain class of a role.
    pub fn get_role_domain(&self, name: &str) -> Result<&str> {
        Ok(&self.role(name)?.domain)
    }

    /// Range class of a role.
    pub fn get_role_range(&self, name: &str) -> Result<&str> {
        Ok(&self.role(name)?.range)
    }

    /// Property flags of a role.
    pub fn get_role_properties(&self, name: &str) -> Result<&RoleProperties> {
        Ok(&self.role(name)?.properties)
    }

    /// Whether a role is declared acyclic.
    pub fn is_role_acyclic(&self, name: &str) -> Result<bool> {
        Ok(self.role(name)?.properties.acyclic)
    }

    /// Whether a role carries weighted edges.
    pub fn is_role_weighted(&self, name: &str) -> Result<bool> {
        Ok(self.role(name)?.properties.is_weighted)
    }

    /// Assembles a validated schema binding for a role.
    ///
    /// The node side binds the role's *range* class: the class whose
    /// rows an outbound traversal enters and hydrates. The first
    /// declared weight column, if any, becomes the binding's weight
    /// column.
    pub fn schema_for_role(&self, name: &str) -> Result<GraphSchema> {
        let role = self.role(name)?;
        let class = self.class(&role.range)?;
        let mut schema = GraphSchema::new(
            class.table.clone(),
            role.table.clone(),
            role.domain_key.clone(),
            role.range_key.clone(),
        )
        .with_pk_col(class.primary_key.clone());
        if let Some(col) = &class.soft_delete {
            schema = schema.with_soft_delete(col.clone());
        }
        if let Some(col) = role.weight_columns.first() {
            schema = schema.with_weight_col(col.clone());
        }
        schema.validate()?;
        Ok(schema)
    }

    /// Like [`schema_for_role`](Self::schema_for_role) but binds a
    /// specific declared weight column.
    pub fn schema_for_role_weighted(&self, name: &str, weight_col: &str) -> Result<GraphSchema> {
        let role = self.role(name)?;
        if !role.weight_columns.iter().any(|col| col == weight_col) {
            return Err(GraphError::Ontology(format!(
                "role {name:?} declares no weight column {weight_col:?}"
            )));
        }
        let mut schema = self.schema_for_role(name)?;
        schema.weight_col = Some(weight_col.to_string());
        schema.validate()?;
        Ok(schema)
    }
}
