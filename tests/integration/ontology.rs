#![allow(clippy::all)]

mod common;

use common::{memory_conn, seed};
use vgraph::{GraphError, Ontology, Result, TraverseOptions, VirtualGraph};

const SUPPLY_CHAIN: &str = r#"
[meta]
name = "supply_chain"
version = "1.2"

[classes.Supplier]
table = "suppliers"
primary_key = "id"
identifier = ["name"]
soft_delete = "deleted_at"
row_count = 5000

[classes.Facility]
table = "facilities"
primary_key = "id"

[roles.supplies_to]
domain = "Supplier"
range = "Supplier"
table = "supplier_relationships"
domain_key = "seller_id"
range_key = "buyer_id"
row_count = 20000

[roles.supplies_to.properties]
transitive = true
acyclic = true

[roles.ships_to]
domain = "Facility"
range = "Facility"
table = "transport_routes"
domain_key = "origin_facility_id"
range_key = "destination_facility_id"
weight_columns = ["distance_km", "cost_usd"]

[roles.ships_to.properties]
is_weighted = true
"#;

#[test]
fn accessors_expose_the_binding_surface() -> Result<()> {
    let ontology = Ontology::from_toml_str(SUPPLY_CHAIN)?;

    assert_eq!(ontology.meta.name, "supply_chain");
    assert_eq!(ontology.meta.version, "1.2");

    assert_eq!(ontology.get_class_table("Supplier")?, "suppliers");
    assert_eq!(ontology.get_class_pk("Supplier")?, "id");
    assert_eq!(
        ontology.get_class_soft_delete("Supplier")?,
        Some("deleted_at")
    );
    assert_eq!(ontology.get_class_soft_delete("Facility")?, None);
    assert_eq!(ontology.get_class_identifier("Supplier")?, ["name"]);

    assert_eq!(ontology.get_role_table("supplies_to")?, "supplier_relationships");
    assert_eq!(
        ontology.get_role_keys("supplies_to")?,
        ("seller_id", "buyer_id")
    );
    assert_eq!(
        ontology.get_role_weight_columns("ships_to")?,
        ["distance_km", "cost_usd"]
    );
    assert!(ontology.is_role_acyclic("supplies_to")?);
    assert!(ontology.is_role_weighted("ships_to")?);
    assert!(!ontology.is_role_weighted("supplies_to")?);
    Ok(())
}

#[test]
fn unknown_names_are_ontology_errors() -> Result<()> {
    let ontology = Ontology::from_toml_str(SUPPLY_CHAIN)?;

    assert!(matches!(
        ontology.get_class_table("Widget"),
        Err(GraphError::Ontology(_))
    ));
    assert!(matches!(
        ontology.get_role_table("made_of"),
        Err(GraphError::Ontology(_))
    ));
    Ok(())
}

#[test]
fn malformed_documents_fail_to_parse() {
    assert!(matches!(
        Ontology::from_toml_str("not really toml ["),
        Err(GraphError::Ontology(_))
    ));
}

#[test]
fn schema_for_role_binds_the_range_class() -> Result<()> {
    let ontology = Ontology::from_toml_str(SUPPLY_CHAIN)?;

    let schema = ontology.schema_for_role("supplies_to")?;
    assert_eq!(schema.nodes_table, "suppliers");
    assert_eq!(schema.edges_table, "supplier_relationships");
    assert_eq!(schema.edge_from_col, "seller_id");
    assert_eq!(schema.edge_to_col, "buyer_id");
    assert_eq!(schema.soft_delete_col.as_deref(), Some("deleted_at"));
    assert!(schema.weight_col.is_none());

    let weighted = ontology.schema_for_role("ships_to")?;
    assert_eq!(weighted.weight_col.as_deref(), Some("distance_km"));
    Ok(())
}

#[test]
fn weighted_binding_requires_a_declared_column() -> Result<()> {
    let ontology = Ontology::from_toml_str(SUPPLY_CHAIN)?;

    let schema = ontology.schema_for_role_weighted("ships_to", "cost_usd")?;
    assert_eq!(schema.weight_col.as_deref(), Some("cost_usd"));

    assert!(matches!(
        ontology.schema_for_role_weighted("ships_to", "transit_hours"),
        Err(GraphError::Ontology(_))
    ));
    Ok(())
}

#[test]
fn hostile_identifiers_in_the_document_are_caught_at_binding() -> Result<()> {
    let hostile = r#"
[meta]
name = "bad"
version = "0"

[classes.Thing]
table = "things; DROP TABLE things"

[roles.contains]
domain = "Thing"
range = "Thing"
table = "thing_edges"
domain_key = "parent_id"
range_key = "child_id"
"#;
    let ontology = Ontology::from_toml_str(hostile)?;
    assert!(matches!(
        ontology.schema_for_role("contains"),
        Err(GraphError::InvalidIdentifier(_))
    ));
    Ok(())
}

#[test]
fn ontology_derived_binding_drives_a_traversal() -> Result<()> {
    let ontology = Ontology::from_toml_str(SUPPLY_CHAIN)?;
    let schema = ontology.schema_for_role("supplies_to")?;

    let conn = memory_conn();
    seed(
        &conn,
        &schema,
        &[(1, "acme", 1), (2, "globaltech", 2), (3, "pacific", 3)],
        &[(1, 2, 0.0), (2, 3, 0.0)],
    );
    let graph = VirtualGraph::new(&conn, schema)?;

    let result = graph.traverse(1, &TraverseOptions::default())?;
    assert_eq!(result.nodes_visited, 3);
    assert_eq!(result.paths[&3], vec![1, 2, 3]);
    Ok(())
}
