#![allow(dead_code)]

use rusqlite::Connection;
use vgraph::datagen;
use vgraph::{GraphSchema, NodeId};

/// Opens an in-memory store for one test.
pub fn memory_conn() -> Connection {
    Connection::open_in_memory().expect("open in-memory store")
}

/// Bill-of-materials shape: parts wired by quantity-weighted edges.
pub fn parts_schema() -> GraphSchema {
    GraphSchema::new("parts", "bill_of_materials", "parent_part_id", "child_part_id")
        .with_weight_col("quantity")
}

/// Transport network shape: facilities wired by distance-weighted
/// routes.
pub fn facilities_schema() -> GraphSchema {
    GraphSchema::new(
        "facilities",
        "transport_routes",
        "origin_facility_id",
        "destination_facility_id",
    )
    .with_weight_col("distance_km")
}

/// Supply-chain shape: suppliers wired seller-to-buyer, unweighted.
pub fn suppliers_schema() -> GraphSchema {
    GraphSchema::new("suppliers", "supplier_relationships", "seller_id", "buyer_id")
}

/// Installs the DDL for `schema` and seeds the given nodes and edges.
/// Node tuples are `(id, name, tier)`, edge tuples `(from, to, weight)`.
pub fn seed(
    conn: &Connection,
    schema: &GraphSchema,
    nodes: &[(NodeId, &str, i64)],
    edges: &[(NodeId, NodeId, f64)],
) {
    datagen::install_schema(conn, schema).expect("install schema");
    for &(id, name, tier) in nodes {
        datagen::insert_node(conn, schema, id, name, tier).expect("insert node");
    }
    for &(from, to, weight) in edges {
        datagen::insert_edge(conn, schema, from, to, Some(weight)).expect("insert edge");
    }
}

/// Seeds plain numbered nodes `1..=count` plus the given edges.
pub fn seed_numbered(
    conn: &Connection,
    schema: &GraphSchema,
    count: NodeId,
    edges: &[(NodeId, NodeId, f64)],
) {
    let nodes: Vec<(NodeId, String, i64)> =
        (1..=count).map(|id| (id, format!("n{id}"), 0)).collect();
    datagen::install_schema(conn, schema).expect("install schema");
    for (id, name, tier) in &nodes {
        datagen::insert_node(conn, schema, *id, name, *tier).expect("insert node");
    }
    for &(from, to, weight) in edges {
        datagen::insert_edge(conn, schema, from, to, Some(weight)).expect("insert edge");
    }
}
