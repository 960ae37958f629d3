#![allow(clippy::all)]

mod common;

use std::collections::HashSet;

use common::{memory_conn, seed};
use vgraph::{
    AggregateOp, AggregateOptions, GraphSchema, NodeId, PathfindOptions, Result,
    TraverseOptions, VirtualGraph,
};

fn schema_with_soft_delete() -> GraphSchema {
    GraphSchema::new("suppliers", "supplier_relationships", "seller_id", "buyer_id")
        .with_soft_delete("deleted_at")
}

fn mark_deleted(conn: &rusqlite::Connection, id: NodeId) {
    conn.execute(
        "UPDATE suppliers SET deleted_at = '2024-01-01T00:00:00Z' WHERE id = ?",
        [id],
    )
    .expect("mark deleted");
}

#[test]
fn deleted_nodes_are_invisible_to_traversal() -> Result<()> {
    let conn = memory_conn();
    let schema = schema_with_soft_delete();
    seed(
        &conn,
        &schema,
        &[(1, "a", 1), (2, "b", 2), (3, "c", 3)],
        &[(1, 2, 0.0), (2, 3, 0.0), (1, 3, 0.0)],
    );
    mark_deleted(&conn, 2);
    let graph = VirtualGraph::new(&conn, schema)?;

    let result = graph.traverse(1, &TraverseOptions::default())?;

    let visited: HashSet<NodeId> = result.nodes.iter().map(|n| n.id).collect();
    assert_eq!(visited, HashSet::from([1, 3]));
    assert_eq!(result.nodes_visited, 2);
    for path in result.paths.values() {
        assert!(!path.contains(&2));
    }
    // Node 3 is still reachable, but only through the direct edge.
    assert_eq!(result.paths[&3], vec![1, 3]);
    Ok(())
}

#[test]
fn edges_through_deleted_nodes_are_cut() -> Result<()> {
    let conn = memory_conn();
    let schema = schema_with_soft_delete();
    seed(
        &conn,
        &schema,
        &[(1, "a", 1), (2, "b", 2), (3, "c", 3)],
        &[(1, 2, 0.0), (2, 3, 0.0)],
    );
    mark_deleted(&conn, 2);
    let graph = VirtualGraph::new(&conn, schema)?;

    let result = graph.traverse(1, &TraverseOptions::default())?;

    // With the only route running through the deleted node, nothing
    // beyond the start is reachable.
    assert_eq!(result.nodes_visited, 1);
    let visited: HashSet<NodeId> = result.nodes.iter().map(|n| n.id).collect();
    assert_eq!(visited, HashSet::from([1]));
    Ok(())
}

#[test]
fn without_the_column_declared_deleted_rows_still_appear() -> Result<()> {
    let conn = memory_conn();
    let seeded = schema_with_soft_delete();
    seed(
        &conn,
        &seeded,
        &[(1, "a", 1), (2, "b", 2), (3, "c", 3)],
        &[(1, 2, 0.0), (2, 3, 0.0)],
    );
    mark_deleted(&conn, 2);
    // Same store, but the binding does not declare the column.
    let unfiltered =
        GraphSchema::new("suppliers", "supplier_relationships", "seller_id", "buyer_id");
    let graph = VirtualGraph::new(&conn, unfiltered)?;

    let result = graph.traverse(1, &TraverseOptions::default())?;

    assert_eq!(result.nodes_visited, 3);
    Ok(())
}

#[test]
fn weighted_pathfinding_routes_around_deleted_nodes() -> Result<()> {
    let conn = memory_conn();
    let schema = GraphSchema::new("facilities", "transport_routes", "origin_id", "dest_id")
        .with_weight_col("distance_km")
        .with_soft_delete("deleted_at");
    seed(
        &conn,
        &schema,
        &[(1, "chicago", 0), (2, "denver", 0), (3, "la", 0)],
        &[(1, 2, 1.0), (2, 3, 1.0), (1, 3, 5.0)],
    );
    mark_deleted(&conn, 2);
    let graph = VirtualGraph::new(&conn, schema)?;

    let result = graph.shortest_path(1, 3, &PathfindOptions::default())?;

    assert_eq!(result.path, Some(vec![1, 3]));
    assert_eq!(result.distance, Some(5.0));
    Ok(())
}

#[test]
fn aggregation_ignores_paths_through_deleted_nodes() -> Result<()> {
    let conn = memory_conn();
    let schema = GraphSchema::new("parts", "bill_of_materials", "parent_part_id", "child_part_id")
        .with_weight_col("quantity")
        .with_soft_delete("deleted_at");
    // Diamond with one arm deleted: only the surviving arm counts.
    seed(
        &conn,
        &schema,
        &[(1, "root", 0), (2, "a", 1), (3, "b", 1), (4, "x", 2)],
        &[(1, 2, 2.0), (1, 3, 3.0), (2, 4, 5.0), (3, 4, 4.0)],
    );
    mark_deleted(&conn, 3);
    let graph = VirtualGraph::new(&conn, schema)?;

    let opts = AggregateOptions::new("quantity", AggregateOp::Multiply).with_max_depth(3);
    let result = graph.path_aggregate(1, &opts)?;

    assert_eq!(result.aggregated_values[&4], 10.0);
    assert!(!result.aggregated_values.contains_key(&3));
    for node in &result.nodes {
        assert_ne!(node.id, 3);
    }
    Ok(())
}

#[test]
fn live_rows_pass_the_filter_untouched() -> Result<()> {
    let conn = memory_conn();
    let schema = schema_with_soft_delete();
    seed(
        &conn,
        &schema,
        &[(1, "a", 1), (2, "b", 2), (3, "c", 3)],
        &[(1, 2, 0.0), (2, 3, 0.0)],
    );
    let graph = VirtualGraph::new(&conn, schema)?;

    let result = graph.traverse(1, &TraverseOptions::default())?;

    assert_eq!(result.nodes_visited, 3);
    Ok(())
}

#[test]
fn filtering_on_a_missing_column_is_a_store_error() -> Result<()> {
    let conn = memory_conn();
    // Install tables without the soft-delete column, then bind one.
    let plain = GraphSchema::new("suppliers", "supplier_relationships", "seller_id", "buyer_id");
    seed(&conn, &plain, &[(1, "a", 1), (2, "b", 2)], &[(1, 2, 0.0)]);
    let bound = plain.with_soft_delete("nonexistent_column");
    let graph = VirtualGraph::new(&conn, bound)?;

    let result = graph.traverse(1, &TraverseOptions::default());
    assert!(result.is_err());
    Ok(())
}
