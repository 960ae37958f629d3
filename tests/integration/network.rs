#![allow(clippy::all)]

mod common;

use common::{memory_conn, seed, seed_numbered, suppliers_schema};
use vgraph::{Direction, GraphError, Result, SafetyLimits, VirtualGraph};

#[test]
fn outbound_centrality_ranks_the_hub_first() -> Result<()> {
    let conn = memory_conn();
    let schema = suppliers_schema();
    seed_numbered(
        &conn,
        &schema,
        4,
        &[(1, 2, 0.0), (1, 3, 0.0), (1, 4, 0.0), (2, 3, 0.0)],
    );
    let graph = VirtualGraph::new(&conn, schema)?;

    let scores = graph.degree_centrality(Direction::Outbound, 10)?;

    assert_eq!(scores[0].node, 1);
    assert_eq!(scores[0].degree, 3);
    assert_eq!(scores[1].node, 2);
    assert_eq!(scores[1].degree, 1);
    Ok(())
}

#[test]
fn inbound_centrality_counts_incoming_edges() -> Result<()> {
    let conn = memory_conn();
    let schema = suppliers_schema();
    seed_numbered(
        &conn,
        &schema,
        4,
        &[(1, 3, 0.0), (2, 3, 0.0), (4, 3, 0.0), (1, 2, 0.0)],
    );
    let graph = VirtualGraph::new(&conn, schema)?;

    let scores = graph.degree_centrality(Direction::Inbound, 10)?;

    assert_eq!(scores[0].node, 3);
    assert_eq!(scores[0].degree, 3);
    Ok(())
}

#[test]
fn both_direction_sums_in_and_out() -> Result<()> {
    let conn = memory_conn();
    let schema = suppliers_schema();
    seed_numbered(&conn, &schema, 3, &[(1, 2, 0.0), (2, 3, 0.0)]);
    let graph = VirtualGraph::new(&conn, schema)?;

    let scores = graph.degree_centrality(Direction::Both, 10)?;

    assert_eq!(scores[0].node, 2);
    assert_eq!(scores[0].degree, 2);
    Ok(())
}

#[test]
fn centrality_respects_top_k() -> Result<()> {
    let conn = memory_conn();
    let schema = suppliers_schema();
    seed_numbered(
        &conn,
        &schema,
        5,
        &[(1, 2, 0.0), (2, 3, 0.0), (3, 4, 0.0), (4, 5, 0.0)],
    );
    let graph = VirtualGraph::new(&conn, schema)?;

    let scores = graph.degree_centrality(Direction::Outbound, 2)?;
    assert_eq!(scores.len(), 2);
    Ok(())
}

#[test]
fn components_split_islands_and_singletons() -> Result<()> {
    let conn = memory_conn();
    let schema = suppliers_schema();
    // Island {1,2,3}, island {4,5}, isolated 6.
    seed_numbered(
        &conn,
        &schema,
        6,
        &[(1, 2, 0.0), (2, 3, 0.0), (4, 5, 0.0)],
    );
    let graph = VirtualGraph::new(&conn, schema)?;

    let result = graph.connected_components()?;

    assert_eq!(result.component_count, 3);
    assert_eq!(result.nodes_seen, 6);
    assert_eq!(result.components[0], vec![1, 2, 3]);
    assert_eq!(result.components[1], vec![4, 5]);
    assert_eq!(result.components[2], vec![6]);
    Ok(())
}

#[test]
fn components_treat_edges_as_undirected() -> Result<()> {
    let conn = memory_conn();
    let schema = suppliers_schema();
    seed_numbered(&conn, &schema, 3, &[(2, 1, 0.0), (2, 3, 0.0)]);
    let graph = VirtualGraph::new(&conn, schema)?;

    let result = graph.connected_components()?;
    assert_eq!(result.component_count, 1);
    assert_eq!(result.components[0], vec![1, 2, 3]);
    Ok(())
}

#[test]
fn deleting_a_bridge_splits_the_component() -> Result<()> {
    let conn = memory_conn();
    let schema = suppliers_schema().with_soft_delete("deleted_at");
    seed(
        &conn,
        &schema,
        &[(1, "a", 0), (2, "bridge", 0), (3, "c", 0)],
        &[(1, 2, 0.0), (2, 3, 0.0)],
    );
    conn.execute(
        "UPDATE suppliers SET deleted_at = '2024-06-01T00:00:00Z' WHERE id = 2",
        [],
    )
    .expect("delete bridge");
    let graph = VirtualGraph::new(&conn, schema)?;

    let result = graph.connected_components()?;

    assert_eq!(result.component_count, 2);
    assert_eq!(result.nodes_seen, 2);
    assert!(result.components.iter().all(|c| !c.contains(&2)));
    Ok(())
}

#[test]
fn oversized_graphs_are_refused() -> Result<()> {
    let conn = memory_conn();
    let schema = suppliers_schema();
    seed_numbered(&conn, &schema, 5, &[(1, 2, 0.0)]);
    let limits = SafetyLimits {
        max_nodes: 3,
        ..SafetyLimits::default()
    };
    let graph = VirtualGraph::with_limits(&conn, schema, limits)?;

    let err = graph.connected_components().expect_err("too many nodes");
    assert!(matches!(err, GraphError::SafetyLimitExceeded(_)));
    Ok(())
}
