//! Derived views over a [`GraphSnapshot`]: filtering, statistics, and
//! entity neighborhoods.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::models::{GraphEdge, GraphNode, GraphSnapshot};

/// Aggregate structure of a graph snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub node_types: BTreeMap<String, usize>,
    pub edge_types: BTreeMap<String, usize>,
    /// Mean degree, `2E / N`.
    pub avg_connections: f64,
    /// Undirected density, `2E / (N (N - 1))`.
    pub density: f64,
}

/// Direction of a connection relative to the entity being inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionDirection {
    Outgoing,
    Incoming,
}

/// One edge touching an entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityConnection {
    pub edge_id: String,
    pub direction: ConnectionDirection,
    pub label: String,
    /// Id of the entity at the other end.
    pub entity_id: String,
}

/// An entity together with its immediate connections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDetail {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub description: Option<String>,
    pub metadata: serde_json::Value,
    pub connections: Vec<EntityConnection>,
}

impl GraphSnapshot {
    /// Keep nodes matching both filters (when given) and the edges whose
    /// endpoints both survive.
    pub fn filtered(&self, content_type: Option<&str>, document_id: Option<&str>) -> Self {
        let nodes: Vec<GraphNode> = self
            .nodes
            .iter()
            .filter(|n| content_type.map_or(true, |t| n.entity_type == t))
            .filter(|n| document_id.map_or(true, |d| n.source_document.as_deref() == Some(d)))
            .cloned()
            .collect();

        let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let edges: Vec<GraphEdge> = self
            .edges
            .iter()
            .filter(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
            .cloned()
            .collect();

        Self { nodes, edges }
    }

    pub fn stats(&self) -> GraphStats {
        let n = self.nodes.len();
        let e = self.edges.len();

        let mut node_types = BTreeMap::new();
        for node in &self.nodes {
            *node_types.entry(node.entity_type.clone()).or_insert(0) += 1;
        }
        let mut edge_types = BTreeMap::new();
        for edge in &self.edges {
            *edge_types.entry(edge.label.clone()).or_insert(0) += 1;
        }

        let avg_connections = if n == 0 {
            0.0
        } else {
            (2 * e) as f64 / n as f64
        };
        let density = if n < 2 {
            0.0
        } else {
            (2 * e) as f64 / (n * (n - 1)) as f64
        };

        GraphStats {
            total_nodes: n,
            total_edges: e,
            node_types,
            edge_types,
            avg_connections,
            density,
        }
    }

    /// Look up an entity and the edges touching it.
    pub fn entity(&self, id: &str) -> Option<EntityDetail> {
        let node = self.nodes.iter().find(|n| n.id == id)?;

        let connections = self
            .edges
            .iter()
            .filter_map(|edge| {
                if edge.source == id {
                    Some(EntityConnection {
                        edge_id: edge.id.clone(),
                        direction: ConnectionDirection::Outgoing,
                        label: edge.label.clone(),
                        entity_id: edge.target.clone(),
                    })
                } else if edge.target == id {
                    Some(EntityConnection {
                        edge_id: edge.id.clone(),
                        direction: ConnectionDirection::Incoming,
                        label: edge.label.clone(),
                        entity_id: edge.source.clone(),
                    })
                } else {
                    None
                }
            })
            .collect();

        let mut metadata = serde_json::Map::new();
        if let Some(doc) = &node.source_document {
            metadata.insert("source_document".to_string(), doc.clone().into());
        }

        Some(EntityDetail {
            id: node.id.clone(),
            name: node.label.clone(),
            entity_type: node.entity_type.clone(),
            description: node.description.clone(),
            metadata: serde_json::Value::Object(metadata),
            connections,
        })
    }
}
