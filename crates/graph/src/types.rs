use sentinel_core::types::EventKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A node as drawn on the campaign builder canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: Uuid,
    pub name: String,
    pub kind: EventKind,
    /// Node-type-specific settings, opaque to the graph layer.
    #[serde(default)]
    pub properties: serde_json::Value,
}

/// Where a connection attaches on its source node. Lead-source anchors mark
/// graph roots; Yes/No anchors carry the decision branch onto the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionAnchor {
    LeadSource,
    Top,
    Bottom,
    Yes,
    No,
}

/// A directed edge between two canvas nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConnection {
    /// Source node id, or None when the edge originates at a lead source.
    pub source_id: Option<Uuid>,
    pub target_id: Uuid,
    pub anchor: ConnectionAnchor,
}

/// The complete canvas document submitted by the campaign builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignCanvas {
    pub nodes: Vec<CanvasNode>,
    pub connections: Vec<CanvasConnection>,
}
