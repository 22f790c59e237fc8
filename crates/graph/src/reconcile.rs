//! Canvas-to-graph reconciliation. Turns the drawn nodes and connections
//! into an executable event forest rooted at lead sources, reports nodes
//! the drawing left unreachable, and emits the changeset to persist.
//!
//! All per-request bookkeeping lives in an explicit `ReconcileContext`
//! passed by parameter, so nothing accumulates across requests.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, warn};
use uuid::Uuid;

use sentinel_core::types::{CampaignEvent, DecisionPath};
use sentinel_core::{SentinelError, SentinelResult};

use crate::diff::{diff_events, Diff};
use crate::types::{CampaignCanvas, ConnectionAnchor};

/// Request-scoped accumulator for one reconciliation pass.
#[derive(Debug, Default)]
pub struct ReconcileContext {
    pub modified_events: Vec<Uuid>,
    pub removed_events: Vec<Uuid>,
    pub orphaned_nodes: Vec<Uuid>,
}

/// Outcome of reconciling a canvas against the stored graph.
#[derive(Debug)]
pub struct Reconciliation {
    /// The executable event set: every reachable node, wired with parent
    /// and decision-path links.
    pub events: Vec<CampaignEvent>,
    pub diff: Diff<CampaignEvent>,
    /// Nodes present on the canvas but unreachable from any lead source.
    pub orphans: Vec<Uuid>,
}

/// Reconciles the canvas against the currently stored events.
///
/// Fails when a connection references a node that is not on the canvas, or
/// when two connections claim the same target with different sources.
pub fn reconcile(
    campaign_id: Uuid,
    canvas: &CampaignCanvas,
    existing: &[CampaignEvent],
    ctx: &mut ReconcileContext,
) -> SentinelResult<Reconciliation> {
    let node_ids: HashSet<Uuid> = canvas.nodes.iter().map(|n| n.id).collect();

    let mut roots: Vec<Uuid> = Vec::new();
    let mut parents: HashMap<Uuid, (Uuid, Option<DecisionPath>)> = HashMap::new();
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();

    for conn in &canvas.connections {
        if !node_ids.contains(&conn.target_id) {
            return Err(SentinelError::InvalidCanvas(format!(
                "connection targets unknown node {}",
                conn.target_id
            )));
        }

        let source_id = match conn.source_id {
            Some(id) if conn.anchor != ConnectionAnchor::LeadSource => id,
            _ => {
                roots.push(conn.target_id);
                continue;
            }
        };
        if !node_ids.contains(&source_id) {
            return Err(SentinelError::InvalidCanvas(format!(
                "connection originates at unknown node {source_id}"
            )));
        }

        let path = match conn.anchor {
            ConnectionAnchor::Yes => Some(DecisionPath::Yes),
            ConnectionAnchor::No => Some(DecisionPath::No),
            _ => None,
        };

        if let Some((prior, _)) = parents.get(&conn.target_id) {
            if *prior != source_id {
                return Err(SentinelError::InvalidCanvas(format!(
                    "node {} has conflicting parents {} and {}",
                    conn.target_id, prior, source_id
                )));
            }
        }
        parents.insert(conn.target_id, (source_id, path));
        children.entry(source_id).or_default().push(conn.target_id);
    }

    // BFS from the lead-source roots; anything the walk misses is orphaned.
    let mut reachable: HashSet<Uuid> = HashSet::new();
    let mut queue: VecDeque<Uuid> = roots.into_iter().collect();
    while let Some(id) = queue.pop_front() {
        if !reachable.insert(id) {
            continue;
        }
        if let Some(kids) = children.get(&id) {
            queue.extend(kids.iter().copied());
        }
    }

    let existing_by_id: HashMap<Uuid, &CampaignEvent> = existing.iter().map(|e| (e.id, e)).collect();

    let mut events: Vec<CampaignEvent> = Vec::with_capacity(reachable.len());
    let mut orphans: Vec<Uuid> = Vec::new();
    for node in &canvas.nodes {
        if !reachable.contains(&node.id) {
            warn!(campaign_id = %campaign_id, node_id = %node.id, name = %node.name,
                "Canvas node unreachable from any lead source, excluding");
            orphans.push(node.id);
            continue;
        }

        // A reachable node whose drawn parent was excluded as an orphan is
        // necessarily lead-source-rooted; it enters the forest parentless
        // rather than carrying a dangling reference.
        let (parent_id, decision_path) = match parents.get(&node.id) {
            Some((p, d)) if reachable.contains(p) => (Some(*p), *d),
            _ => (None, None),
        };

        events.push(CampaignEvent {
            id: node.id,
            campaign_id,
            name: node.name.clone(),
            kind: node.kind,
            // Counter state survives structural edits to the same node.
            failed_count: existing_by_id.get(&node.id).map(|e| e.failed_count).unwrap_or(0),
            parent_id,
            decision_path,
        });
    }

    let diff = diff_events(existing, &events);

    ctx.modified_events
        .extend(diff.changed.iter().map(|c| c.after.id));
    ctx.modified_events.extend(diff.added.iter().map(|e| e.id));
    ctx.removed_events.extend(diff.removed.iter().map(|e| e.id));
    ctx.orphaned_nodes.extend(orphans.iter().copied());

    debug!(
        campaign_id = %campaign_id,
        events = events.len(),
        added = diff.added.len(),
        removed = diff.removed.len(),
        changed = diff.changed.len(),
        orphans = orphans.len(),
        "Canvas reconciled"
    );

    Ok(Reconciliation {
        events,
        diff,
        orphans,
    })
}
