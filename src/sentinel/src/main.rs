//! Campaign Sentinel — failure-threshold health monitoring for campaign
//! execution pipelines.
//!
//! Operator harness: builds a campaign from a small canvas, enrolls
//! synthetic contacts, drives failure/success executions through the
//! monitor from parallel workers, and reports whether the campaign
//! survived. Useful for validating threshold tuning before rollout.

use std::sync::Arc;
use std::thread;

use clap::Parser;
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use sentinel_core::config::AppConfig;
use sentinel_core::event_bus::NotificationSink;
use sentinel_core::types::{Campaign, EventKind, Notification, NotificationKind};
use sentinel_graph::types::{CampaignCanvas, CanvasConnection, CanvasNode, ConnectionAnchor};
use sentinel_graph::{reconcile, ReconcileContext};
use sentinel_monitor::CampaignHealthMonitor;
use sentinel_store::{CampaignRepository, MemoryRepository};

#[derive(Parser, Debug)]
#[command(name = "sentinel")]
#[command(about = "Campaign failure-threshold monitoring harness")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "SENTINEL__NODE_ID")]
    node_id: Option<String>,

    /// Number of contacts enrolled in the simulated campaign
    #[arg(long, default_value_t = 500)]
    contacts: u64,

    /// Fraction of contacts that persistently fail the event
    #[arg(long, default_value_t = 0.4)]
    failing_fraction: f64,

    /// Execution attempts per contact
    #[arg(long, default_value_t = 150)]
    rounds: u32,

    /// Parallel workers driving executions
    #[arg(long, default_value_t = 4)]
    workers: usize,
}

/// Sink that logs every delivered notification.
struct LogSink;

impl NotificationSink for LogSink {
    fn has_listeners(&self, _kind: NotificationKind) -> bool {
        true
    }

    fn dispatch(&self, notification: Notification) -> anyhow::Result<()> {
        match notification.kind() {
            NotificationKind::CampaignUnpublished => {
                warn!(payload = %serde_json::to_string(&notification.body)?, "Campaign unpublished")
            }
            NotificationKind::EventFailed => {}
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentinel=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(node_id) = cli.node_id.clone() {
        config.node_id = node_id;
    }

    info!(
        node_id = %config.node_id,
        contacts = cli.contacts,
        failing_fraction = cli.failing_fraction,
        rounds = cli.rounds,
        workers = cli.workers,
        loops_to_fail = config.monitor.loops_to_fail,
        "Campaign Sentinel starting"
    );

    let repo: Arc<MemoryRepository> = Arc::new(MemoryRepository::new());
    let campaign = Campaign::new("simulated-campaign", cli.contacts);
    let campaign_id = campaign.id;
    repo.insert_campaign(campaign)?;

    let watched_event = build_graph(&repo, campaign_id)?;

    let monitor = Arc::new(
        CampaignHealthMonitor::new(repo.clone() as Arc<dyn CampaignRepository>, &config.monitor)
            .with_notification_sink(Arc::new(LogSink)),
    );

    run_simulation(&cli, monitor, repo.clone(), watched_event)?;

    let campaign = repo.campaign(campaign_id)?;
    let failed = repo.failed_count(watched_event)?;
    info!(
        campaign_id = %campaign_id,
        published = campaign.is_published,
        failed_count = failed,
        enrolled = campaign.enrolled_contacts,
        "Simulation finished"
    );

    Ok(())
}

/// Builds a three-node canvas (action, decision, follow-up) and stores the
/// reconciled event graph. Returns the id of the entry event, which is the
/// one the simulation drives.
fn build_graph(repo: &Arc<MemoryRepository>, campaign_id: Uuid) -> anyhow::Result<Uuid> {
    let entry = CanvasNode {
        id: Uuid::new_v4(),
        name: "send-welcome-email".to_string(),
        kind: EventKind::Action,
        properties: serde_json::json!({ "template": "welcome" }),
    };
    let decision = CanvasNode {
        id: Uuid::new_v4(),
        name: "opened-email".to_string(),
        kind: EventKind::Decision,
        properties: serde_json::json!({}),
    };
    let follow_up = CanvasNode {
        id: Uuid::new_v4(),
        name: "send-offer".to_string(),
        kind: EventKind::Action,
        properties: serde_json::json!({ "template": "offer" }),
    };

    let canvas = CampaignCanvas {
        connections: vec![
            CanvasConnection {
                source_id: None,
                target_id: entry.id,
                anchor: ConnectionAnchor::LeadSource,
            },
            CanvasConnection {
                source_id: Some(entry.id),
                target_id: decision.id,
                anchor: ConnectionAnchor::Bottom,
            },
            CanvasConnection {
                source_id: Some(decision.id),
                target_id: follow_up.id,
                anchor: ConnectionAnchor::Yes,
            },
        ],
        nodes: vec![entry.clone(), decision, follow_up],
    };

    let mut ctx = ReconcileContext::default();
    let reconciliation = reconcile(campaign_id, &canvas, &[], &mut ctx)?;
    for event in reconciliation.events {
        repo.insert_event(event)?;
    }

    Ok(entry.id)
}

fn run_simulation(
    cli: &Cli,
    monitor: Arc<CampaignHealthMonitor>,
    repo: Arc<MemoryRepository>,
    event_id: Uuid,
) -> anyhow::Result<()> {
    let failing_cutoff = (cli.contacts as f64 * cli.failing_fraction) as u64;
    let workers = cli.workers.max(1);
    let rounds = cli.rounds;
    let contacts = cli.contacts;

    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let monitor = Arc::clone(&monitor);
            let contact_range = (contacts as usize * worker / workers)
                ..(contacts as usize * (worker + 1) / workers);
            thread::spawn(move || -> anyhow::Result<()> {
                let mut rng = rand::thread_rng();
                for round in 0..rounds {
                    for c in contact_range.clone() {
                        let contact = format!("contact-{c}");
                        // Failing contacts flake back to success ~1% of the
                        // time to exercise the recovery path.
                        let fails = (c as u64) < failing_cutoff && rng.gen_bool(0.99);
                        if fails {
                            monitor.on_event_failed(event_id, &contact)?;
                        } else {
                            monitor.on_event_executed(event_id, &contact)?;
                        }
                    }
                    if round % 50 == 0 {
                        info!(worker, round, "Simulation progress");
                    }
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("simulation worker panicked"))??;
    }

    let failed = repo.failed_count(event_id)?;
    info!(failed_count = failed, "All workers finished");
    Ok(())
}
