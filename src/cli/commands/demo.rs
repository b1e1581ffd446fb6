//! Demo command implementation.
//!
//! Plays both sides of a reconciliation loop against the reference store:
//! an API writing `Router` objects and a controller watching them, driving
//! each to READY under its instance lock, then cleaning up.

use crate::core::config::Config;
use crate::model::{Attribute, ModelDef, ModelObject, ObjectState, WatchQueue};
use crate::store::create_instance;
use anyhow::{Context, Result};
use clap::Args;
use serde_json::{json, Value};
use std::time::Duration;

/// Run a reconciliation round trip against the reference store.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Number of objects to create.
    #[arg(long, default_value_t = 3)]
    pub objects: usize,

    /// Stop draining the watch queue after this many idle milliseconds.
    #[arg(long, default_value_t = 200)]
    pub idle_ms: u64,
}

/// What the demo controller did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoSummary {
    /// Objects created through the API side.
    pub created: usize,
    /// Objects re-announced by `learn()`.
    pub learned: usize,
    /// Events that ended in `set_ready()`.
    pub reconciled: usize,
    /// Objects removed after a delete request.
    pub removed: usize,
    /// Events skipped because the lock was held elsewhere.
    pub skipped: usize,
    /// Objects left in storage at the end.
    pub remaining: usize,
}

enum Outcome {
    Ready,
    Removed,
    Skipped,
}

/// Run the demo command.
pub async fn run_demo(args: DemoArgs, config: &Config) -> Result<DemoSummary> {
    let mut etcd = config.etcd.clone();
    etcd.mock_client = true;
    let store = create_instance(&etcd, &config.lock)?;

    let routers = ModelDef::builder("Router")
        .store(store)
        .base_prefix(&config.model)
        .attributes([
            Attribute::identity("id"),
            Attribute::field("name", ""),
            Attribute::field("ports", json!([])),
        ])
        .build();
    routers.validate()?;

    let mut queue = routers.watch()?;
    let idle = Duration::from_millis(args.idle_ms);
    let ttl = config.lock.default_ttl();

    for i in 0..args.objects {
        routers
            .create_with([("name", Value::from(format!("router-{}", i)))])?
            .put()?;
    }
    let mut summary = DemoSummary {
        created: args.objects,
        learned: routers.learn()?,
        ..DemoSummary::default()
    };
    drive(&mut queue, idle, ttl, &mut summary).await?;

    for mut router in routers.get_all()? {
        router.delete(Some("demo finished"))?;
    }
    drive(&mut queue, idle, ttl, &mut summary).await?;

    summary.remaining = routers.get_all()?.len();
    routers.unwatch()?;

    println!("Demo complete");
    println!("=============");
    println!("  Created:      {}", summary.created);
    println!("  Learned:      {}", summary.learned);
    println!("  Reconciled:   {}", summary.reconciled);
    println!("  Removed:      {}", summary.removed);
    println!("  Skipped:      {}", summary.skipped);
    println!("  Remaining:    {}", summary.remaining);

    Ok(summary)
}

/// Handle queued objects until the queue stays idle.
async fn drive(
    queue: &mut WatchQueue,
    idle: Duration,
    ttl: Duration,
    summary: &mut DemoSummary,
) -> Result<()> {
    while let Ok(Some(object)) = tokio::time::timeout(idle, queue.recv()).await {
        // Lock acquisition polls with thread sleeps.
        let outcome = tokio::task::spawn_blocking(move || reconcile(object, ttl))
            .await
            .context("reconcile task failed")??;
        match outcome {
            Outcome::Ready => summary.reconciled += 1,
            Outcome::Removed => summary.removed += 1,
            Outcome::Skipped => summary.skipped += 1,
        }
    }
    Ok(())
}

fn reconcile(mut object: ModelObject, ttl: Duration) -> Result<Outcome> {
    let mut holder = object.lock(ttl, Some(Duration::ZERO))?;
    let guard = holder.guard();
    if !guard.is_acquired() {
        tracing::debug!(key = %object.key(), "object locked elsewhere, skipping");
        return Ok(Outcome::Skipped);
    }

    match object.state() {
        ObjectState::Deleting => {
            object.remove()?;
            Ok(Outcome::Removed)
        }
        _ => {
            object.set_ready()?;
            Ok(Outcome::Ready)
        }
    }
}
