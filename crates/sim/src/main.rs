//! Concurrency exerciser for the claim protocol.
//!
//! Runs N simulated annotators against a live Postgres store, each with
//! its own session, and verifies at the end that no work item collected
//! two final submissions. Useful both as a smoke test for a deployed
//! store and as a load generator for the claim SQL.
//!
//! Configuration (environment):
//!
//! | Env Var          | Default | Meaning                               |
//! |------------------|---------|---------------------------------------|
//! | `DATABASE_URL`   | —       | Postgres connection string (required) |
//! | `SIM_ANNOTATORS` | `4`     | Concurrent simulated annotators       |
//! | `SIM_SEED_ITEMS` | `0`     | Memes to insert before the run        |
//! | `SIM_SKIP_EVERY` | `5`     | Skip (instead of submit) every Nth    |

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use memelab_annotate::{AnnotatorSession, NoopPreloader, SessionConfig, SubmitOutcome};
use memelab_core::types::DbId;
use memelab_db::models::CreateMeme;
use memelab_db::repositories::MemeRepo;
use memelab_db::store::PgStore;

fn env_or(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Drive one session until the pool is exhausted. Returns the item ids
/// this annotator successfully submitted. Skipped items are excluded:
/// a released item legitimately recirculates to another session, and only
/// final submissions are covered by first-submitter-wins.
async fn run_annotator(
    label: usize,
    store: Arc<PgStore>,
    skip_every: u32,
) -> anyhow::Result<Vec<DbId>> {
    let annotator_id = Uuid::new_v4();
    let session = AnnotatorSession::new(
        store,
        Arc::new(NoopPreloader),
        annotator_id,
        SessionConfig::from_env(),
    );
    session.start().await?;

    let mut submitted = Vec::new();
    let mut turn: u32 = 0;
    loop {
        let view = session.snapshot().await;
        let Some(head) = view.head else {
            if view.caught_up {
                break;
            }
            // A refill is still in flight; yield and look again.
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            continue;
        };

        turn += 1;
        if skip_every > 0 && turn % skip_every == 0 {
            session.skip().await;
            continue;
        }

        match session
            .submit(&format!("caption for {} by annotator {label}", head.id))
            .await
        {
            Ok(SubmitOutcome::Saved) => submitted.push(head.id),
            Ok(SubmitOutcome::Raced) => {
                warn!(annotator = label, item = head.id, "lost a submit race");
            }
            Err(e) => {
                warn!(annotator = label, item = head.id, error = %e, "submit failed; retrying");
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    }

    let view = session.snapshot().await;
    info!(
        annotator = label,
        completed = view.session_count,
        submitted = submitted.len(),
        "annotator finished"
    );
    Ok(submitted)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memelab_sim=info,memelab_annotate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let annotators = env_or("SIM_ANNOTATORS", 4) as usize;
    let seed_items = env_or("SIM_SEED_ITEMS", 0);
    let skip_every = env_or("SIM_SKIP_EVERY", 5);

    let pool = memelab_db::create_pool(&database_url).await?;
    memelab_db::health_check(&pool).await?;

    if seed_items > 0 {
        info!(seed_items, "seeding work-item pool");
        for i in 0..seed_items {
            MemeRepo::insert(
                &pool,
                &CreateMeme {
                    file_name: format!("sim-{i}.png"),
                    storage_path: format!("sim/sim-{i}.png"),
                    source_folder: "sim".into(),
                },
            )
            .await?;
        }
    }

    let store = Arc::new(PgStore::from_env(pool));
    info!(annotators, "starting simulated annotators");

    let handles: Vec<_> = (0..annotators)
        .map(|label| tokio::spawn(run_annotator(label, Arc::clone(&store), skip_every)))
        .collect();

    let mut all_submitted: Vec<DbId> = Vec::new();
    for result in futures::future::join_all(handles).await {
        all_submitted.extend(result??);
    }

    let unique: HashSet<_> = all_submitted.iter().copied().collect();
    if unique.len() != all_submitted.len() {
        anyhow::bail!(
            "duplicate final submission detected: {} items submitted, {} unique",
            all_submitted.len(),
            unique.len()
        );
    }

    info!(total = all_submitted.len(), "run complete; all final submissions unique");
    Ok(())
}
