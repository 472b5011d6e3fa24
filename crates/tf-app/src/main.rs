use std::sync::Arc;

use tracing::{error, info};

use tf_app::client::{BackendClient, ResourceKind};
use tf_app::config::AppConfig;
use tf_app::consumer::LoggingConsumer;
use tf_app::engine::{PollingEngine, TokioScheduler};
use tf_app::events::{self, JobEvent};
use tf_app::session::{BackendSession, SystemClock};
use tf_app::store;
use tf_app::submit::Submitter;
use tf_core::GenerationParams;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::load()?;
    let mut args = std::env::args().skip(1);
    let prompt = args.next().unwrap_or_else(|| "wood planks".into());
    let mesh_name = args.next().unwrap_or_else(|| "Cube".into());

    let client = Arc::new(BackendClient::new(
        config.backend_url.clone(),
        config.request_timeout,
        config.list_timeout,
    ));
    let session = BackendSession::new(client.clone(), Arc::new(SystemClock));
    session.connect().await?;

    let mut live = GenerationParams {
        prompt,
        ..GenerationParams::default()
    };
    if live.model.is_empty() {
        let checkpoints = session.resources(ResourceKind::Checkpoints).await?;
        live.model = checkpoints
            .first()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("backend has no checkpoints installed"))?;
        info!("using checkpoint {}", live.model);
    }

    let (event_tx, mut event_rx) = events::channel();
    let store = store::shared();
    let engine = PollingEngine::new(
        store.clone(),
        client.clone(),
        config.policy.clone(),
        config.output_dir.clone(),
        Arc::new(LoggingConsumer),
        event_tx.clone(),
        Arc::new(TokioScheduler),
    );
    let submitter = Submitter::new(store.clone(), client, engine, event_tx);

    let id = submitter.submit(&mut live, &mesh_name).await?;
    info!(%id, seed = live.seed, "generation submitted");

    while let Some(event) = event_rx.recv().await {
        match event {
            JobEvent::StatusChanged { id, status } => {
                info!(%id, "status: {}", status.label());
            }
            JobEvent::Completed {
                id,
                artifact_name,
                elapsed,
            } => {
                info!(%id, "completed in {:.1}s: {artifact_name}", elapsed.as_secs_f32());
                break;
            }
            JobEvent::Failed { id, reason } => {
                error!(%id, "generation failed: {reason}");
                break;
            }
            JobEvent::ConsumerFailed { id, error } => {
                error!(%id, "texture hand-off failed: {error}");
            }
            JobEvent::Queued { .. } | JobEvent::Submitted { .. } => {}
        }
    }

    Ok(())
}
