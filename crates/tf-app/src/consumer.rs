use tracing::info;

/// Downstream contract invoked once per completed job: integrate the
/// saved artifact with the object it was generated for (build or update
/// a material, in the host application's terms).
///
/// Failures here are reported by the engine but never roll back the
/// job's completed status; the artifact is already on disk.
pub trait TextureConsumer: Send + Sync {
    fn apply_texture(&self, mesh_name: &str, artifact_name: &str) -> anyhow::Result<()>;
}

/// Default consumer for headless runs: records the hand-off and
/// succeeds.
pub struct LoggingConsumer;

impl TextureConsumer for LoggingConsumer {
    fn apply_texture(&self, mesh_name: &str, artifact_name: &str) -> anyhow::Result<()> {
        info!("texture {artifact_name} ready for mesh {mesh_name}");
        Ok(())
    }
}
