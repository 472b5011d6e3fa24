//! Builds backend workflow graphs from embedded templates.
//!
//! The backend consumes a JSON graph keyed by node id. Two templates are
//! shipped: the generic checkpoint pipeline and a flux variant whose
//! guidance lives on a dedicated node instead of the sampler's `cfg`
//! input. User settings are substituted into fixed patch points; the
//! lora and upscaler stages are present in both templates but only wired
//! into the graph when the corresponding option is set.

use serde_json::{Value, json};
use uuid::Uuid;

use tf_core::GenerationParams;

use crate::error::WorkflowError;

/// Subfolder under the backend's output tree where our artifacts land.
pub const OUTPUT_SUBFOLDER: &str = "texforge";

const GENERIC_TEMPLATE: &str = include_str!("../workflows/generic.json");
const FLUX_TEMPLATE: &str = include_str!("../workflows/flux.json");

// Node ids, shared by both templates.
const NODE_LORA: &str = "2";
const NODE_SAMPLER: &str = "3";
const NODE_CHECKPOINT: &str = "4";
const NODE_LATENT: &str = "5";
const NODE_POSITIVE: &str = "6";
const NODE_NEGATIVE: &str = "7";
const NODE_DECODE: &str = "8";
const NODE_SAVE: &str = "9";
const NODE_GUIDANCE: &str = "12"; // flux template only
const NODE_UPSCALE_LOADER: &str = "37";
const NODE_UPSCALE: &str = "38";

/// Flux checkpoints take guidance through their own node; everything
/// else goes through the sampler's `cfg` input.
pub fn is_flux(model: &str) -> bool {
    model.to_lowercase().contains("flux")
}

/// `filename_prefix` handed to the backend's save node.
pub fn output_prefix(correlation_id: Uuid) -> String {
    format!("{OUTPUT_SUBFOLDER}/{correlation_id}_output")
}

/// The file name the backend writes for the first image of a batch,
/// derived from [`output_prefix`] by the backend's own counter scheme.
pub fn artifact_filename(correlation_id: Uuid) -> String {
    format!("{correlation_id}_output_00001_.png")
}

/// Build the submission graph for one job from its parameter snapshot.
pub fn build_workflow(
    params: &GenerationParams,
    correlation_id: Uuid,
) -> Result<Value, WorkflowError> {
    let flux = is_flux(&params.model);
    let template = if flux { FLUX_TEMPLATE } else { GENERIC_TEMPLATE };
    let mut graph: Value = serde_json::from_str(template)?;

    set_input(&mut graph, NODE_SAMPLER, "seed", json!(params.seed))?;
    set_input(&mut graph, NODE_SAMPLER, "steps", json!(params.steps))?;
    set_input(
        &mut graph,
        NODE_SAMPLER,
        "sampler_name",
        json!(params.sampler.id()),
    )?;
    set_input(
        &mut graph,
        NODE_SAMPLER,
        "scheduler",
        json!(params.scheduler.id()),
    )?;
    set_input(&mut graph, NODE_CHECKPOINT, "ckpt_name", json!(params.model))?;
    set_input(&mut graph, NODE_POSITIVE, "text", json!(params.prompt))?;
    set_input(&mut graph, NODE_NEGATIVE, "text", json!(params.negative_prompt))?;

    if flux {
        set_input(&mut graph, NODE_GUIDANCE, "guidance", json!(params.cfg_scale))?;
    } else {
        set_input(&mut graph, NODE_SAMPLER, "cfg", json!(params.cfg_scale))?;
    }

    set_input(&mut graph, NODE_LATENT, "width", json!(params.width))?;
    set_input(&mut graph, NODE_LATENT, "height", json!(params.height))?;
    set_input(
        &mut graph,
        NODE_SAVE,
        "filename_prefix",
        json!(output_prefix(correlation_id)),
    )?;

    if let Some(lora) = &params.lora {
        // Route the sampler's model and both text encoders through the
        // lora loader instead of straight off the checkpoint.
        set_input(&mut graph, NODE_SAMPLER, "model", json!([NODE_LORA, 0]))?;
        set_input(&mut graph, NODE_LORA, "lora_name", json!(lora.name))?;
        set_input(&mut graph, NODE_LORA, "strength_model", json!(lora.strength))?;
        set_input(&mut graph, NODE_POSITIVE, "clip", json!([NODE_LORA, 1]))?;
        set_input(&mut graph, NODE_NEGATIVE, "clip", json!([NODE_LORA, 1]))?;
    }

    if let Some(upscaler) = &params.upscaler {
        // Insert the upscale stage between decode and save.
        set_input(&mut graph, NODE_UPSCALE, "image", json!([NODE_DECODE, 0]))?;
        set_input(&mut graph, NODE_SAVE, "images", json!([NODE_UPSCALE, 0]))?;
        set_input(
            &mut graph,
            NODE_UPSCALE_LOADER,
            "model_name",
            json!(upscaler),
        )?;
    }

    Ok(graph)
}

fn set_input(graph: &mut Value, node: &str, key: &str, value: Value) -> Result<(), WorkflowError> {
    let inputs = graph
        .get_mut(node)
        .and_then(|n| n.get_mut("inputs"))
        .and_then(|i| i.as_object_mut())
        .ok_or_else(|| WorkflowError::MissingNode(node.to_string()))?;
    inputs.insert(key.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GenerationParams {
        GenerationParams {
            prompt: "mossy stone".into(),
            negative_prompt: "blur".into(),
            enhance_prompt: false,
            seed: 1234,
            model: "sd_xl_base_1.0.safetensors".into(),
            ..GenerationParams::default()
        }
    }

    #[test]
    fn generic_graph_gets_all_substitutions() {
        let id = Uuid::new_v4();
        let graph = build_workflow(&params(), id).unwrap();

        assert_eq!(graph["3"]["inputs"]["seed"], 1234);
        assert_eq!(graph["3"]["inputs"]["cfg"], 5.5);
        assert_eq!(graph["3"]["inputs"]["sampler_name"], "dpmpp_2m_sde_gpu");
        assert_eq!(graph["4"]["inputs"]["ckpt_name"], "sd_xl_base_1.0.safetensors");
        assert_eq!(graph["5"]["inputs"]["width"], 1024);
        assert_eq!(graph["5"]["inputs"]["height"], 1024);
        assert_eq!(graph["6"]["inputs"]["text"], "mossy stone");
        assert_eq!(graph["7"]["inputs"]["text"], "blur");
        assert_eq!(
            graph["9"]["inputs"]["filename_prefix"],
            format!("texforge/{id}_output")
        );
    }

    #[test]
    fn flux_routes_guidance_through_its_own_node() {
        let mut p = params();
        p.model = "flux1-dev.safetensors".into();
        let graph = build_workflow(&p, Uuid::new_v4()).unwrap();

        assert_eq!(graph["12"]["inputs"]["guidance"], 5.5);
        // cfg on the sampler keeps the template's neutral value.
        assert_eq!(graph["3"]["inputs"]["cfg"], 1.0);
    }

    #[test]
    fn lora_disabled_leaves_checkpoint_wiring() {
        let graph = build_workflow(&params(), Uuid::new_v4()).unwrap();
        assert_eq!(graph["3"]["inputs"]["model"], json!(["4", 0]));
        assert_eq!(graph["6"]["inputs"]["clip"], json!(["4", 1]));
    }

    #[test]
    fn lora_enabled_rewires_model_and_clip() {
        let mut p = params();
        p.lora = Some(tf_core::LoraConfig {
            name: "detail_tweaker.safetensors".into(),
            strength: 0.8,
        });
        let graph = build_workflow(&p, Uuid::new_v4()).unwrap();

        assert_eq!(graph["3"]["inputs"]["model"], json!(["2", 0]));
        assert_eq!(graph["2"]["inputs"]["lora_name"], "detail_tweaker.safetensors");
        assert_eq!(graph["6"]["inputs"]["clip"], json!(["2", 1]));
        assert_eq!(graph["7"]["inputs"]["clip"], json!(["2", 1]));
    }

    #[test]
    fn upscaler_enabled_reroutes_save_input() {
        let mut p = params();
        p.upscaler = Some("RealESRGAN_x4plus.pth".into());
        let graph = build_workflow(&p, Uuid::new_v4()).unwrap();

        assert_eq!(graph["38"]["inputs"]["image"], json!(["8", 0]));
        assert_eq!(graph["9"]["inputs"]["images"], json!(["38", 0]));
        assert_eq!(graph["37"]["inputs"]["model_name"], "RealESRGAN_x4plus.pth");
    }

    #[test]
    fn upscaler_disabled_saves_straight_from_decode() {
        let graph = build_workflow(&params(), Uuid::new_v4()).unwrap();
        assert_eq!(graph["9"]["inputs"]["images"], json!(["8", 0]));
    }

    #[test]
    fn artifact_filename_matches_backend_counter_scheme() {
        let id = Uuid::new_v4();
        assert_eq!(artifact_filename(id), format!("{id}_output_00001_.png"));
    }
}
