use serde::{Deserialize, Serialize};

/// Sampler catalog exposed by the backend's KSampler node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sampler {
    #[serde(rename = "euler")]
    Euler,
    #[serde(rename = "euler_cfg_pp")]
    EulerCfgPp,
    #[serde(rename = "euler_ancestral")]
    EulerAncestral,
    #[serde(rename = "euler_ancestral_cfg_pp")]
    EulerAncestralCfgPp,
    #[serde(rename = "heun")]
    Heun,
    #[serde(rename = "heunpp2")]
    HeunPp2,
    #[serde(rename = "dpm_2")]
    Dpm2,
    #[serde(rename = "dpm_2_ancestral")]
    Dpm2Ancestral,
    #[serde(rename = "lms")]
    Lms,
    #[serde(rename = "dpm_fast")]
    DpmFast,
    #[serde(rename = "dpm_adaptive")]
    DpmAdaptive,
    #[serde(rename = "dpmpp_2s_ancestral")]
    Dpmpp2sAncestral,
    #[serde(rename = "dpmpp_2s_ancestral_cfg_pp")]
    Dpmpp2sAncestralCfgPp,
    #[serde(rename = "dpmpp_sde")]
    DpmppSde,
    #[serde(rename = "dpmpp_sde_gpu")]
    DpmppSdeGpu,
    #[serde(rename = "dpmpp_2m")]
    Dpmpp2m,
    #[serde(rename = "dpmpp_2m_cfg_pp")]
    Dpmpp2mCfgPp,
    #[serde(rename = "dpmpp_2m_sde")]
    Dpmpp2mSde,
    #[serde(rename = "dpmpp_2m_sde_gpu")]
    Dpmpp2mSdeGpu,
    #[serde(rename = "dpmpp_3m_sde")]
    Dpmpp3mSde,
    #[serde(rename = "dpmpp_3m_sde_gpu")]
    Dpmpp3mSdeGpu,
    #[serde(rename = "ddpm")]
    Ddpm,
    #[serde(rename = "lcm")]
    Lcm,
    #[serde(rename = "ipndm")]
    Ipndm,
    #[serde(rename = "ipndm_v")]
    IpndmV,
    #[serde(rename = "deis")]
    Deis,
    #[serde(rename = "ddim")]
    Ddim,
    #[serde(rename = "uni_pc")]
    UniPc,
    #[serde(rename = "uni_pc_bh2")]
    UniPcBh2,
}

impl Sampler {
    /// Wire id as the backend expects it in the workflow graph.
    pub fn id(&self) -> &str {
        match self {
            Self::Euler => "euler",
            Self::EulerCfgPp => "euler_cfg_pp",
            Self::EulerAncestral => "euler_ancestral",
            Self::EulerAncestralCfgPp => "euler_ancestral_cfg_pp",
            Self::Heun => "heun",
            Self::HeunPp2 => "heunpp2",
            Self::Dpm2 => "dpm_2",
            Self::Dpm2Ancestral => "dpm_2_ancestral",
            Self::Lms => "lms",
            Self::DpmFast => "dpm_fast",
            Self::DpmAdaptive => "dpm_adaptive",
            Self::Dpmpp2sAncestral => "dpmpp_2s_ancestral",
            Self::Dpmpp2sAncestralCfgPp => "dpmpp_2s_ancestral_cfg_pp",
            Self::DpmppSde => "dpmpp_sde",
            Self::DpmppSdeGpu => "dpmpp_sde_gpu",
            Self::Dpmpp2m => "dpmpp_2m",
            Self::Dpmpp2mCfgPp => "dpmpp_2m_cfg_pp",
            Self::Dpmpp2mSde => "dpmpp_2m_sde",
            Self::Dpmpp2mSdeGpu => "dpmpp_2m_sde_gpu",
            Self::Dpmpp3mSde => "dpmpp_3m_sde",
            Self::Dpmpp3mSdeGpu => "dpmpp_3m_sde_gpu",
            Self::Ddpm => "ddpm",
            Self::Lcm => "lcm",
            Self::Ipndm => "ipndm",
            Self::IpndmV => "ipndm_v",
            Self::Deis => "deis",
            Self::Ddim => "ddim",
            Self::UniPc => "uni_pc",
            Self::UniPcBh2 => "uni_pc_bh2",
        }
    }

    /// Display name for UI listings.
    pub fn name(&self) -> &str {
        match self {
            Self::Euler => "Euler",
            Self::EulerCfgPp => "Euler CFG PP",
            Self::EulerAncestral => "Euler Ancestral",
            Self::EulerAncestralCfgPp => "Euler Ancestral CFG PP",
            Self::Heun => "Heun",
            Self::HeunPp2 => "Heun PP2",
            Self::Dpm2 => "DPM 2",
            Self::Dpm2Ancestral => "DPM 2 Ancestral",
            Self::Lms => "LMS",
            Self::DpmFast => "DPM Fast",
            Self::DpmAdaptive => "DPM Adaptive",
            Self::Dpmpp2sAncestral => "DPM++ 2S Ancestral",
            Self::Dpmpp2sAncestralCfgPp => "DPM++ 2S Ancestral CFG PP",
            Self::DpmppSde => "DPM++ SDE",
            Self::DpmppSdeGpu => "DPM++ SDE GPU",
            Self::Dpmpp2m => "DPM++ 2M",
            Self::Dpmpp2mCfgPp => "DPM++ 2M CFG PP",
            Self::Dpmpp2mSde => "DPM++ 2M SDE",
            Self::Dpmpp2mSdeGpu => "DPM++ 2M SDE GPU",
            Self::Dpmpp3mSde => "DPM++ 3M SDE",
            Self::Dpmpp3mSdeGpu => "DPM++ 3M SDE GPU",
            Self::Ddpm => "DDPM",
            Self::Lcm => "LCM",
            Self::Ipndm => "IPNDM",
            Self::IpndmV => "IPNDM V",
            Self::Deis => "DEIS",
            Self::Ddim => "DDIM",
            Self::UniPc => "Uni PC",
            Self::UniPcBh2 => "Uni PC BH2",
        }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::Dpmpp2mSdeGpu
    }
}

/// Noise schedule catalog for the diffusion process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffScheduler {
    Normal,
    Karras,
    Exponential,
    SgmUniform,
    Simple,
    DdimUniform,
    Beta,
    LinearQuadratic,
}

impl DiffScheduler {
    pub fn id(&self) -> &str {
        match self {
            Self::Normal => "normal",
            Self::Karras => "karras",
            Self::Exponential => "exponential",
            Self::SgmUniform => "sgm_uniform",
            Self::Simple => "simple",
            Self::DdimUniform => "ddim_uniform",
            Self::Beta => "beta",
            Self::LinearQuadratic => "linear_quadratic",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Normal => "Normal",
            Self::Karras => "Karras",
            Self::Exponential => "Exponential",
            Self::SgmUniform => "SGM Uniform",
            Self::Simple => "Simple",
            Self::DdimUniform => "DDIM Uniform",
            Self::Beta => "Beta",
            Self::LinearQuadratic => "Linear Quadratic",
        }
    }
}

impl Default for DiffScheduler {
    fn default() -> Self {
        Self::Normal
    }
}

/// Optional style-adapter stage applied on top of the base checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraConfig {
    pub name: String,
    pub strength: f32,
}

/// The full set of user-facing generation settings. A copy of this is
/// snapshotted into each [`crate::JobRecord`] at submission time so that
/// later edits never touch an in-flight job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub prompt: String,
    pub negative_prompt: String,
    /// When set, the quality suffix/negative terms below are merged into
    /// the prompts before submission.
    pub enhance_prompt: bool,
    pub quality_suffix: String,
    pub quality_negative: String,
    pub seed: u32,
    pub random_seed: bool,
    pub steps: u32,
    pub cfg_scale: f32,
    pub sampler: Sampler,
    pub scheduler: DiffScheduler,
    pub width: u32,
    pub height: u32,
    /// Checkpoint file name as listed by the backend.
    pub model: String,
    pub lora: Option<LoraConfig>,
    /// Upscale model file name; `None` skips the upscaling stage.
    pub upscaler: Option<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            prompt: "wood planks".into(),
            negative_prompt: String::new(),
            enhance_prompt: true,
            quality_suffix: "organic surface, seamless texture, tileable, top-down view, \
                             flat lighting, no shadows, no highlights, uniform pattern, \
                             albedo map, base color only, PBR texture, high detail, \
                             4k resolution, ultra sharp, no logos, no borders"
                .into(),
            quality_negative: "shadows, lighting effects, reflections, text, logo, objects, \
                               3D render, depth, photorealistic, noise, background, blur, photo"
                .into(),
            seed: 42,
            random_seed: true,
            steps: 30,
            cfg_scale: 5.5,
            sampler: Sampler::default(),
            scheduler: DiffScheduler::default(),
            width: 1024,
            height: 1024,
            model: String::new(),
            lora: None,
            upscaler: None,
        }
    }
}

impl GenerationParams {
    /// Positive and negative prompts with the quality terms merged in
    /// (comma-joined, empty parts skipped). Returns the prompts as-is
    /// when enhancement is disabled.
    pub fn enhanced_prompts(&self) -> (String, String) {
        let base = self.prompt.trim();
        let base_negative = self.negative_prompt.trim();
        if !self.enhance_prompt {
            return (base.to_string(), base_negative.to_string());
        }
        (
            join_prompt(base, self.quality_suffix.trim()),
            join_prompt(base_negative, self.quality_negative.trim()),
        )
    }

    /// The copy stored on a job record: enhancement is materialized into
    /// the prompt fields so the snapshot is what actually gets submitted.
    pub fn snapshot_for_submission(&self) -> GenerationParams {
        let (prompt, negative_prompt) = self.enhanced_prompts();
        GenerationParams {
            prompt,
            negative_prompt,
            enhance_prompt: false,
            ..self.clone()
        }
    }
}

fn join_prompt(base: &str, extra: &str) -> String {
    match (base.is_empty(), extra.is_empty()) {
        (_, true) => base.to_string(),
        (true, false) => extra.to_string(),
        (false, false) => format!("{base}, {extra}"),
    }
}
