//! The fixed six-node workflow graph submitted for every prompt.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const DEFAULT_CHECKPOINT: &str = "sdxl_base_1.0.safetensors";
pub const DEFAULT_NEGATIVE: &str = "lowres, bad anatomy, bad hands, text, error, missing fingers, extra digit, fewer digits, cropped, worst quality, low quality, normal quality, jpeg artifacts, signature, watermark, username, blurry, nsfw";

/// Sampler and canvas settings of one flavor's graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSpec {
    pub checkpoint: String,
    pub negative: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg: f64,
    pub sampler: String,
    pub scheduler: String,
    /// `filename_number_padding` of the save node, when set.
    pub number_padding: Option<u32>,
}

impl Default for WorkflowSpec {
    fn default() -> Self {
        Self::character()
    }
}

impl WorkflowSpec {
    pub fn character() -> Self {
        Self {
            checkpoint: DEFAULT_CHECKPOINT.to_string(),
            negative: DEFAULT_NEGATIVE.to_string(),
            width: 728,
            height: 1456,
            steps: 30,
            cfg: 8.0,
            sampler: "heun".to_string(),
            scheduler: "normal".to_string(),
            number_padding: None,
        }
    }

    pub fn unit() -> Self {
        Self {
            width: 600,
            height: 1200,
            number_padding: Some(0),
            ..Self::character()
        }
    }
}

/// `{race}_{label}` with spaces replaced by underscores.
pub fn filename_prefix(race: &str, label: &str) -> String {
    format!("{race}_{label}").replace(' ', "_")
}

pub fn build_workflow(spec: &WorkflowSpec, prompt: &str, seed: u32, filename_prefix: &str) -> Value {
    let mut save_inputs = json!({
        "filename_prefix": filename_prefix,
        "images": ["8", 0],
    });
    if let Some(padding) = spec.number_padding {
        save_inputs["filename_number_padding"] = json!(padding);
    }

    json!({
        "3": {
            "inputs": {
                "seed": seed,
                "steps": spec.steps,
                "cfg": spec.cfg,
                "sampler_name": spec.sampler,
                "scheduler": spec.scheduler,
                "denoise": 1,
                "model": ["12", 0],
                "positive": ["12", 1],
                "negative": ["12", 2],
                "latent_image": ["5", 0]
            },
            "class_type": "KSampler",
            "_meta": { "title": "KSampler" }
        },
        "4": {
            "inputs": { "ckpt_name": spec.checkpoint },
            "class_type": "CheckpointLoaderSimple",
            "_meta": { "title": "Load Checkpoint" }
        },
        "5": {
            "inputs": {
                "width": spec.width,
                "height": spec.height,
                "batch_size": 1
            },
            "class_type": "EmptyLatentImage",
            "_meta": { "title": "Empty Latent Image" }
        },
        "8": {
            "inputs": {
                "samples": ["3", 0],
                "vae": ["4", 2]
            },
            "class_type": "VAEDecode",
            "_meta": { "title": "VAE Decode" }
        },
        "9": {
            "inputs": save_inputs,
            "class_type": "SaveImage",
            "_meta": { "title": "Save Image" }
        },
        "12": {
            "inputs": {
                "positive": prompt,
                "negative": spec.negative,
                "model": ["4", 0],
                "clip": ["4", 1]
            },
            "class_type": "WeiLinComfyUIPromptToLoras",
            "_meta": { "title": "Prompt To Loras" }
        }
    })
}
