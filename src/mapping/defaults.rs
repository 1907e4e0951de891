// src/mapping/defaults.rs
// Code defaults for the three mapping documents, grounded verbatim on
// `shared_models.py`'s SHARED_MODEL_FOLDERS / APP_INSTALL_DIRS /
// SHARED_MODEL_APP_MAP dicts.

use super::{AppInstallDirs, SharedModelAppMap, SharedModelFolders};

pub fn shared_model_folders() -> SharedModelFolders {
    let entries: [(&str, &str); 18] = [
        ("ckpt", "Model Checkpoint (Full model including a CLIP and VAE model)"),
        ("clip", "CLIP Model (used together with UNET models)"),
        ("controlnet", "ControlNet model (Canny, Depth, Hed, OpenPose, Union-Pro, etc.)"),
        ("embeddings", "Embedding (aka Textual Inversion) Model"),
        ("hypernetworks", "HyperNetwork Model"),
        ("insightface", "InsightFace Model"),
        ("ipadapters", "ControlNet IP-Adapter Model"),
        ("ipadapters/xlabs", "IP-Adapter from XLabs-AI"),
        ("LLM", "LLM (aka Large-Language Model) is folder mapped (1 folder per model), append '/*' in the map"),
        ("loras", "LoRA (aka Low-Ranking Adaption) Model"),
        ("loras/xlabs", "LoRA Model from XLabs-AI"),
        ("loras/flux", "LoRA Model trained on Flux.1 Dev or Flux.1 Schnell"),
        ("reactor", "Reactor Model"),
        ("reactor/faces", "Reactor Face Model"),
        ("unet", "UNET Model Checkpoint (need separate CLIP and VAE Models)"),
        ("upscale_models", "Upscaling Model (based on ESRGAN)"),
        ("vae", "VAE En-/Decoder Model"),
        ("vae-approx", "Approximate VAE Model"),
    ];

    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn app_install_dirs() -> AppInstallDirs {
    let entries: [(&str, &str); 5] = [
        ("A1111", "/workspace/stable-diffusion-webui"),
        ("Forge", "/workspace/stable-diffusion-webui-forge"),
        ("ComfyUI", "/workspace/ComfyUI"),
        ("kohya_ss", "/workspace/kohya_ss"),
        ("CUSTOM1", "/workspace/joy-caption-batch"),
    ];

    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn shared_model_app_map() -> SharedModelAppMap {
    let mut map = SharedModelAppMap::new();

    macro_rules! entry {
        ($model_type:expr, [ $( ($app:expr, $path:expr) ),+ $(,)? ]) => {
            map.insert(
                $model_type.to_string(),
                [ $( ($app.to_string(), $path.to_string()) ),+ ].into_iter().collect(),
            );
        };
    }

    entry!("ckpt", [
        ("ComfyUI", "/models/checkpoints"),
        ("A1111", "/models/Stable-diffusion"),
        ("Forge", "/models/Stable-diffusion"),
        ("kohya_ss", "/models"),
    ]);

    entry!("clip", [
        ("ComfyUI", "/models/clip"),
        ("A1111", "/models/text_encoder"),
        ("Forge", "/models/text_encoder"),
    ]);

    entry!("controlnet", [
        ("ComfyUI", "/models/controlnet"),
        ("A1111", "/models/ControlNet"),
        ("Forge", "/models/ControlNet"),
    ]);

    entry!("embeddings", [
        ("ComfyUI", "/models/embeddings"),
        ("A1111", "/embeddings"),
        ("Forge", "/embeddings"),
    ]);

    entry!("hypernetworks", [
        ("ComfyUI", "/models/hypernetworks"),
        ("A1111", "/models/hypernetworks"),
        ("Forge", "/models/hypernetworks"),
    ]);

    entry!("insightface", [
        ("ComfyUI", "/models/insightface"),
        ("A1111", "/models/insightface"),
        ("Forge", "/models/insightface"),
    ]);

    entry!("ipadapters", [
        ("ComfyUI", "/models/ipadapter/"),
        ("A1111", "/extensions/sd-webui-controlnet/models"),
        ("Forge", "/extensions/sd-webui-controlnet/models"),
    ]);

    entry!("ipadapters/xlabs", [
        ("ComfyUI", "/models/xlabs/ipadapters"),
        ("A1111", "/extensions/sd-webui-controlnet/models"),
        ("Forge", "/extensions/sd-webui-controlnet/models"),
    ]);

    entry!("loras", [
        ("ComfyUI", "/models/loras"),
        ("A1111", "/models/Lora"),
        ("Forge", "/models/Lora"),
    ]);

    entry!("loras/xlabs", [
        ("ComfyUI", "/models/loras/xlabs"),
        ("A1111", "/models/Lora"),
        ("Forge", "/models/Lora"),
    ]);

    entry!("loras/flux", [
        ("ComfyUI", "/models/loras/flux"),
        ("A1111", "/models/Lora"),
        ("Forge", "/models/Lora"),
    ]);

    entry!("reactor", [
        ("ComfyUI", "/models/reactor"),
        ("A1111", "/models/reactor"),
        ("Forge", "/models/reactor"),
    ]);

    entry!("reactor/faces", [
        ("ComfyUI", "/models/reactor/faces"),
        ("A1111", "/models/reactor"),
        ("Forge", "/models/reactor"),
    ]);

    entry!("unet", [
        ("ComfyUI", "/models/unet"),
        ("A1111", "/models/Stable-diffusion"),
        ("Forge", "/models/Stable-diffusion"),
        ("kohya_ss", "/models"),
    ]);

    entry!("upscale_models", [
        ("ComfyUI", "/models/upscale_models"),
        ("A1111", "/models/ESRGAN"),
        ("Forge", "/models/ESRGAN"),
    ]);

    entry!("vae", [
        ("ComfyUI", "/models/vae"),
        ("A1111", "/models/VAE"),
        ("Forge", "/models/VAE"),
    ]);

    entry!("vae-approx", [
        ("ComfyUI", "/models/vae_approx"),
        ("A1111", "/models/VAE-approx"),
        ("Forge", "/models/VAE-approx"),
    ]);

    // Folder-symlink demonstration: an LLM shipped as a full multi-file
    // folder rather than a single model file.
    entry!("LLM/Meta-Llama-3.1-8B/*", [
        ("ComfyUI", "/models/LLM/Meta-Llama-3.1-8B/*"),
        ("CUSTOM1", "/model/*"),
    ]);

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_satisfy_mapping_invariants() {
        let folders = shared_model_folders();
        let dirs = app_install_dirs();
        let app_map = shared_model_app_map();
        super::super::validate(&folders, &dirs, &app_map).unwrap();
    }

    #[test]
    fn llm_entry_uses_folder_symlink_syntax() {
        let app_map = shared_model_app_map();
        let llm = &app_map["LLM/Meta-Llama-3.1-8B/*"];
        assert_eq!(llm["ComfyUI"], "/models/LLM/Meta-Llama-3.1-8B/*");
        assert_eq!(llm["CUSTOM1"], "/model/*");
    }
}
