use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Closed set of inference backends a model can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Ollama,
}

/// One entry of the model lookup table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Stable key used by clients (`llama32-3b`, `gpt-4o`, ...)
    pub id: String,
    /// Human-readable label for selection UIs
    pub display_name: String,
    /// Exactly one descriptor per registry carries this flag
    pub selected_by_default: bool,
    pub provider: Provider,
    /// Provider-side model name
    pub model_name: String,
}

/// Static mapping from model identifiers to providers.
///
/// Resolution never fails: unknown or absent identifiers fall back to the
/// default descriptor. The failure mode of a wrong model is presentation,
/// not data corruption, so there is no invalid-model error path.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    /// Build a registry from descriptors, enforcing that exactly one entry
    /// is marked as the default.
    pub fn new(models: Vec<ModelDescriptor>) -> Result<Self> {
        let defaults = models.iter().filter(|m| m.selected_by_default).count();
        if defaults != 1 {
            bail!(
                "model registry must have exactly one default entry, found {}",
                defaults
            );
        }
        Ok(Self { models })
    }

    /// The built-in model table of this deployment.
    pub fn builtin() -> Result<Self> {
        Self::new(vec![
            ModelDescriptor {
                id: "llama32-3b".to_string(),
                display_name: "Meta Llama 3.2 3B Instruct (Ollama)".to_string(),
                selected_by_default: true,
                provider: Provider::Ollama,
                model_name: "llama3.2:3b".to_string(),
            },
            ModelDescriptor {
                id: "llama32-1b".to_string(),
                display_name: "Meta Llama 3.2 1B Instruct (Ollama)".to_string(),
                selected_by_default: false,
                provider: Provider::Ollama,
                model_name: "llama3.2:1b".to_string(),
            },
            ModelDescriptor {
                id: "gpt-4o".to_string(),
                display_name: "GPT-4o".to_string(),
                selected_by_default: false,
                provider: Provider::OpenAi,
                model_name: "gpt-4o".to_string(),
            },
            ModelDescriptor {
                id: "gpt-4o-mini".to_string(),
                display_name: "GPT-4o mini".to_string(),
                selected_by_default: false,
                provider: Provider::OpenAi,
                model_name: "gpt-4o-mini".to_string(),
            },
        ])
    }

    /// Resolve an optional model identifier to a descriptor.
    ///
    /// Absent and unrecognized identifiers both resolve to the default entry.
    pub fn resolve(&self, id: Option<&str>) -> &ModelDescriptor {
        let descriptor = id
            .and_then(|id| self.models.iter().find(|m| m.id == id))
            .unwrap_or_else(|| self.default_model());

        tracing::debug!(model = %descriptor.model_name, provider = ?descriptor.provider, "use: {}", descriptor.display_name);
        descriptor
    }

    /// The descriptor flagged as default. `new` guarantees it exists.
    pub fn default_model(&self) -> &ModelDescriptor {
        self.models
            .iter()
            .find(|m| m.selected_by_default)
            .expect("registry invariant: exactly one default")
    }

    /// All descriptors in display order.
    pub fn all(&self) -> &[ModelDescriptor] {
        &self.models
    }
}
