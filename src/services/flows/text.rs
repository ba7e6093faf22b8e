//! Text flows: tag generation and text humanization

use super::{require_text, Flow, FlowError, FlowModels};
use crate::models::{GenerationConfig, GenerationRequest, GenerationResult, Part};
use serde::{Deserialize, Serialize};

const MAX_TOPIC_CHARS: usize = 500;
const MAX_HUMANIZE_CHARS: usize = 10_000;
const DEFAULT_TAG_COUNT: u32 = 15;
const MAX_TAG_COUNT: u32 = 50;

/// Tag generation input
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTagsInput {
    /// Title, description or keyword to tag
    pub topic: String,
    #[serde(default)]
    pub count: Option<u32>,
}

impl GenerateTagsInput {
    fn count(&self) -> u32 {
        self.count.unwrap_or(DEFAULT_TAG_COUNT)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateTagsOutput {
    pub tags: Vec<String>,
}

/// Generate SEO tags for a topic
#[derive(Debug, Default)]
pub struct GenerateTags;

impl Flow for GenerateTags {
    const NAME: &'static str = "generate-tags";

    type Input = GenerateTagsInput;
    type Output = GenerateTagsOutput;

    fn validate(&self, input: &Self::Input) -> Result<(), FlowError> {
        require_text("Topic", &input.topic, MAX_TOPIC_CHARS)?;

        let count = input.count();
        if count == 0 || count > MAX_TAG_COUNT {
            return Err(FlowError::Validation(format!(
                "Tag count must be between 1 and {}",
                MAX_TAG_COUNT
            )));
        }
        Ok(())
    }

    fn build(&self, input: &Self::Input, models: &FlowModels) -> Result<GenerationRequest, FlowError> {
        let prompt = format!(
            "Generate {} relevant, SEO-friendly tags for content about: \"{}\".\n\
             Each tag must be a short keyword or phrase without a leading '#'. \
             Order them from most to least relevant.",
            input.count(),
            input.topic.trim()
        );

        let schema = serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "tags": {
                    "type": "ARRAY",
                    "items": {"type": "STRING"}
                }
            },
            "required": ["tags"]
        });

        Ok(GenerationRequest::new(models.text.clone(), vec![Part::text(prompt)])
            .with_config(GenerationConfig::default().with_schema(schema)))
    }

    fn extract(&self, input: &Self::Input, result: GenerationResult) -> Result<Self::Output, FlowError> {
        const FAILURE: FlowError = FlowError::NoOutput("Failed to generate tags");

        let values = result
            .structured
            .as_ref()
            .and_then(|value| value.get("tags"))
            .and_then(|tags| tags.as_array())
            .ok_or(FAILURE)?;

        let mut tags: Vec<String> = Vec::new();
        for tag in values.iter().filter_map(|v| v.as_str()) {
            let tag = tag.trim().trim_start_matches('#').trim();
            if !tag.is_empty() && !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                tags.push(tag.to_string());
            }
        }
        tags.truncate(input.count() as usize);

        if tags.is_empty() {
            return Err(FAILURE);
        }
        Ok(GenerateTagsOutput { tags })
    }
}

/// Humanize text input
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanizeTextInput {
    pub text: String,
    /// Optional target tone, e.g. "casual" or "professional"
    #[serde(default)]
    pub tone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanizeTextOutput {
    pub humanized_text: String,
}

/// Rewrite machine-sounding text so it reads naturally
#[derive(Debug, Default)]
pub struct HumanizeText;

impl Flow for HumanizeText {
    const NAME: &'static str = "humanize-text";

    type Input = HumanizeTextInput;
    type Output = HumanizeTextOutput;

    fn validate(&self, input: &Self::Input) -> Result<(), FlowError> {
        require_text("Text", &input.text, MAX_HUMANIZE_CHARS)?;
        if let Some(tone) = &input.tone {
            require_text("Tone", tone, 50)?;
        }
        Ok(())
    }

    fn build(&self, input: &Self::Input, models: &FlowModels) -> Result<GenerationRequest, FlowError> {
        let tone = input.tone.as_deref().map(str::trim).unwrap_or("natural, conversational");
        let prompt = format!(
            "Rewrite the following text in a {} tone so it reads as if a person wrote it. \
             Vary sentence length, prefer plain words and keep every fact and the original language. \
             Reply with the rewritten text only.\n\n{}",
            tone, input.text
        );

        let config = GenerationConfig::default()
            .with_temperature(0.9)
            .with_system_instruction("You are an experienced editor who makes writing sound human.");

        Ok(GenerationRequest::new(models.text.clone(), vec![Part::text(prompt)]).with_config(config))
    }

    fn extract(&self, _input: &Self::Input, result: GenerationResult) -> Result<Self::Output, FlowError> {
        result
            .text
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .map(|humanized_text| HumanizeTextOutput { humanized_text })
            .ok_or(FlowError::NoOutput("Failed to humanize text"))
    }
}
