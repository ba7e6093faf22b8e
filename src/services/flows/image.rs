//! Image flows: background removal and instruction-driven editing

use super::{require_image, require_text, Flow, FlowError, FlowModels};
use crate::models::{GenerationConfig, GenerationRequest, GenerationResult, Modality, Part};
use serde::{Deserialize, Serialize};

const MAX_INSTRUCTION_CHARS: usize = 1000;

const REMOVE_BACKGROUND_PROMPT: &str = "Remove the background from this image. \
Keep the main subject exactly as it is and place it on a transparent background. \
Return only the edited image.";

/// Photo input shared by the image flows
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoInput {
    /// Photo as a `data:<mime>;base64,<payload>` URI
    pub photo_data_uri: String,
}

/// Edited image output
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOutput {
    pub image_data_uri: String,
}

fn image_config() -> GenerationConfig {
    GenerationConfig::default().with_modalities(&[Modality::Text, Modality::Image])
}

fn extract_image(result: GenerationResult, failure: &'static str) -> Result<ImageOutput, FlowError> {
    result
        .media
        .map(|media| ImageOutput { image_data_uri: media.url })
        .ok_or(FlowError::NoOutput(failure))
}

/// Remove the background of a photo
#[derive(Debug, Default)]
pub struct RemoveBackground;

impl Flow for RemoveBackground {
    const NAME: &'static str = "remove-background";

    type Input = PhotoInput;
    type Output = ImageOutput;

    fn validate(&self, input: &Self::Input) -> Result<(), FlowError> {
        require_image("Photo", &input.photo_data_uri).map(|_| ())
    }

    fn build(&self, input: &Self::Input, models: &FlowModels) -> Result<GenerationRequest, FlowError> {
        let photo = require_image("Photo", &input.photo_data_uri)?;

        Ok(GenerationRequest::new(
            models.image.clone(),
            vec![Part::media(photo), Part::text(REMOVE_BACKGROUND_PROMPT)],
        )
        .with_config(image_config()))
    }

    fn extract(&self, _input: &Self::Input, result: GenerationResult) -> Result<Self::Output, FlowError> {
        extract_image(result, "Failed to remove background")
    }
}

/// Edit image input
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditImageInput {
    pub photo_data_uri: String,
    /// What to change, in plain language
    pub instruction: String,
}

/// Edit a photo following a plain-language instruction
#[derive(Debug, Default)]
pub struct EditImage;

impl Flow for EditImage {
    const NAME: &'static str = "edit-image";

    type Input = EditImageInput;
    type Output = ImageOutput;

    fn validate(&self, input: &Self::Input) -> Result<(), FlowError> {
        require_image("Photo", &input.photo_data_uri)?;
        require_text("Instruction", &input.instruction, MAX_INSTRUCTION_CHARS)
    }

    fn build(&self, input: &Self::Input, models: &FlowModels) -> Result<GenerationRequest, FlowError> {
        let photo = require_image("Photo", &input.photo_data_uri)?;
        let prompt = format!(
            "Edit this image according to the following instruction: {}\n\
             Preserve everything the instruction does not mention. Return only the edited image.",
            input.instruction.trim()
        );

        Ok(GenerationRequest::new(models.image.clone(), vec![Part::media(photo), Part::text(prompt)])
            .with_config(image_config()))
    }

    fn extract(&self, _input: &Self::Input, result: GenerationResult) -> Result<Self::Output, FlowError> {
        extract_image(result, "Failed to edit image")
    }
}
