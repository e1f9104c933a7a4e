use crate::errors::{Result, TransportError};
use crate::fields::first_string;
use crate::job::{CREATE_ROUTE, JOB_ID_FIELDS};
use crate::request::{AudioSource, TranscriptionRequest};
use crate::transport::{FormField, RequestSpec, Transport};

fn text(name: &'static str, value: impl Into<String>) -> FormField {
    FormField::Text {
        name,
        value: value.into(),
    }
}

/// Multipart fields for a creation call. Optional fields and empty
/// collections are left out entirely.
pub fn form_fields(request: &TranscriptionRequest) -> Result<Vec<FormField>> {
    let mut fields = Vec::new();

    match &request.source {
        AudioSource::Remote(url) => fields.push(text("cloud_storage_url", url.clone())),
        AudioSource::Upload { input, filename } => fields.push(FormField::File {
            name: "file",
            input: input.clone(),
            filename: filename.clone(),
        }),
    }

    fields.push(text("model_id", request.model_id.clone()));

    if let Some(ref lang) = request.language_code {
        fields.push(text("language_code", lang.clone()));
    }
    if request.diarize {
        fields.push(text("diarize", "true"));
    }
    if let Some(count) = request.num_speakers {
        fields.push(text("num_speakers", count.to_string()));
    }

    fields.push(text(
        "tag_audio_events",
        if request.tag_audio_events { "true" } else { "false" },
    ));
    fields.push(text(
        "timestamps_granularity",
        request.timestamps_granularity.as_str(),
    ));
    fields.push(text("response_format", request.response_format.wire_value()));

    if !request.keyterm_prompts.is_empty() {
        fields.push(text(
            "keyterm_prompts",
            serde_json::to_string(&request.keyterm_prompts)?,
        ));
    }
    if !request.additional_formats.is_empty() {
        fields.push(text(
            "additional_formats",
            serde_json::to_string(&request.additional_formats)?,
        ));
    }
    if !request.metadata.is_empty() {
        fields.push(text("metadata", serde_json::to_string(&request.metadata)?));
    }

    Ok(fields)
}

/// Create the remote job and return its id.
pub async fn submit(transport: &Transport, request: &TranscriptionRequest) -> Result<String> {
    let spec = RequestSpec::post_multipart(CREATE_ROUTE, form_fields(request)?);
    let body = transport.execute_json(&spec).await?;

    let job_id = first_string(&body, JOB_ID_FIELDS).ok_or_else(|| {
        TransportError::MalformedResponse(format!(
            "creation response carries no transcription id: {body}"
        ))
    })?;

    tracing::info!(%job_id, model = %request.model_id, "Transcription job submitted");
    Ok(job_id)
}
