//! HTTP client for the feature submission service.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use shapegate_core::{
    CollectionId, FeatureSubmitter, PartValue, SubmissionError, SubmissionPayload,
    SubmissionReceipt,
};

use super::config::{ProviderBuildError, ServiceConfig, TransportFailure};
use super::responses::{CreatedResponse, ErrorResponse};

/// [`FeatureSubmitter`] posting multipart forms to
/// `feature-collections/{id}/features/shapefile`.
#[derive(Debug, Clone)]
pub struct HttpFeatureSubmitter {
    client: Client,
    config: ServiceConfig,
}

impl HttpFeatureSubmitter {
    /// Create a submitter for the API at `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(ServiceConfig::new(base_url))
    }

    /// Create a submitter with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: ServiceConfig) -> Result<Self, ProviderBuildError> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    /// Endpoint receiving submissions for `collection`.
    pub fn submission_url(&self, collection: CollectionId) -> String {
        self.config
            .endpoint(&format!("feature-collections/{collection}/features/shapefile"))
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> SubmissionError {
        match TransportFailure::classify(error) {
            TransportFailure::Timeout => SubmissionError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            },
            TransportFailure::Status(status) if status >= 500 => SubmissionError::Server { status },
            TransportFailure::Status(status) => SubmissionError::Rejected {
                status,
                message: String::new(),
                long_message: None,
            },
            TransportFailure::Network => SubmissionError::Network {
                url: url.to_owned(),
                message: error.to_string(),
            },
        }
    }
}

/// Encode `payload` as a multipart form, keeping part order.
pub fn multipart_form(payload: &SubmissionPayload) -> Form {
    payload
        .parts()
        .iter()
        .fold(Form::new(), |form, part| match &part.value {
            PartValue::Text(text) => form.text(part.field, text.clone()),
            PartValue::File { file_name, bytes } => form.part(
                part.field,
                Part::bytes(bytes.clone()).file_name(file_name.clone()),
            ),
        })
}

/// Interpret a submission response from its status code and body.
///
/// Success bodies must carry the created feature's id. Server failures
/// (5xx) ignore the body; other failures keep whatever message the body
/// offers, falling back to empty messages when it is not JSON.
///
/// # Errors
///
/// Returns the [`SubmissionError`] matching the status.
pub fn interpret_submission_response(
    status: u16,
    body: &str,
) -> Result<SubmissionReceipt, SubmissionError> {
    match status {
        200..=299 => serde_json::from_str::<CreatedResponse>(body)
            .map(SubmissionReceipt::from)
            .map_err(|err| SubmissionError::Parse {
                message: err.to_string(),
            }),
        500..=599 => Err(SubmissionError::Server { status }),
        _ => {
            let detail = serde_json::from_str::<ErrorResponse>(body).unwrap_or_else(|err| {
                debug!("submission error body is not JSON: {err}");
                ErrorResponse::default()
            });
            Err(SubmissionError::Rejected {
                status,
                message: detail.message,
                long_message: detail.long_message,
            })
        }
    }
}

#[async_trait(?Send)]
impl FeatureSubmitter for HttpFeatureSubmitter {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let url = self.submission_url(payload.collection_id());
        let response = self
            .client
            .post(&url)
            .multipart(multipart_form(payload))
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        let outcome = interpret_submission_response(status, &body);
        if let Err(err) = &outcome {
            warn!("submission to {url} failed: {err}");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn submission_urls_name_the_collection() {
        let submitter =
            HttpFeatureSubmitter::new("http://api.example.com/").expect("client builds");
        assert_eq!(
            submitter.submission_url(CollectionId::new(12)),
            "http://api.example.com/feature-collections/12/features/shapefile"
        );
    }

    #[rstest]
    #[case(200)]
    #[case(201)]
    fn success_bodies_yield_receipts(#[case] status: u16) {
        assert_eq!(
            interpret_submission_response(status, r#"{"id": 77}"#),
            Ok(SubmissionReceipt { id: 77 })
        );
    }

    #[rstest]
    fn success_without_an_id_is_a_parse_failure() {
        let err = interpret_submission_response(201, "{}").expect_err("missing id");
        assert!(matches!(err, SubmissionError::Parse { .. }), "got {err:?}");
    }

    #[rstest]
    fn rejections_keep_service_messages() {
        let err = interpret_submission_response(
            400,
            r#"{"message": "Invalid shapefile", "long_message": "Layer 'sites' has 3 features"}"#,
        )
        .expect_err("rejected");
        assert_eq!(err.display_message(), "Layer 'sites' has 3 features");
    }

    #[rstest]
    fn rejections_without_json_use_the_generic_message() {
        let err = interpret_submission_response(422, "<html>nope</html>").expect_err("rejected");
        assert_eq!(
            err,
            SubmissionError::Rejected {
                status: 422,
                message: String::new(),
                long_message: None,
            }
        );
        assert_eq!(err.display_message(), shapegate_core::GENERIC_SUBMISSION_FAILURE);
    }

    #[rstest]
    #[case(500)]
    #[case(503)]
    fn server_failures_ignore_the_body(#[case] status: u16) {
        let err = interpret_submission_response(status, r#"{"message": "stack trace"}"#)
            .expect_err("server failure");
        assert_eq!(err, SubmissionError::Server { status });
        assert_eq!(err.display_message(), shapegate_core::INTERNAL_SERVER_ERROR);
    }
}
