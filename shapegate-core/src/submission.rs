//! Assemble the multipart payload sent to the feature submission service.

use async_trait::async_trait;
use log::debug;
use thiserror::Error;

use crate::bundle::{ARCHIVE_EXTENSION, BundleContents, ShapefileBundle};
use crate::collection::{CollectionId, TargetCollection};

/// Multipart field carrying the feature name.
pub const FIELD_NAME: &str = "name";
/// Multipart field carrying an archive bundle.
pub const FIELD_ARCHIVE: &str = ARCHIVE_EXTENSION;
/// Multipart fields carrying component bundles, in submission order.
pub const COMPONENT_FIELDS: [&str; 4] = ["shp", "dbf", "prj", "shx"];
/// Multipart field carrying the default turbine hub height.
pub const FIELD_DEFAULT_HUB_HEIGHT: &str = "default_hub_height";
/// Multipart field carrying the default turbine rotor diameter.
pub const FIELD_DEFAULT_ROTOR_DIAMETER: &str = "default_rotor_diameter";
/// Multipart field naming the attribute holding turbine numbers.
pub const FIELD_TURBINE_NUMBER: &str = "turbine_number_field";
/// Multipart field naming the attribute holding hub heights.
pub const FIELD_HUB_HEIGHT: &str = "hub_height_field";
/// Multipart field naming the attribute holding rotor diameters.
pub const FIELD_ROTOR_DIAMETER: &str = "rotor_diameter_field";

/// Optional parameters accepted only by the turbine-layout collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurbineParameters {
    /// Hub height applied to turbines without their own value.
    pub default_hub_height: Option<f64>,
    /// Rotor diameter applied to turbines without their own value.
    pub default_rotor_diameter: Option<f64>,
    /// Attribute holding each turbine's number.
    pub turbine_number_field: Option<String>,
    /// Attribute holding each turbine's hub height.
    pub hub_height_field: Option<String>,
    /// Attribute holding each turbine's rotor diameter.
    pub rotor_diameter_field: Option<String>,
}

impl TurbineParameters {
    /// Whether no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.default_hub_height.is_none()
            && self.default_rotor_diameter.is_none()
            && field_name(self.turbine_number_field.as_ref()).is_none()
            && field_name(self.hub_height_field.as_ref()).is_none()
            && field_name(self.rotor_diameter_field.as_ref()).is_none()
    }
}

fn field_name(value: Option<&String>) -> Option<&str> {
    value.map(|name| name.trim()).filter(|name| !name.is_empty())
}

/// Value of one multipart part.
#[derive(Clone, PartialEq, Eq)]
pub enum PartValue {
    /// Plain text.
    Text(String),
    /// File upload.
    File {
        /// File name reported to the service.
        file_name: String,
        /// File contents.
        bytes: Vec<u8>,
    },
}

impl std::fmt::Debug for PartValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::File { file_name, bytes } => f
                .debug_struct("File")
                .field("file_name", file_name)
                .field("bytes", &bytes.len())
                .finish(),
        }
    }
}

/// One named multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadPart {
    /// Field name.
    pub field: &'static str,
    /// Field value.
    pub value: PartValue,
}

/// Multipart submission for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    collection_id: CollectionId,
    parts: Vec<PayloadPart>,
}

impl SubmissionPayload {
    /// Collection the payload targets, sent as a path parameter.
    pub const fn collection_id(&self) -> CollectionId {
        self.collection_id
    }

    /// Parts in submission order.
    pub fn parts(&self) -> &[PayloadPart] {
        &self.parts
    }

    /// Look up a part by field name.
    pub fn part(&self, field: &str) -> Option<&PartValue> {
        self.parts
            .iter()
            .find(|part| part.field == field)
            .map(|part| &part.value)
    }

    /// Text value of `field`, if present and textual.
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.part(field)? {
            PartValue::Text(text) => Some(text),
            PartValue::File { .. } => None,
        }
    }

    /// Field names in submission order.
    pub fn fields(&self) -> Vec<&'static str> {
        self.parts.iter().map(|part| part.field).collect()
    }
}

/// Build the submission payload for `bundle`.
///
/// Turbine parameters are only sent to the turbine-layout collection; numeric
/// values are omitted when `None` and field names when unset or blank.
///
/// # Examples
///
/// ```
/// use shapegate_core::{
///     CollectionId, GeometryType, ShapefileBundle, TargetCollection, TurbineParameters,
///     build_payload,
/// };
///
/// let bundle = ShapefileBundle::from_archive("layout", vec![0x50, 0x4b]);
/// let target = TargetCollection::global(CollectionId::TURBINE_LAYOUT, "Turbines", GeometryType::Point);
/// let params = TurbineParameters { default_hub_height: Some(110.0), ..TurbineParameters::default() };
/// let payload = build_payload(&bundle, &target, "Layout A", &params);
/// assert_eq!(payload.fields(), vec!["zip", "name", "default_hub_height"]);
/// ```
pub fn build_payload(
    bundle: &ShapefileBundle,
    collection: &TargetCollection,
    name: &str,
    turbine: &TurbineParameters,
) -> SubmissionPayload {
    let stem = bundle.name();
    let file = |extension: &str, bytes: &[u8]| PartValue::File {
        file_name: format!("{stem}.{extension}"),
        bytes: bytes.to_vec(),
    };
    let mut parts = match bundle.contents() {
        BundleContents::Components(components) => {
            let [shp, dbf, prj, shx] = COMPONENT_FIELDS;
            vec![
                PayloadPart {
                    field: shp,
                    value: file(shp, components.shp.as_slice()),
                },
                PayloadPart {
                    field: dbf,
                    value: file(dbf, components.dbf.as_slice()),
                },
                PayloadPart {
                    field: prj,
                    value: file(prj, components.prj.as_slice()),
                },
                PayloadPart {
                    field: shx,
                    value: file(shx, components.shx.as_slice()),
                },
            ]
        }
        BundleContents::Archive(archive) => vec![PayloadPart {
            field: FIELD_ARCHIVE,
            value: file(FIELD_ARCHIVE, archive.as_slice()),
        }],
    };
    parts.push(PayloadPart {
        field: FIELD_NAME,
        value: PartValue::Text(name.to_owned()),
    });

    if collection.is_turbine_layout() {
        append_turbine_parts(&mut parts, turbine);
    } else if !turbine.is_empty() {
        debug!(
            "ignoring turbine parameters for collection {} ({:?})",
            collection.id, collection.title
        );
    }

    SubmissionPayload {
        collection_id: collection.id,
        parts,
    }
}

fn append_turbine_parts(parts: &mut Vec<PayloadPart>, turbine: &TurbineParameters) {
    let numbers = [
        (FIELD_DEFAULT_HUB_HEIGHT, turbine.default_hub_height),
        (FIELD_DEFAULT_ROTOR_DIAMETER, turbine.default_rotor_diameter),
    ];
    for (field, value) in numbers {
        if let Some(value) = value {
            parts.push(PayloadPart {
                field,
                value: PartValue::Text(value.to_string()),
            });
        }
    }
    let names = [
        (FIELD_TURBINE_NUMBER, turbine.turbine_number_field.as_ref()),
        (FIELD_HUB_HEIGHT, turbine.hub_height_field.as_ref()),
        (FIELD_ROTOR_DIAMETER, turbine.rotor_diameter_field.as_ref()),
    ];
    for (field, value) in names {
        if let Some(name) = field_name(value) {
            parts.push(PayloadPart {
                field,
                value: PartValue::Text(name.to_owned()),
            });
        }
    }
}

/// Acknowledgement returned by the submission service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubmissionReceipt {
    /// Identifier of the created feature.
    pub id: i64,
}

/// Message shown when a submission fails without service detail.
pub const GENERIC_SUBMISSION_FAILURE: &str = "Failed to submit shapefile";
/// Message shown when the service fails internally.
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

/// Errors from [`FeatureSubmitter`] implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The service rejected the submission (4xx).
    #[error("submission rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Short message from the service.
        message: String,
        /// Detailed message from the service, shown verbatim when present.
        /// An empty detail counts as absent and falls back to `message`.
        long_message: Option<String>,
    },
    /// The service failed internally (5xx).
    #[error("submission failed with server status {status}")]
    Server {
        /// HTTP status code.
        status: u16,
    },
    /// The request could not be delivered.
    #[error("network error submitting to {url}: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The request exceeded its deadline.
    #[error("submission to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The response body did not match the expected shape.
    #[error("failed to parse submission response: {message}")]
    Parse {
        /// Parser error description.
        message: String,
    },
}

impl SubmissionError {
    /// Message presented to the user.
    ///
    /// Prefers the service's detailed message verbatim, then its short
    /// message. Empty messages are skipped. Server failures and transport
    /// problems use fixed messages.
    pub fn display_message(&self) -> String {
        match self {
            Self::Rejected {
                message,
                long_message,
                ..
            } => long_message
                .as_deref()
                .filter(|detail| !detail.is_empty())
                .or_else(|| Some(message.as_str()).filter(|short| !short.is_empty()))
                .unwrap_or(GENERIC_SUBMISSION_FAILURE)
                .to_owned(),
            Self::Server { .. } => INTERNAL_SERVER_ERROR.to_owned(),
            Self::Network { .. } | Self::Timeout { .. } | Self::Parse { .. } => {
                GENERIC_SUBMISSION_FAILURE.to_owned()
            }
        }
    }
}

/// External service accepting shapefile submissions.
#[async_trait(?Send)]
pub trait FeatureSubmitter {
    /// Submit `payload` to its collection.
    async fn submit(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, SubmissionError>;
}
