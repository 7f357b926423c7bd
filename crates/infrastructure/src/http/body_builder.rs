//! HTTP request body builder.
//!
//! Turns the domain [`RequestBody`] into bytes plus a content type. File
//! sections of multipart forms are read here, when the request is sent.

use std::path::Path;

use courier_domain::{DEFAULT_FILE_CONTENT_TYPE, DomainError, FormField, MultipartForm, RequestBody};

/// Error type for body building operations.
#[derive(Debug, thiserror::Error)]
pub enum BodyBuildError {
    /// Failed to read a file section.
    #[error("Failed to read file {path}: {message}")]
    FileReadError {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        message: String,
    },

    /// Serialization error.
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Underlying serializer error.
        message: String,
    },

    /// The multipart form could not be encoded.
    #[error(transparent)]
    Form(#[from] DomainError),
}

/// A body ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltBody {
    /// No body.
    None,
    /// Encoded body with its content type.
    Bytes {
        /// Body content.
        content: Vec<u8>,
        /// `Content-Type` header value.
        content_type: String,
    },
}

impl BuiltBody {
    fn bytes(content: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self::Bytes {
            content: content.into(),
            content_type: content_type.into(),
        }
    }

    /// Get the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Bytes { content_type, .. } => Some(content_type),
            Self::None => None,
        }
    }

    /// Check if this body is empty/none.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Build an HTTP body from a request body.
///
/// # Errors
///
/// Returns [`BodyBuildError`] if a file section cannot be read or the body
/// cannot be serialized.
pub async fn build_body(body: &RequestBody) -> Result<BuiltBody, BodyBuildError> {
    match body {
        RequestBody::Empty => Ok(BuiltBody::None),

        RequestBody::Text {
            content,
            content_type,
        } => Ok(BuiltBody::bytes(content.as_bytes(), content_type.as_str())),

        RequestBody::Json(value) => {
            let content =
                serde_json::to_vec(value).map_err(|e| BodyBuildError::SerializationError {
                    message: e.to_string(),
                })?;
            Ok(BuiltBody::bytes(content, "application/json"))
        }

        RequestBody::Form(fields) => {
            let encoded = serde_urlencoded::to_string(fields).map_err(|e| {
                BodyBuildError::SerializationError {
                    message: e.to_string(),
                }
            })?;
            Ok(BuiltBody::bytes(encoded, "application/x-www-form-urlencoded"))
        }

        RequestBody::Bytes {
            content,
            content_type,
        } => Ok(BuiltBody::bytes(content.as_slice(), content_type.as_str())),

        RequestBody::Multipart(form) => {
            let form = read_files(form).await?;
            Ok(BuiltBody::bytes(form.encode()?, form.content_type()))
        }
    }
}

/// Copy the form with every file field replaced by the file's content.
async fn read_files(form: &MultipartForm) -> Result<MultipartForm, BodyBuildError> {
    let mut resolved = MultipartForm::new().with_boundary(form.boundary());

    for field in form.fields() {
        resolved = match field {
            FormField::Text { name, value } => resolved.section(name, value),
            FormField::Bytes {
                name,
                filename,
                content_type,
                data,
            } => resolved.bytes(name, filename, content_type, data.clone()),
            FormField::File {
                name,
                path,
                filename,
                content_type,
            } => {
                let data = tokio::fs::read(path)
                    .await
                    .map_err(|e| BodyBuildError::FileReadError {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    })?;
                let filename = filename.clone().unwrap_or_else(|| file_name(path));
                let content_type = content_type
                    .as_deref()
                    .unwrap_or(DEFAULT_FILE_CONTENT_TYPE);
                resolved.bytes(name, filename, content_type, data)
            }
        };
    }

    Ok(resolved)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string()
}
