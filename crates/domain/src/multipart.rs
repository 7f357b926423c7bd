//! `multipart/form-data` bodies.
//!
//! A [`MultipartForm`] collects fields in order. File fields may point at a
//! path that is only read when the request is sent; the infrastructure layer
//! resolves those into [`FormSection`]s before [`encode_sections`] writes the
//! final body.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Boundary used unless a form picks its own.
pub const DEFAULT_BOUNDARY: &str = "u2KxIV5yF1y+xUspOQCCZopaVgeV6Jxihv35XQJmuTx8X3sh";

/// Content type of a file section when none is given.
pub const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// A field of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormField {
    /// A text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// A file read from disk when the request is sent.
    File {
        /// Field name.
        name: String,
        /// Path to the file.
        path: PathBuf,
        /// File name to send; defaults to the file name of `path`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
        /// Content type to send; defaults to `application/octet-stream`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
    },
    /// A file whose content is already in memory.
    Bytes {
        /// Field name.
        name: String,
        /// File name to send.
        filename: String,
        /// Content type to send.
        content_type: String,
        /// File content.
        data: Vec<u8>,
    },
}

impl FormField {
    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } | Self::Bytes { name, .. } => name,
        }
    }
}

/// Options for a file field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOptions {
    /// File name to send instead of the one on disk.
    pub filename: Option<String>,
    /// Content type of the section.
    pub content_type: Option<String>,
}

/// An ordered multipart form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartForm {
    boundary: String,
    fields: Vec<FormField>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    /// Creates an empty form with the default boundary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary: DEFAULT_BOUNDARY.to_string(),
            fields: Vec::new(),
        }
    }

    /// Use a different boundary token.
    #[must_use]
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    /// Adds a text field.
    #[must_use]
    pub fn section(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(FormField::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Adds a file field read from `path` when the request is sent.
    #[must_use]
    pub fn file(self, path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        self.file_with(path, name, FileOptions::default())
    }

    /// Adds a file field with an explicit file name or content type.
    #[must_use]
    pub fn file_with(
        mut self,
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        options: FileOptions,
    ) -> Self {
        self.fields.push(FormField::File {
            name: name.into(),
            path: path.into(),
            filename: options.filename,
            content_type: options.content_type,
        });
        self
    }

    /// Adds a file field from memory.
    #[must_use]
    pub fn bytes(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        self.fields.push(FormField::Bytes {
            name: name.into(),
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        });
        self
    }

    /// Returns the boundary token.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Returns the fields in order.
    #[must_use]
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Returns the `Content-Type` header value for this form.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encodes a form that holds no path-based file fields.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnresolvedFormFile`] if a field still points at
    /// a file on disk.
    pub fn encode(&self) -> DomainResult<Vec<u8>> {
        let sections = self
            .fields
            .iter()
            .map(|field| match field {
                FormField::File { name, .. } => {
                    Err(DomainError::UnresolvedFormFile(name.clone()))
                }
                FormField::Text { name, value } => Ok(FormSection::text(name, value)),
                FormField::Bytes {
                    name,
                    filename,
                    content_type,
                    data,
                } => Ok(FormSection::file(
                    name,
                    filename,
                    content_type,
                    data.clone(),
                )),
            })
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(encode_sections(&self.boundary, &sections))
    }
}

/// A section ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSection {
    /// Field name.
    pub name: String,
    /// File name, for file sections.
    pub filename: Option<String>,
    /// Section content type.
    pub content_type: String,
    /// Section content.
    pub data: Vec<u8>,
}

impl FormSection {
    /// A text section.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: "text/plain".to_string(),
            data: value.into().into_bytes(),
        }
    }

    /// A file section.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            filename: Some(filename.into()),
            content_type: content_type.into(),
            data,
        }
    }
}

/// Writes the sections as a `multipart/form-data` body.
#[must_use]
pub fn encode_sections(boundary: &str, sections: &[FormSection]) -> Vec<u8> {
    let mut body = Vec::new();
    for section in sections {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"", section.name).as_bytes(),
        );
        if let Some(filename) = &section.filename {
            body.extend_from_slice(format!("; filename=\"{filename}\"").as_bytes());
        }
        body.extend_from_slice(
            format!("\r\nContent-Type: {}\r\n\r\n", section.content_type).as_bytes(),
        );
        body.extend_from_slice(&section.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
