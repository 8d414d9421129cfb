//! Multipart form parsing for the product, category and brand editors.

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;

use crate::api::admin::Upload;
use crate::error::AppError;

/// A parsed multipart submission: text fields plus any non-empty files.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    files: Vec<(String, Upload)>,
}

fn bad_upload(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

impl MultipartForm {
    /// Drain every field of `multipart`.
    ///
    /// File inputs left empty by the browser (no name, no bytes) are
    /// dropped so an edit without a new image keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BadRequest`] if the body is malformed or too large.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match field.file_name().map(str::to_owned) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_owned();
                    let bytes = field.bytes().await.map_err(bad_upload)?;
                    if !file_name.is_empty() && !bytes.is_empty() {
                        form.files.push((
                            name,
                            Upload {
                                file_name,
                                content_type,
                                bytes: bytes.to_vec(),
                            },
                        ));
                    }
                }
                None => {
                    let value = field.text().await.map_err(bad_upload)?;
                    form.fields.push((name, value));
                }
            }
        }
        Ok(form)
    }

    /// First value of a text field, trimmed; empty when absent.
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.trim().to_owned())
            .unwrap_or_default()
    }

    /// Take the first file uploaded under `name`.
    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        let index = self.files.iter().position(|(key, _)| key == name)?;
        Some(self.files.remove(index).1)
    }

    /// Take every file uploaded under `name`.
    pub fn take_files(&mut self, name: &str) -> Vec<Upload> {
        let (taken, kept) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(key, _)| key == name);
        self.files = kept;
        taken.into_iter().map(|(_, upload)| upload).collect()
    }

    #[cfg(test)]
    fn with_text(mut self, name: &str, value: &str) -> Self {
        self.fields.push((name.to_owned(), value.to_owned()));
        self
    }

    #[cfg(test)]
    fn with_file(mut self, name: &str, file_name: &str) -> Self {
        self.files.push((
            name.to_owned(),
            Upload {
                file_name: file_name.to_owned(),
                content_type: "image/png".to_owned(),
                bytes: vec![1, 2, 3],
            },
        ));
        self
    }
}

/// Split a comma-separated list field (`red, blue`) into values.
#[must_use]
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_trimmed_and_defaults_empty() {
        let form = MultipartForm::default().with_text("title", "  Linen shirt ");
        assert_eq!(form.text("title"), "Linen shirt");
        assert_eq!(form.text("missing"), "");
    }

    #[test]
    fn test_take_files_leaves_other_fields() {
        let mut form = MultipartForm::default()
            .with_file("images", "a.png")
            .with_file("imageCover", "cover.png")
            .with_file("images", "b.png");
        let gallery = form.take_files("images");
        assert_eq!(gallery.len(), 2);
        assert_eq!(
            form.take_file("imageCover").map(|u| u.file_name),
            Some("cover.png".to_owned())
        );
        assert!(form.take_file("imageCover").is_none());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("red, blue,,  "), vec!["red", "blue"]);
        assert!(split_list("").is_empty());
    }
}
