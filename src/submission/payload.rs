use crate::submission::{form::FileUpload, validate::ValidatedProduct};
use reqwest::multipart::{Form, Part};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Text(String),
    File(FileUpload),
}

/// Ordered multipart entries for a product creation request. List-valued
/// fields repeat their name once per element.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPayload {
    entries: Vec<(&'static str, PayloadValue)>,
}

impl ProductPayload {
    pub fn from_product(product: ValidatedProduct) -> Self {
        let mut entries = vec![
            ("name", PayloadValue::Text(product.name)),
            ("description", PayloadValue::Text(product.description)),
            (
                "category_id",
                PayloadValue::Text(product.category_id.to_string()),
            ),
            ("brand_id", PayloadValue::Text(product.brand_id.to_string())),
            ("price", PayloadValue::Text(product.price.to_string())),
            ("condition", PayloadValue::Text(product.condition)),
        ];
        entries.extend(
            product
                .attribute_value_ids
                .iter()
                .map(|id| ("attribute_value_ids", PayloadValue::Text(id.to_string()))),
        );
        entries.extend(
            product
                .images_upload
                .into_iter()
                .map(|file| ("images_upload", PayloadValue::File(file))),
        );
        Self { entries }
    }

    pub fn entries(&self) -> &[(&'static str, PayloadValue)] {
        &self.entries
    }

    /// Text values sent under `name`, in order.
    pub fn texts(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(key, _)| *key == name)
            .filter_map(|(_, value)| match value {
                PayloadValue::Text(text) => Some(text.as_str()),
                PayloadValue::File(_) => None,
            })
            .collect()
    }

    pub fn files(&self, name: &str) -> Vec<&FileUpload> {
        self.entries
            .iter()
            .filter(|(key, _)| *key == name)
            .filter_map(|(_, value)| match value {
                PayloadValue::File(file) => Some(file),
                PayloadValue::Text(_) => None,
            })
            .collect()
    }

    pub fn log_entries(&self, submission_id: Uuid) {
        for (key, value) in &self.entries {
            match value {
                PayloadValue::Text(text) => debug!(
                    target = "storefront.submission",
                    submission_id = %submission_id,
                    field = *key,
                    value = %text,
                    "payload_entry"
                ),
                PayloadValue::File(file) => debug!(
                    target = "storefront.submission",
                    submission_id = %submission_id,
                    field = *key,
                    file_name = %file.file_name,
                    bytes = file.len(),
                    "payload_entry"
                ),
            }
        }
    }

    /// Fails when an upload carries a content type reqwest cannot parse.
    pub fn into_form(self) -> reqwest::Result<Form> {
        self.entries
            .into_iter()
            .try_fold(Form::new(), |form, (key, value)| match value {
                PayloadValue::Text(text) => Ok(form.text(key, text)),
                PayloadValue::File(file) => file_part(file).map(|part| form.part(key, part)),
            })
    }
}

fn file_part(file: FileUpload) -> reqwest::Result<Part> {
    let FileUpload {
        file_name,
        content_type,
        bytes,
    } = file;
    let part = Part::bytes(bytes).file_name(file_name);
    match content_type {
        Some(mime) => part.mime_str(&mime),
        None => Ok(part),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ValidatedProduct {
        ValidatedProduct {
            name: "Shoe".into(),
            description: "Nice".into(),
            category_id: 3,
            brand_id: 5,
            price: 20.0,
            condition: "new".into(),
            attribute_value_ids: vec![1, 2],
            images_upload: vec![FileUpload::new("a.png", Some("image/png"), vec![1; 8])],
        }
    }

    #[test]
    fn scalars_are_sent_once_with_numbers_rendered_plainly() {
        let payload = ProductPayload::from_product(product());
        assert_eq!(payload.texts("name"), vec!["Shoe"]);
        assert_eq!(payload.texts("category_id"), vec!["3"]);
        assert_eq!(payload.texts("brand_id"), vec!["5"]);
        assert_eq!(payload.texts("price"), vec!["20"]);
        assert_eq!(payload.texts("condition"), vec!["new"]);
    }

    #[test]
    fn fractional_price_keeps_its_digits() {
        let payload = ProductPayload::from_product(ValidatedProduct {
            price: 19.99,
            ..product()
        });
        assert_eq!(payload.texts("price"), vec!["19.99"]);
    }

    #[test]
    fn list_fields_repeat_in_input_order() {
        let payload = ProductPayload::from_product(ValidatedProduct {
            attribute_value_ids: vec![9, 4, 7],
            images_upload: vec![
                FileUpload::new("b.png", None, vec![2]),
                FileUpload::new("a.png", None, vec![1]),
            ],
            ..product()
        });
        assert_eq!(payload.texts("attribute_value_ids"), vec!["9", "4", "7"]);
        let files: Vec<&str> = payload
            .files("images_upload")
            .into_iter()
            .map(|file| file.file_name.as_str())
            .collect();
        assert_eq!(files, vec!["b.png", "a.png"]);
        let keys: Vec<&str> = payload.entries().iter().map(|(key, _)| *key).collect();
        assert_eq!(
            keys,
            vec![
                "name",
                "description",
                "category_id",
                "brand_id",
                "price",
                "condition",
                "attribute_value_ids",
                "attribute_value_ids",
                "attribute_value_ids",
                "images_upload",
                "images_upload",
            ]
        );
    }

    #[test]
    fn no_images_means_no_image_entries() {
        let payload = ProductPayload::from_product(ValidatedProduct {
            images_upload: vec![],
            ..product()
        });
        assert!(payload.files("images_upload").is_empty());
    }

    #[test]
    fn unparseable_upload_content_type_fails_the_form() {
        let payload = ProductPayload::from_product(ValidatedProduct {
            images_upload: vec![FileUpload::new("a.png", Some("not a mime"), vec![1])],
            ..product()
        });
        assert!(payload.into_form().is_err());

        let payload = ProductPayload::from_product(ValidatedProduct {
            images_upload: vec![
                FileUpload::new("a.png", Some("image/png"), vec![1]),
                FileUpload::new("b.bin", None, vec![2]),
            ],
            ..product()
        });
        assert!(payload.into_form().is_ok());
    }
}
