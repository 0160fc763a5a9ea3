use crate::submission::{
    SubmissionError, form::FileUpload, normalize::NormalizedProductInput,
};

/// Checked in this order; the first failure is reported.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "name",
    "description",
    "category_id",
    "brand_id",
    "price",
    "condition",
    "attribute_value_ids",
];

/// A product form whose required fields are all present and non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedProduct {
    pub name: String,
    pub description: String,
    pub category_id: i64,
    pub brand_id: i64,
    pub price: f64,
    pub condition: String,
    pub attribute_value_ids: Vec<i64>,
    pub images_upload: Vec<FileUpload>,
}

pub fn validate(input: NormalizedProductInput) -> Result<ValidatedProduct, SubmissionError> {
    let name = required_text(REQUIRED_FIELDS[0], input.name)?;
    let description = required_text(REQUIRED_FIELDS[1], input.description)?;
    let category_id = required(REQUIRED_FIELDS[2], input.category_id)?;
    let brand_id = required(REQUIRED_FIELDS[3], input.brand_id)?;
    let price = required(REQUIRED_FIELDS[4], input.price)?;
    let condition = required_text(REQUIRED_FIELDS[5], input.condition)?;
    let attribute_value_ids = required(REQUIRED_FIELDS[6], input.attribute_value_ids)
        .and_then(|ids| {
            if ids.is_empty() {
                Err(missing(REQUIRED_FIELDS[6]))
            } else {
                Ok(ids)
            }
        })?;

    Ok(ValidatedProduct {
        name,
        description,
        category_id,
        brand_id,
        price,
        condition,
        attribute_value_ids,
        images_upload: input.images_upload,
    })
}

fn required<T>(field: &'static str, value: Option<T>) -> Result<T, SubmissionError> {
    value.ok_or_else(|| missing(field))
}

fn required_text(field: &'static str, value: Option<String>) -> Result<String, SubmissionError> {
    required(field, value.filter(|text| !text.trim().is_empty()))
}

fn missing(field: &'static str) -> SubmissionError {
    SubmissionError::Validation { field }
}
