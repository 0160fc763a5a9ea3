use crate::submission::form::{FileUpload, FormValue, RawFormInput};
use tracing::debug;

/// Product fields after trimming and numeric coercion. A field that was
/// missing or could not be coerced is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub price: Option<f64>,
    pub condition: Option<String>,
    pub attribute_value_ids: Option<Vec<i64>>,
    pub images_upload: Vec<FileUpload>,
}

pub fn normalize(mut raw: RawFormInput) -> NormalizedProductInput {
    let category_id = take_integer(&mut raw, "category_id");
    let category_fallback = take_integer(&mut raw, "category");
    let brand_id = take_integer(&mut raw, "brand_id");
    let brand_fallback = take_integer(&mut raw, "brand");

    NormalizedProductInput {
        name: raw.remove("name").as_ref().and_then(text),
        description: raw.remove("description").as_ref().and_then(text),
        category_id: category_id.or(category_fallback),
        brand_id: brand_id.or(brand_fallback),
        price: raw.remove("price").as_ref().and_then(number),
        condition: raw.remove("condition").as_ref().and_then(text),
        attribute_value_ids: integer_list(raw.remove("attribute_value_ids")),
        images_upload: files(raw.remove("images_upload")),
    }
}

fn take_integer(raw: &mut RawFormInput, name: &str) -> Option<i64> {
    raw.remove(name).as_ref().and_then(integer)
}

fn text(value: &FormValue) -> Option<String> {
    match value {
        FormValue::Text(s) => Some(s.trim().to_string()),
        FormValue::Number(n) if n.is_finite() => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: &FormValue) -> Option<f64> {
    let parsed = match value {
        FormValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        FormValue::Number(n) => *n,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

fn integer(value: &FormValue) -> Option<i64> {
    if let FormValue::Text(s) = value
        && let Ok(parsed) = s.trim().parse::<i64>()
    {
        return Some(parsed);
    }
    let n = number(value)?;
    (n.fract() == 0.0 && n.abs() < i64::MAX as f64).then_some(n as i64)
}

// An absent list is empty; a list with any element that fails to coerce is
// treated as not provided.
fn integer_list(value: Option<FormValue>) -> Option<Vec<i64>> {
    match value {
        None | Some(FormValue::Null) => Some(Vec::new()),
        Some(FormValue::List(items)) => items.iter().map(integer).collect(),
        Some(scalar) => integer(&scalar).map(|id| vec![id]),
    }
}

fn files(value: Option<FormValue>) -> Vec<FileUpload> {
    let items = match value {
        None => return Vec::new(),
        Some(FormValue::List(items)) => items,
        Some(other) => vec![other],
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            FormValue::File(file) => Some(file),
            _ => {
                debug!(
                    target = "storefront.submission",
                    field = "images_upload",
                    "non_file_upload_skipped"
                );
                None
            }
        })
        .collect()
}
