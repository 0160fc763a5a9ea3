use std::{collections::BTreeMap, fmt};

/// One value as a form widget hands it over.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Null,
    Text(String),
    Number(f64),
    List(Vec<FormValue>),
    File(FileUpload),
}

#[derive(Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.map(str::to_string),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::Text(value)
    }
}

impl From<f64> for FormValue {
    fn from(value: f64) -> Self {
        FormValue::Number(value)
    }
}

impl From<i64> for FormValue {
    fn from(value: i64) -> Self {
        FormValue::Number(value as f64)
    }
}

impl From<FileUpload> for FormValue {
    fn from(value: FileUpload) -> Self {
        FormValue::File(value)
    }
}

impl<T: Into<FormValue>> From<Vec<T>> for FormValue {
    fn from(values: Vec<T>) -> Self {
        FormValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Untyped field map collected from a product form. Keys may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFormInput {
    fields: BTreeMap<String, FormValue>,
}

impl RawFormInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<FormValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<FormValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Adds a value under `name`, turning a repeated name into a list in
    /// arrival order.
    pub fn append(&mut self, name: &str, value: impl Into<FormValue>) {
        let value = value.into();
        match self.fields.remove(name) {
            None => {
                self.fields.insert(name.to_string(), value);
            }
            Some(FormValue::List(mut items)) => {
                items.push(value);
                self.fields.insert(name.to_string(), FormValue::List(items));
            }
            Some(existing) => {
                self.fields
                    .insert(name.to_string(), FormValue::List(vec![existing, value]));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FormValue> {
        self.fields.remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_collects_repeated_names_in_order() {
        let mut raw = RawFormInput::new();
        raw.append("attribute_value_ids", "1");
        assert_eq!(raw.get("attribute_value_ids"), Some(&FormValue::from("1")));
        raw.append("attribute_value_ids", "2");
        raw.append("attribute_value_ids", "3");
        assert_eq!(
            raw.get("attribute_value_ids"),
            Some(&FormValue::from(vec!["1", "2", "3"]))
        );
        assert_eq!(raw.len(), 1);
    }

    #[test]
    fn file_debug_hides_bytes() {
        let file = FileUpload::new("a.png", Some("image/png"), vec![0u8; 4]);
        let rendered = format!("{file:?}");
        assert!(rendered.contains("len: 4"));
        assert!(!rendered.contains("bytes"));
    }
}
