use super::shape::{FieldKind, FieldSpec, Shape};
use crate::{Error, Result};
use serde_json::Value;

/// Static prompt text with `{{field}}` placeholders, plus the fixed
/// per-element line template for each sequence field it repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: &'static str,
    element_templates: &'static [(&'static str, &'static str)],
}

impl PromptTemplate {
    pub const fn new(text: &'static str) -> Self {
        Self {
            text,
            element_templates: &[],
        }
    }

    pub const fn with_elements(
        text: &'static str,
        element_templates: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            text,
            element_templates,
        }
    }

    /// Verifies every placeholder resolves to a declared field, and every
    /// element template belongs to a record-sequence field and only
    /// references that record's fields. Runs once when a config is built,
    /// never per call.
    pub fn check_against(&self, shape: &Shape) -> Result<()> {
        for name in scan_placeholders(self.text) {
            if shape.field(name).is_none() {
                return Err(Error::config(format!(
                    "template references unknown field '{name}'"
                )));
            }
        }

        for (field_name, element_text) in self.element_templates {
            let field = shape.field(field_name).ok_or_else(|| {
                Error::config(format!(
                    "element template bound to unknown field '{field_name}'"
                ))
            })?;
            let FieldKind::RecordList(element_shape) = field.kind else {
                return Err(Error::config(format!(
                    "field '{field_name}' has an element template but is not a record sequence"
                )));
            };
            for name in scan_placeholders(element_text) {
                if element_shape.field(name).is_none() {
                    return Err(Error::config(format!(
                        "element template for '{field_name}' references unknown field '{name}'"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Renders a request already validated against `shape`. Three rules:
    /// scalar substitution, empty substitution for absent optional fields,
    /// and ordered-sequence repetition (one line per element, input order
    /// preserved).
    pub fn render(&self, shape: &Shape, request: &Value) -> String {
        let mut out = self.text.to_string();

        for field in shape.fields {
            let placeholder = format!("{{{{{}}}}}", field.name);
            if !out.contains(placeholder.as_str()) {
                continue;
            }
            let rendered = self.render_field(field, request);
            out = out.replace(placeholder.as_str(), &rendered);
        }

        out
    }

    fn render_field(&self, field: &FieldSpec, request: &Value) -> String {
        let value = match request.get(field.name) {
            None | Some(Value::Null) => return String::new(),
            Some(value) => value,
        };

        match field.kind {
            FieldKind::Text => value.as_str().unwrap_or_default().to_string(),
            FieldKind::Number => value.to_string(),
            FieldKind::TextList => {
                let Some(items) = value.as_array() else {
                    return String::new();
                };
                items
                    .iter()
                    .map(|item| item.as_str().unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
            FieldKind::RecordList(element_shape) => {
                let Some(items) = value.as_array() else {
                    return String::new();
                };
                let element_text = self
                    .element_templates
                    .iter()
                    .find(|(name, _)| *name == field.name)
                    .map(|(_, text)| *text);
                let Some(element_text) = element_text else {
                    return value.to_string();
                };
                items
                    .iter()
                    .map(|item| render_element(element_text, element_shape, item))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
    }
}

fn render_element(text: &str, shape: &Shape, item: &Value) -> String {
    let mut out = text.to_string();

    for field in shape.fields {
        let placeholder = format!("{{{{{}}}}}", field.name);
        let rendered = match item.get(field.name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(value) => value.to_string(),
        };
        out = out.replace(placeholder.as_str(), &rendered);
    }

    out
}

fn scan_placeholders(text: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let name = after[..end].trim();
        if !name.is_empty() {
            names.push(name);
        }
        rest = &after[end + 2..];
    }

    names
}
