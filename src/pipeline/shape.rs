use serde_json::{Value, json};

/// Declared type of a single record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    TextList,
    RecordList(&'static Shape),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Declarative description of a record: which fields exist, how they are
/// typed, and which are required. Shapes are defined as statics and shared
/// read-only.
#[derive(Debug, PartialEq, Eq)]
pub struct Shape {
    pub fields: &'static [FieldSpec],
}

/// A single shape mismatch, pointing at the offending field by path
/// (e.g. `expenses[1].amount`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub reason: String,
}

impl Violation {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl Shape {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Checks `value` against the declared fields. A missing or null required
    /// field and any present-but-wrong-typed field (optional ones included)
    /// are violations; fields the shape does not declare are ignored. An
    /// empty string and the number zero are ordinary present values.
    pub fn validate(&self, value: &Value) -> Result<(), Violation> {
        self.validate_at(value, "")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), Violation> {
        let Some(object) = value.as_object() else {
            let at = if path.is_empty() { "(root)" } else { path };
            return Err(Violation::new(
                at,
                format!("expected an object, got {}", type_name(value)),
            ));
        };

        for field in self.fields {
            let field_path = join_path(path, field.name);
            match object.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        return Err(Violation::new(field_path, "missing required field"));
                    }
                }
                Some(present) => check_kind(field.kind, present, &field_path)?,
            }
        }

        Ok(())
    }

    /// JSON Schema rendition of this shape, used as the response shape
    /// descriptor sent to the backend.
    pub fn json_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for field in self.fields {
            properties.insert(field.name.to_string(), field.kind.json_schema());
            if field.required {
                required.push(Value::String(field.name.to_string()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

impl FieldKind {
    fn json_schema(&self) -> Value {
        match self {
            FieldKind::Text => json!({"type": "string"}),
            FieldKind::Number => json!({"type": "number"}),
            FieldKind::TextList => json!({"type": "array", "items": {"type": "string"}}),
            FieldKind::RecordList(shape) => json!({"type": "array", "items": shape.json_schema()}),
        }
    }
}

fn check_kind(kind: FieldKind, value: &Value, path: &str) -> Result<(), Violation> {
    match kind {
        FieldKind::Text => {
            if !value.is_string() {
                return Err(Violation::new(
                    path,
                    format!("expected text, got {}", type_name(value)),
                ));
            }
        }
        FieldKind::Number => {
            if !value.is_number() {
                return Err(Violation::new(
                    path,
                    format!("expected a number, got {}", type_name(value)),
                ));
            }
        }
        FieldKind::TextList => {
            let Some(items) = value.as_array() else {
                return Err(Violation::new(
                    path,
                    format!("expected a list of text, got {}", type_name(value)),
                ));
            };
            for (index, item) in items.iter().enumerate() {
                if !item.is_string() {
                    return Err(Violation::new(
                        format!("{path}[{index}]"),
                        format!("expected text, got {}", type_name(item)),
                    ));
                }
            }
        }
        FieldKind::RecordList(shape) => {
            let Some(items) = value.as_array() else {
                return Err(Violation::new(
                    path,
                    format!("expected a list of records, got {}", type_name(value)),
                ));
            };
            for (index, item) in items.iter().enumerate() {
                shape.validate_at(item, &format!("{path}[{index}]"))?;
            }
        }
    }

    Ok(())
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
