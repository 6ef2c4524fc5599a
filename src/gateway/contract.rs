// src/gateway/contract.rs

//! Declarative input contracts.
//!
//! A contract is the only place an operation's argument rules live. The
//! dispatcher runs [`InputContract::validate`] before any handler is invoked,
//! and `tools/list` advertises [`InputContract::json_schema`] so callers see
//! the same rules the gateway enforces.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Map, Number, Value};

use crate::utils::is_evm_address;

/// Primitive type of a single argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl FieldKind {
    fn schema_type(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
        }
    }
}

/// Extra constraints checked after the value has been coerced to its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Refinement {
    /// `^0x[a-fA-F0-9]{40}$`
    EvmAddress,
    StartsWith(&'static str),
    Length(usize),
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
    OneOf(&'static [&'static str]),
    /// Non-negative decimal number written as a string, e.g. `"1.5"`.
    Decimal,
}

fn refused(message: impl Into<String>) -> ViolationReason {
    ViolationReason::Refinement {
        message: message.into(),
    }
}

impl Refinement {
    fn check(&self, value: &Value) -> Result<(), ViolationReason> {
        match self {
            Refinement::EvmAddress => match value.as_str() {
                Some(s) if is_evm_address(s) => Ok(()),
                _ => Err(refused("must be a valid 0x address (40 hex characters)")),
            },
            Refinement::StartsWith(prefix) => match value.as_str() {
                Some(s) if s.starts_with(prefix) => Ok(()),
                _ => Err(refused(format!(
                    "must start with '{}'",
                    prefix
                ))),
            },
            Refinement::Length(n) => match value.as_str() {
                Some(s) if s.chars().count() == *n => Ok(()),
                _ => Err(refused(format!(
                    "must be exactly {} characters long",
                    n
                ))),
            },
            Refinement::MinLength(n) => match value.as_str() {
                Some(s) if s.chars().count() >= *n => Ok(()),
                _ => Err(refused(format!(
                    "must be at least {} characters long",
                    n
                ))),
            },
            Refinement::MaxLength(n) => match value.as_str() {
                Some(s) if s.chars().count() <= *n => Ok(()),
                _ => Err(refused(format!(
                    "must be at most {} characters long",
                    n
                ))),
            },
            Refinement::Min(min) => match value.as_f64() {
                Some(v) if v >= *min => Ok(()),
                _ => Err(refused(format!(
                    "must be greater than or equal to {}",
                    min
                ))),
            },
            Refinement::Max(max) => match value.as_f64() {
                Some(v) if v <= *max => Ok(()),
                _ => Err(refused(format!(
                    "must be less than or equal to {}",
                    max
                ))),
            },
            Refinement::OneOf(options) => match value.as_str() {
                Some(s) if options.contains(&s) => Ok(()),
                _ => Err(refused(format!(
                    "must be one of: {}",
                    options.join(", ")
                ))),
            },
            Refinement::Decimal => match value.as_str() {
                Some(s) if is_decimal(s) => Ok(()),
                _ => Err(refused("must be a non-negative decimal number (e.g. \"1.5\")")),
            },
        }
    }

    fn annotate(&self, schema: &mut Map<String, Value>) {
        match self {
            Refinement::EvmAddress => {
                schema.insert("pattern".into(), json!("^0x[a-fA-F0-9]{40}$"));
            }
            Refinement::StartsWith(prefix) => {
                schema.insert("pattern".into(), json!(format!("^{}", regex::escape(prefix))));
            }
            Refinement::Length(n) => {
                schema.insert("minLength".into(), json!(n));
                schema.insert("maxLength".into(), json!(n));
            }
            Refinement::MinLength(n) => {
                schema.insert("minLength".into(), json!(n));
            }
            Refinement::MaxLength(n) => {
                schema.insert("maxLength".into(), json!(n));
            }
            Refinement::Min(min) => {
                schema.insert("minimum".into(), json!(min));
            }
            Refinement::Max(max) => {
                schema.insert("maximum".into(), json!(max));
            }
            Refinement::OneOf(options) => {
                schema.insert("enum".into(), json!(options));
            }
            Refinement::Decimal => {
                schema.insert("pattern".into(), json!(r"^\d+(\.\d+)?$"));
            }
        }
    }
}

fn is_decimal(s: &str) -> bool {
    let s = s.trim();
    let mut parts = s.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let frac = parts.next();
    let digits = |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit());
    match frac {
        Some(f) => digits(whole) && digits(f),
        None => digits(whole),
    }
}

/// One declared argument.
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    kind: FieldKind,
    description: &'static str,
    required: bool,
    default: Option<Value>,
    refinements: Vec<Refinement>,
}

impl Field {
    fn new(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: true,
            default: None,
            refinements: Vec::new(),
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::String, description)
    }

    pub fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Integer, description)
    }

    pub fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Number, description)
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean, description)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Declares a default. Defaulted fields are never reported missing.
    /// The default is stored coerced to the field's kind, so `"10"` on an
    /// integer field is advertised as `10`.
    pub fn default(mut self, value: Value) -> Self {
        self.required = false;
        self.default = Some(self.coerce(&value).unwrap_or(value));
        self
    }

    pub fn refine(mut self, refinement: Refinement) -> Self {
        self.refinements.push(refinement);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Coerces a raw JSON value into this field's kind.
    fn coerce(&self, raw: &Value) -> Result<Value, ViolationReason> {
        let mismatch = || ViolationReason::TypeMismatch {
            expected: self.kind.schema_type(),
            found: json_type_name(raw),
        };
        match self.kind {
            FieldKind::String => match raw {
                Value::String(_) => Ok(raw.clone()),
                _ => Err(mismatch()),
            },
            FieldKind::Integer => match raw {
                Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        Ok(Value::from(i))
                    } else if let Some(f) = n.as_f64().filter(|f| f.fract() == 0.0) {
                        Ok(Value::from(f as i64))
                    } else {
                        Err(mismatch())
                    }
                }
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| ViolationReason::Unparseable {
                        expected: "integer",
                        value: s.clone(),
                    }),
                _ => Err(mismatch()),
            },
            FieldKind::Number => match raw {
                Value::Number(_) => Ok(raw.clone()),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| ViolationReason::Unparseable {
                        expected: "number",
                        value: s.clone(),
                    }),
                _ => Err(mismatch()),
            },
            FieldKind::Boolean => match raw {
                Value::Bool(_) => Ok(raw.clone()),
                Value::String(s) if s.trim() == "true" => Ok(Value::Bool(true)),
                Value::String(s) if s.trim() == "false" => Ok(Value::Bool(false)),
                _ => Err(mismatch()),
            },
        }
    }

    fn schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), json!(self.kind.schema_type()));
        schema.insert("description".into(), json!(self.description));
        if let Some(default) = &self.default {
            schema.insert("default".into(), default.clone());
        }
        for refinement in &self.refinements {
            refinement.annotate(&mut schema);
        }
        Value::Object(schema)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationReason {
    Missing,
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    Unparseable {
        expected: &'static str,
        value: String,
    },
    Refinement { message: String },
    NotAnObject,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationReason::Missing => write!(f, "is required"),
            ViolationReason::TypeMismatch { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            ViolationReason::Unparseable { expected, value } => {
                write!(f, "could not parse '{}' as {}", value, expected)
            }
            ViolationReason::Refinement { message } => write!(f, "{}", message),
            ViolationReason::NotAnObject => write!(f, "arguments must be a JSON object"),
        }
    }
}

/// A rejected field together with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub field: String,
    pub reason: ViolationReason,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' {}", self.field, self.reason)
    }
}

/// Ordered set of argument declarations for one operation.
#[derive(Debug, Clone, Default)]
pub struct InputContract {
    fields: Vec<Field>,
}

impl InputContract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Validates, coerces and defaults raw arguments.
    ///
    /// Every field is checked before returning, so the error lists all
    /// violations rather than the first one found. Keys not declared by the
    /// contract are dropped.
    pub fn validate(&self, raw: &Value) -> Result<Map<String, Value>, Vec<Violation>> {
        let empty = Map::new();
        let input = match raw {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(vec![Violation {
                    field: "arguments".into(),
                    reason: ViolationReason::NotAnObject,
                }])
            }
        };

        let mut validated = Map::new();
        let mut violations = Vec::new();

        for field in &self.fields {
            let value = match input.get(field.name) {
                None | Some(Value::Null) => match &field.default {
                    Some(default) => default.clone(),
                    None if field.required => {
                        violations.push(Violation {
                            field: field.name.to_string(),
                            reason: ViolationReason::Missing,
                        });
                        continue;
                    }
                    None => continue,
                },
                Some(raw) => raw.clone(),
            };

            let coerced = match field.coerce(&value) {
                Ok(v) => v,
                Err(reason) => {
                    violations.push(Violation {
                        field: field.name.to_string(),
                        reason,
                    });
                    continue;
                }
            };

            let mut refined = true;
            for refinement in &field.refinements {
                if let Err(reason) = refinement.check(&coerced) {
                    violations.push(Violation {
                        field: field.name.to_string(),
                        reason,
                    });
                    refined = false;
                }
            }
            if refined {
                validated.insert(field.name.to_string(), coerced);
            }
        }

        if violations.is_empty() {
            Ok(validated)
        } else {
            Err(violations)
        }
    }

    /// JSON Schema advertised to callers in `tools/list`.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            properties.insert(field.name.to_string(), field.schema());
            if field.required {
                required.push(json!(field.name));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paging_contract() -> InputContract {
        InputContract::new()
            .field(
                Field::integer("page", "Page number")
                    .default(json!(1))
                    .refine(Refinement::Min(1.0)),
            )
            .field(
                Field::integer("limit", "Items per page")
                    .default(json!(10))
                    .refine(Refinement::Min(1.0)),
            )
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let args = paging_contract()
            .validate(&json!({"page": "2", "limit": " 5 "}))
            .unwrap();
        assert_eq!(args["page"], json!(2));
        assert_eq!(args["limit"], json!(5));
    }

    #[test]
    fn defaults_apply_for_missing_and_null() {
        let args = paging_contract().validate(&json!({"page": null})).unwrap();
        assert_eq!(args["page"], json!(1));
        assert_eq!(args["limit"], json!(10));

        let args = paging_contract().validate(&Value::Null).unwrap();
        assert_eq!(args["page"], json!(1));
    }

    #[test]
    fn unparseable_numeric_string_is_a_violation() {
        let err = paging_contract()
            .validate(&json!({"page": "two"}))
            .unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err[0].field, "page");
        assert!(matches!(err[0].reason, ViolationReason::Unparseable { .. }));
    }

    #[test]
    fn reports_every_violation() {
        let contract = InputContract::new()
            .field(Field::string("address", "Wallet").refine(Refinement::EvmAddress))
            .field(Field::string("chain", "Chain"))
            .field(
                Field::string("sortBy", "Sort")
                    .default(json!("sales"))
                    .refine(Refinement::OneOf(&["sales", "volume"])),
            )
            .field(Field::integer("limit", "Limit").refine(Refinement::Max(50.0)));

        let err = contract
            .validate(&json!({
                "address": "0x123",
                "sortBy": "floor",
                "limit": 51
            }))
            .unwrap_err();

        let fields: Vec<&str> = err.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["address", "chain", "sortBy", "limit"]);
        assert_eq!(err[1].reason, ViolationReason::Missing);
    }

    #[test]
    fn strings_are_not_silently_stringified() {
        let contract = InputContract::new().field(Field::string("tokenAddress", "Token"));
        let err = contract.validate(&json!({"tokenAddress": 42})).unwrap_err();
        assert_eq!(
            err[0].reason,
            ViolationReason::TypeMismatch {
                expected: "string",
                found: "number"
            }
        );
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let args = paging_contract()
            .validate(&json!({"page": 3, "extra": true}))
            .unwrap();
        assert!(!args.contains_key("extra"));
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let err = paging_contract().validate(&json!([1, 2])).unwrap_err();
        assert_eq!(err[0].reason, ViolationReason::NotAnObject);
    }

    #[test]
    fn decimal_refinement() {
        let contract = InputContract::new()
            .field(Field::string("amount", "Amount").refine(Refinement::Decimal));
        assert!(contract.validate(&json!({"amount": "1"})).is_ok());
        assert!(contract.validate(&json!({"amount": "0.25"})).is_ok());
        assert!(contract.validate(&json!({"amount": "1."})).is_err());
        assert!(contract.validate(&json!({"amount": "-1"})).is_err());
        assert!(contract.validate(&json!({"amount": "abc"})).is_err());
    }

    #[test]
    fn schema_lists_required_fields_and_defaults() {
        let contract = InputContract::new()
            .field(Field::string("chain", "Blockchain network"))
            .field(
                Field::integer("limit", "Number of items")
                    .default(json!(10))
                    .refine(Refinement::Min(1.0)),
            );
        let schema = contract.json_schema();
        assert_eq!(schema["required"], json!(["chain"]));
        assert_eq!(schema["properties"]["limit"]["default"], json!(10));
        assert_eq!(schema["properties"]["limit"]["minimum"], json!(1.0));
        assert_eq!(schema["properties"]["chain"]["type"], json!("string"));
    }

    #[test]
    fn string_defaults_are_stored_coerced() {
        let schema = InputContract::new()
            .field(Field::integer("pageIndex", "Page").default(json!("1")))
            .json_schema();
        assert_eq!(schema["properties"]["pageIndex"]["default"], json!(1));
    }

    #[test]
    fn refusals_explain_the_rule() {
        let contract = InputContract::new()
            .field(Field::string("address", "Wallet").refine(Refinement::EvmAddress))
            .field(Field::string("amount", "Amount").refine(Refinement::Decimal));
        let err = contract
            .validate(&json!({"address": "0x12", "amount": "ten"}))
            .unwrap_err();
        assert_eq!(err.len(), 2);
        assert!(err[0].to_string().contains("valid 0x address"));
        assert!(err[1].to_string().contains("non-negative decimal"));
    }
}
