//! Rust type to JSON Schema mapping
//!
//! Both the source scanner and `#[derive(TypeSync)]` describe models as
//! [`ModelDescriptor`]s: field names, the field type as written in Rust and
//! the raw attribute text. This module turns those descriptors into the
//! JSON-Schema values the extractor consumes, honouring the serde attributes
//! that change the serialized shape.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use syn::meta::ParseNestedMeta;
use syn::{token, Expr, ExprLit, Lit, Meta, Token};

use crate::utils::naming::apply_naming_convention;

static LIFETIME_OR_MUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"'[A-Za-z_][A-Za-z0-9_]*|\bmut\b|\bdyn\b").expect("lifetime regex is valid")
});

/// A struct field as written in Rust
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    /// Type tokens, e.g. `Option < Vec < String > >`
    pub rust_type: String,
    pub docs: Vec<String>,
    /// Attribute contents without `#[ ]`, e.g. `serde (rename = "id")`
    pub attributes: Vec<String>,
}

/// A model struct as written in Rust
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub name: String,
    pub module_path: String,
    pub attributes: Vec<String>,
    pub fields: Vec<FieldDescriptor>,
}

/// A unit-only enum that serializes as a string
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDescriptor {
    pub name: String,
    pub attributes: Vec<String>,
    /// Variant identifiers with their attribute contents
    pub variants: Vec<(String, Vec<String>)>,
}

impl EnumDescriptor {
    /// Serialized variant names after applying serde renames
    pub fn serialized_variants(&self) -> Vec<String> {
        let rename_all = SerdeOptions::parse(&self.attributes).value("rename_all").map(str::to_string);

        self.variants
            .iter()
            .map(|(variant, attrs)| (variant, SerdeOptions::parse(attrs)))
            .filter(|(_, options)| !options.skipped())
            .map(|(variant, options)| match options.value("rename") {
                Some(renamed) => renamed.to_string(),
                None => match &rename_all {
                    Some(convention) => apply_naming_convention(variant, convention),
                    None => variant.clone(),
                },
            })
            .collect()
    }
}

/// String enums known to a container, by type name
pub type EnumCatalog = HashMap<String, Vec<String>>;

/// Build the catalog for a set of enum descriptors
pub fn enum_catalog<'a>(enums: impl IntoIterator<Item = &'a EnumDescriptor>) -> EnumCatalog {
    enums
        .into_iter()
        .map(|e| (e.name.clone(), e.serialized_variants()))
        .collect()
}

/// Build the JSON Schema object for a model
pub fn model_schema(model: &ModelDescriptor, enums: &EnumCatalog) -> Value {
    let model_options = SerdeOptions::parse(&model.attributes);
    let rename_all = model_options.value("rename_all");
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in &model.fields {
        let options = SerdeOptions::parse(&field.attributes);
        if options.skipped() {
            continue;
        }

        let raw_name = field.name.trim_start_matches("r#");
        let name = match options.value("rename") {
            Some(renamed) => renamed.to_string(),
            None => match rename_all {
                Some(convention) => apply_naming_convention(raw_name, convention),
                None => raw_name.to_string(),
            },
        };

        let (mut schema, optional) = map_rust_type(&field.rust_type, enums);

        let description = field
            .docs
            .iter()
            .map(|line| line.strip_prefix(' ').unwrap_or(line).trim_end())
            .collect::<Vec<_>>()
            .join("\n");
        let description = description.trim();
        if !description.is_empty() {
            if let Value::Object(map) = &mut schema {
                map.insert("description".to_string(), Value::String(description.to_string()));
            }
        }

        if !optional && !options.defaulted() {
            required.push(Value::String(name.clone()));
        }
        properties.insert(name, schema);
    }

    json!({
        "title": model.name,
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Map a Rust type to a JSON Schema; the flag reports an `Option` wrapper
pub fn map_rust_type(rust_type: &str, enums: &EnumCatalog) -> (Value, bool) {
    let compact: String = LIFETIME_OR_MUT
        .replace_all(rust_type, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let ty = strip_reference(&compact);
    let (base, args) = split_generic(ty);

    if last_segment(base) == "Option" && args.len() == 1 {
        return (map_type(args[0], enums), true);
    }

    (map_type(ty, enums), false)
}

fn map_type(ty: &str, enums: &EnumCatalog) -> Value {
    let ty = strip_reference(ty);

    // [T] and [T; N]
    if let Some(inner) = ty.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        let element = split_top_level(inner, ';')[0];
        return json!({"type": "array", "items": map_type(element, enums)});
    }
    if ty.starts_with('(') {
        return json!({});
    }

    let (base, args) = split_generic(ty);
    let name = last_segment(base);

    match (name, args.as_slice()) {
        ("Option", [inner]) => json!({"anyOf": [map_type(inner, enums), {"type": "null"}]}),
        ("Box" | "Arc" | "Rc" | "Cow", [.., inner]) => map_type(inner, enums),
        ("Vec" | "VecDeque" | "HashSet" | "BTreeSet" | "IndexSet" | "LinkedList", [inner, ..]) => {
            json!({"type": "array", "items": map_type(inner, enums)})
        }
        ("HashMap" | "BTreeMap" | "IndexMap", _) => json!({"type": "object"}),
        ("String" | "str" | "char" | "Uuid" | "PathBuf" | "Path" | "DateTime" | "NaiveDate"
        | "NaiveDateTime" | "NaiveTime" | "Url", _) => json!({"type": "string"}),
        ("i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64" | "u128"
        | "usize", _) => json!({"type": "integer"}),
        ("f32" | "f64" | "Decimal", _) => json!({"type": "number"}),
        ("bool", _) => json!({"type": "boolean"}),
        (other, []) => match enums.get(other) {
            Some(variants) => json!({"type": "string", "enum": variants}),
            None => json!({}),
        },
        _ => json!({}),
    }
}

fn strip_reference(ty: &str) -> &str {
    ty.trim_start_matches('&')
}

/// Split `Base<A,B>` into `Base` and its top-level arguments
fn split_generic(ty: &str) -> (&str, Vec<&str>) {
    match (ty.find('<'), ty.rfind('>')) {
        (Some(open), Some(close)) if close > open => {
            let args = split_top_level(&ty[open + 1..close], ',')
                .into_iter()
                .filter(|arg| !arg.is_empty())
                .collect();
            (&ty[..open], args)
        }
        _ => (ty, Vec::new()),
    }
}

fn split_top_level(s: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Keys and string values found in `serde(...)` attributes
#[derive(Debug, Default)]
struct SerdeOptions {
    keys: HashSet<String>,
    values: HashMap<String, String>,
}

impl SerdeOptions {
    /// Attributes that are not `serde(...)` lists are ignored
    fn parse(attributes: &[String]) -> Self {
        let mut options = Self::default();

        for attr in attributes {
            let Ok(Meta::List(list)) = syn::parse_str::<Meta>(attr) else {
                continue;
            };
            if !list.path.is_ident("serde") {
                continue;
            }

            let parsed = list.parse_nested_meta(|meta| {
                let Some(key) = meta.path.get_ident().map(ToString::to_string) else {
                    return skip_nested(meta);
                };
                if meta.input.peek(Token![=]) {
                    if let Expr::Lit(ExprLit { lit: Lit::Str(value), .. }) = meta.value()?.parse::<Expr>()? {
                        options.values.entry(key.clone()).or_insert_with(|| value.value());
                    }
                } else if meta.input.peek(token::Paren) {
                    meta.parse_nested_meta(skip_nested)?;
                }
                options.keys.insert(key);
                Ok(())
            });
            if let Err(error) = parsed {
                tracing::debug!(attribute = %attr, error = %error, "Ignoring malformed serde attribute");
            }
        }

        options
    }

    fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn has(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn skipped(&self) -> bool {
        self.has("skip") || self.has("skip_serializing")
    }

    /// The field may be absent from serialized data
    fn defaulted(&self) -> bool {
        self.has("default") || self.has("skip_serializing_if")
    }
}

/// Consume a nested meta item we do not interpret
fn skip_nested(meta: ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(token::Paren) {
        meta.parse_nested_meta(skip_nested)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("String", json!({"type": "string"}))]
    #[case("& 'a str", json!({"type": "string"}))]
    #[case("chrono :: DateTime < Utc >", json!({"type": "string"}))]
    #[case("u64", json!({"type": "integer"}))]
    #[case("f32", json!({"type": "number"}))]
    #[case("bool", json!({"type": "boolean"}))]
    #[case("Vec < String >", json!({"type": "array", "items": {"type": "string"}}))]
    #[case("[u8 ; 32]", json!({"type": "array", "items": {"type": "integer"}}))]
    #[case("Box < Vec < i32 > >", json!({"type": "array", "items": {"type": "integer"}}))]
    #[case("HashMap < String , i32 >", json!({"type": "object"}))]
    #[case("Cow < 'a , str >", json!({"type": "string"}))]
    #[case("& mut Vec < bool >", json!({"type": "array", "items": {"type": "boolean"}}))]
    #[case("serde_json :: Value", json!({}))]
    #[case("(i32 , i32)", json!({}))]
    fn maps_rust_types(#[case] rust_type: &str, #[case] expected: Value) {
        let (schema, optional) = map_rust_type(rust_type, &EnumCatalog::new());
        assert_eq!(schema, expected);
        assert!(!optional);
    }

    #[test]
    fn option_marks_field_optional() {
        let (schema, optional) = map_rust_type("Option < Vec < Option < i64 > > >", &EnumCatalog::new());
        assert!(optional);
        assert_eq!(
            schema,
            json!({"type": "array", "items": {"anyOf": [{"type": "integer"}, {"type": "null"}]}})
        );
    }

    #[test]
    fn known_enums_become_string_literals() {
        let status = EnumDescriptor {
            name: "Status".to_string(),
            attributes: vec!["serde (rename_all = \"snake_case\")".to_string()],
            variants: vec![
                ("InProgress".to_string(), vec![]),
                ("Done".to_string(), vec!["serde (rename = \"finished\")".to_string()]),
                ("Hidden".to_string(), vec!["serde (skip)".to_string()]),
            ],
        };
        let catalog = enum_catalog([&status]);

        let (schema, _) = map_rust_type("crate :: Status", &catalog);
        assert_eq!(schema, json!({"type": "string", "enum": ["in_progress", "finished"]}));
    }

    #[test]
    fn model_schema_honours_serde_attributes() {
        let model = ModelDescriptor {
            name: "Account".to_string(),
            module_path: "app::models".to_string(),
            attributes: vec![
                "derive (Serialize , TypeSync)".to_string(),
                "serde (rename_all = \"camelCase\")".to_string(),
            ],
            fields: vec![
                FieldDescriptor {
                    name: "display_name".to_string(),
                    rust_type: "String".to_string(),
                    docs: vec![" Name shown in the UI".to_string()],
                    attributes: vec![],
                },
                FieldDescriptor {
                    name: "r#type".to_string(),
                    rust_type: "String".to_string(),
                    docs: vec![],
                    attributes: vec!["serde (rename = \"kind\")".to_string()],
                },
                FieldDescriptor {
                    name: "password_hash".to_string(),
                    rust_type: "String".to_string(),
                    docs: vec![],
                    attributes: vec!["serde (skip)".to_string()],
                },
                FieldDescriptor {
                    name: "login_count".to_string(),
                    rust_type: "u32".to_string(),
                    docs: vec![],
                    attributes: vec!["serde (default)".to_string()],
                },
                FieldDescriptor {
                    name: "nickname".to_string(),
                    rust_type: "Option < String >".to_string(),
                    docs: vec![],
                    attributes: vec!["serde (skip_serializing_if = \"Option::is_none\")".to_string()],
                },
            ],
        };

        let schema = model_schema(&model, &EnumCatalog::new());
        assert_eq!(
            schema,
            json!({
                "title": "Account",
                "type": "object",
                "properties": {
                    "displayName": {"type": "string", "description": "Name shown in the UI"},
                    "kind": {"type": "string"},
                    "loginCount": {"type": "integer"},
                    "nickname": {"type": "string"},
                },
                "required": ["displayName", "kind"],
            })
        );
        let keys: Vec<_> = schema["properties"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["displayName", "kind", "loginCount", "nickname"]);
    }

    #[rstest]
    #[case("serde (rename = \"default\")", Some("default"), true)]
    #[case("serde (rename = \"skip\")", Some("skip"), true)]
    #[case("serde (rename (serialize = \"out\" , deserialize = \"in\") , default)", None, false)]
    #[case("serde (with = \"skip_serializing_if\")", None, true)]
    #[case("doc = \"skip\"", None, true)]
    fn serde_keys_are_matched_outside_string_literals(
        #[case] attribute: &str,
        #[case] renamed: Option<&str>,
        #[case] required: bool,
    ) {
        let model = ModelDescriptor {
            name: "Setting".to_string(),
            module_path: "app::models".to_string(),
            attributes: vec![],
            fields: vec![FieldDescriptor {
                name: "value".to_string(),
                rust_type: "String".to_string(),
                docs: vec![],
                attributes: vec![attribute.to_string()],
            }],
        };

        let schema = model_schema(&model, &EnumCatalog::new());
        let name = renamed.unwrap_or("value");

        assert_eq!(schema["properties"][name], json!({"type": "string"}));
        assert_eq!(schema["required"], if required { json!([name]) } else { json!([]) });
    }

    #[test]
    fn variant_renamed_to_skip_is_kept() {
        let mode = EnumDescriptor {
            name: "Mode".to_string(),
            attributes: vec![],
            variants: vec![
                ("Pass".to_string(), vec!["serde (rename = \"skip\")".to_string()]),
                ("Fail".to_string(), vec!["serde (skip_serializing)".to_string()]),
            ],
        };

        assert_eq!(mode.serialized_variants(), vec!["skip"]);
    }
}
