//! Rust source container
//!
//! Scans `.rs` files for model structs and string enums without compiling
//! them. A struct is a model when one of its attributes matches a configured
//! pattern (by default `#[derive(TypeSync)]`). Like the derive, the scanner
//! honours `#[typesync(name = "...")]`.

use indexmap::IndexMap;
use quote::ToTokens;
use regex::Regex;
use std::path::{Path, PathBuf};
use syn::{parse_file, Attribute, Expr, Fields, Ident, Item, ItemEnum, ItemStruct, Lit, LitStr, Meta};
use walkdir::WalkDir;

use crate::config::ModelsConfig;
use crate::error::{Error, Result};
use crate::models::container::{ModelContainer, RawSchema};
use crate::models::rust_types::{
    enum_catalog, model_schema, EnumCatalog, EnumDescriptor, FieldDescriptor, ModelDescriptor,
};

/// Models discovered in one file or directory of Rust sources
#[derive(Debug)]
pub struct SourceContainer {
    path: String,
    /// Model name to its descriptor, or the reason it cannot be described
    models: IndexMap<String, std::result::Result<ModelDescriptor, String>>,
    enums: EnumCatalog,
}

/// Parsing state shared across the files of one container
struct Scan<'a> {
    patterns: &'a [Regex],
    models: IndexMap<String, std::result::Result<ModelDescriptor, String>>,
    enums: Vec<EnumDescriptor>,
}

impl SourceContainer {
    /// Parse every Rust file under `path`
    pub fn open(path: &Path, config: &ModelsConfig) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Container(format!(
                "Path does not exist: {}",
                path.display()
            )));
        }

        let patterns: Vec<Regex> = config
            .attributes
            .iter()
            .map(|attr| {
                Regex::new(&format!("^(?:{})", attr))
                    .map_err(|e| Error::Config(format!("Invalid attribute regex: {}", e)))
            })
            .collect::<Result<Vec<Regex>>>()?;

        let mut scan = Scan {
            patterns: &patterns,
            models: IndexMap::new(),
            enums: Vec::new(),
        };

        for file in source_files(path, config) {
            scan.process_file(&file)?;
        }

        tracing::debug!(
            container = %path.display(),
            models = scan.models.len(),
            enums = scan.enums.len(),
            "Scanned Rust sources"
        );

        Ok(Self {
            path: path.display().to_string(),
            enums: enum_catalog(&scan.enums),
            models: scan.models,
        })
    }
}

impl ModelContainer for SourceContainer {
    fn path(&self) -> &str {
        &self.path
    }

    fn models(&self) -> Result<Vec<String>> {
        Ok(self.models.keys().cloned().collect())
    }

    fn get_schema(&self, model: &str) -> Result<RawSchema> {
        match self.models.get(model) {
            Some(Ok(descriptor)) => Ok(RawSchema {
                name: descriptor.name.clone(),
                module_path: descriptor.module_path.clone(),
                schema: model_schema(descriptor, &self.enums),
            }),
            Some(Err(reason)) => Err(Error::Parse(reason.clone())),
            None => Err(Error::Container(format!(
                "Model '{}' not found in {}",
                model, self.path
            ))),
        }
    }
}

/// Rust files under `path` in a stable order
fn source_files(path: &Path, config: &ModelsConfig) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let max_depth = if config.recursive_scan { usize::MAX } else { 1 };

    WalkDir::new(path)
        .follow_links(true)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|file| {
            !config
                .exclude_paths
                .iter()
                .any(|exclude| file.starts_with(exclude))
        })
        .filter(|file| file.is_file() && file.extension().map_or(false, |ext| ext == "rs"))
        .collect()
}

impl Scan<'_> {
    /// Process a Rust file and collect model and enum definitions
    fn process_file(&mut self, file_path: &Path) -> Result<()> {
        let file_content = std::fs::read_to_string(file_path)?;
        let syntax = parse_file(&file_content).map_err(|e| {
            Error::Parse(format!("Failed to parse {}: {}", file_path.display(), e))
        })?;

        self.process_items(&syntax.items, &file_path.display().to_string());
        Ok(())
    }

    fn process_items(&mut self, items: &[Item], module_path: &str) {
        for item in items {
            match item {
                Item::Struct(item_struct) if self.is_model(&item_struct.attrs) => {
                    let name = exported_name(&item_struct.ident, &item_struct.attrs);
                    let descriptor = describe_struct(item_struct, &name, module_path);
                    if self.models.insert(name.clone(), descriptor).is_some() {
                        tracing::warn!(model = %name, module = module_path, "Duplicate model name, keeping the last definition");
                    }
                }
                Item::Enum(item_enum) => {
                    if let Some(descriptor) = describe_unit_enum(item_enum) {
                        self.enums.push(descriptor);
                    }
                }
                Item::Mod(item_mod) => {
                    if let Some((_, nested)) = &item_mod.content {
                        let nested_path = format!("{}::{}", module_path, item_mod.ident);
                        self.process_items(nested, &nested_path);
                    }
                }
                _ => {}
            }
        }
    }

    /// Check if a struct carries one of the model marker attributes
    fn is_model(&self, attrs: &[Attribute]) -> bool {
        attrs.iter().any(|attr| {
            let attr_str = compact(&attr.meta.to_token_stream().to_string());
            self.patterns.iter().any(|pattern| pattern.is_match(&attr_str))
        })
    }
}

fn describe_struct(
    item_struct: &ItemStruct,
    name: &str,
    module_path: &str,
) -> std::result::Result<ModelDescriptor, String> {
    let struct_name = item_struct.ident.to_string();

    let fields = match &item_struct.fields {
        Fields::Named(named_fields) => named_fields
            .named
            .iter()
            .filter_map(|field| {
                let name = field.ident.as_ref()?.to_string();
                Some(FieldDescriptor {
                    name,
                    rust_type: field.ty.to_token_stream().to_string(),
                    docs: doc_lines(&field.attrs),
                    attributes: attribute_strings(&field.attrs),
                })
            })
            .collect(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(format!(
                "Only named fields are supported in struct: {}",
                struct_name
            ))
        }
    };

    Ok(ModelDescriptor {
        name: name.to_string(),
        module_path: module_path.to_string(),
        attributes: attribute_strings(&item_struct.attrs),
        fields,
    })
}

/// Enums whose variants carry no data serialize as plain strings
fn describe_unit_enum(item_enum: &ItemEnum) -> Option<EnumDescriptor> {
    if item_enum.variants.is_empty()
        || item_enum
            .variants
            .iter()
            .any(|variant| !matches!(variant.fields, Fields::Unit))
    {
        return None;
    }

    Some(EnumDescriptor {
        name: exported_name(&item_enum.ident, &item_enum.attrs),
        attributes: attribute_strings(&item_enum.attrs),
        variants: item_enum
            .variants
            .iter()
            .map(|variant| (variant.ident.to_string(), attribute_strings(&variant.attrs)))
            .collect(),
    })
}

/// The type name, or the value of `#[typesync(name = "...")]`
fn exported_name(ident: &Ident, attrs: &[Attribute]) -> String {
    let mut name = ident.to_string();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("typesync")) {
        if matches!(attr.meta, Meta::Path(_)) {
            continue;
        }
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = value.value();
                Ok(())
            } else {
                Err(meta.error("unsupported typesync attribute, expected `name`"))
            }
        });
        if let Err(error) = parsed {
            tracing::warn!(model = %ident, error = %error, "Ignoring malformed typesync attribute");
        }
    }

    name
}

/// Contents of `///` comments
fn doc_lines(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) if nv.path.is_ident("doc") => match &nv.value {
                Expr::Lit(expr) => match &expr.lit {
                    Lit::Str(text) => Some(text.value()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect()
}

/// Non-doc attributes rendered without `#[ ]`
fn attribute_strings(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| !attr.path().is_ident("doc"))
        .map(|attr| attr.meta.to_token_stream().to_string())
        .collect()
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
