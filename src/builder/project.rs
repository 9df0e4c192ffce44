//! MSBuild project synthesis.
//!
//! A [`ProjectDescriptor`] starts from a template whose topology is fixed:
//! one `ProjectConfiguration`, a `PropertyGroup` per global record role, an
//! `ItemDefinitionGroup` holding one child per operation record role, and a
//! `Sources` item group. Merging option records only adds, updates or
//! removes leaf elements inside those nodes.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

use crate::builder::errors::DriverError;
use crate::builder::options::{Group, Options};
use crate::builder::xml::{self, Element};
use crate::util::fs::{read_to_string, write_bytes};

/// Name of the default built-in template.
pub const TEMPLATE_NAME: &str = "vcxproj.template";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[(TEMPLATE_NAME, include_str!("vcxproj.template"))];

const PROJECT_CONFIGURATIONS: &str = "ProjectConfigurations";
const SOURCES: &str = "Sources";

/// Look up a built-in template by name.
pub fn builtin_template(name: &str) -> Option<&'static str> {
    BUILTIN_TEMPLATES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, text)| *text)
}

/// One entry of the `Sources` item group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectItem {
    /// Only an `Include` attribute.
    Path(String),
    /// An `Include` attribute plus metadata child elements, in order.
    WithMetadata {
        include: String,
        metadata: Vec<(String, String)>,
    },
}

impl ProjectItem {
    pub fn path(include: impl Into<String>) -> Self {
        ProjectItem::Path(include.into())
    }

    pub fn with_metadata(
        include: impl Into<String>,
        metadata: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        ProjectItem::WithMetadata {
            include: include.into(),
            metadata: metadata
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The `Include` value.
    pub fn include(&self) -> &str {
        match self {
            ProjectItem::Path(p) => p,
            ProjectItem::WithMetadata { include, .. } => include,
        }
    }

    /// Convert an item written in a TOML file.
    ///
    /// A string is a bare path. A table must have a string `Include` key;
    /// every other key must also be a string and becomes metadata.
    pub fn from_toml(value: &toml::Value) -> Result<Self, DriverError> {
        match value {
            toml::Value::String(path) => Ok(ProjectItem::Path(path.clone())),
            toml::Value::Table(table) => {
                let mut include = None;
                let mut metadata = Vec::new();
                for (key, value) in table {
                    let toml::Value::String(text) = value else {
                        return Err(DriverError::UnsupportedItem {
                            found: format!("{} for metadata `{}`", value.type_str(), key),
                        });
                    };
                    if key == "Include" {
                        include = Some(text.clone());
                    } else {
                        metadata.push((key.clone(), text.clone()));
                    }
                }
                let include = include.ok_or_else(|| DriverError::UnsupportedItem {
                    found: "table without `Include`".to_string(),
                })?;
                Ok(ProjectItem::WithMetadata { include, metadata })
            }
            other => Err(DriverError::UnsupportedItem {
                found: other.type_str().to_string(),
            }),
        }
    }

    fn to_element(&self, item_type: &str) -> Element {
        match self {
            ProjectItem::Path(path) => Element::new(item_type).with_attr("Include", path.as_str()),
            ProjectItem::WithMetadata { include, metadata } => {
                let mut element = Element::new(item_type).with_attr("Include", include.as_str());
                for (key, value) in metadata {
                    element.push(Element::new(key.as_str()).with_text(value.as_str()));
                }
                element
            }
        }
    }
}

/// An MSBuild project document being synthesized.
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    source: String,
    root: Element,
}

impl ProjectDescriptor {
    /// Load the default built-in template.
    pub fn from_template() -> Result<Self> {
        Self::load(TEMPLATE_NAME)
    }

    /// Load an existing project file, or a built-in template by name.
    pub fn load(source: impl AsRef<Path>) -> Result<Self> {
        let source = source.as_ref();
        if source.is_file() {
            let text = read_to_string(source)?;
            return Self::parse(source.display().to_string(), &text);
        }

        let name = source.to_string_lossy();
        match builtin_template(&name) {
            Some(text) => Self::parse(name.into_owned(), text),
            None => Err(DriverError::TemplateNotFound {
                source_name: name.into_owned(),
            }
            .into()),
        }
    }

    fn parse(source: String, text: &str) -> Result<Self> {
        let root = xml::parse(text).with_context(|| format!("failed to parse project `{}`", source))?;
        Ok(ProjectDescriptor { source, root })
    }

    /// Where this document was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Merge one option record into the document.
    pub fn merge(&mut self, options: &Options) -> Result<(), DriverError> {
        match options.kind().group() {
            Group::Property => self.merge_global(options),
            Group::ItemDefinition => self.merge_item(options),
        }
    }

    /// Merge several records in order.
    pub fn merge_all<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a Options>,
    ) -> Result<(), DriverError> {
        for options in records {
            self.merge(options)?;
        }
        Ok(())
    }

    fn merge_global(&mut self, options: &Options) -> Result<(), DriverError> {
        let configuration = options.get("Configuration").unwrap_or_default();
        let platform = options.get("Platform").unwrap_or_default();
        if !configuration.is_empty() && !platform.is_empty() {
            let pc = self
                .root
                .child_with_attr_mut("ItemGroup", "Label", PROJECT_CONFIGURATIONS)
                .and_then(|group| group.child_mut("ProjectConfiguration"))
                .ok_or_else(|| missing("ProjectConfiguration"))?;
            pc.set_attr("Include", format!("{}|{}", configuration, platform));
            set_child_text(pc, "Configuration", configuration);
            set_child_text(pc, "Platform", platform);
        }

        let role = options.kind().role();
        let group = self
            .root
            .child_with_attr_mut("PropertyGroup", "Label", role)
            .ok_or_else(|| missing(role))?;

        for (spec, value) in sorted_fields(options) {
            if value.is_empty() {
                // Empty means "inherit", so drop any value left by a previous merge.
                group.remove_children(spec.name);
            } else {
                set_child_text(group, spec.name, value);
            }
        }
        Ok(())
    }

    fn merge_item(&mut self, options: &Options) -> Result<(), DriverError> {
        let role = options.kind().role();
        let group = self
            .root
            .elements_mut()
            .filter(|e| e.name == "ItemDefinitionGroup")
            .find_map(|idg| idg.child_mut(role))
            .ok_or_else(|| missing(role))?;

        for (spec, value) in sorted_fields(options) {
            if !value.is_empty() {
                group.push(Element::new(spec.name).with_text(value));
            }
        }
        Ok(())
    }

    /// Drop every field previously merged into the item definition for `role`.
    pub fn clear_item_definitions(&mut self, role: &str) -> Result<(), DriverError> {
        let group = self
            .root
            .elements_mut()
            .filter(|e| e.name == "ItemDefinitionGroup")
            .find_map(|idg| idg.child_mut(role))
            .ok_or_else(|| missing(role))?;
        group.children.clear();
        Ok(())
    }

    /// Append items of `item_type` (`ClCompile`, `Link`, ...) to the sources group.
    pub fn add_items(&mut self, item_type: &str, items: &[ProjectItem]) -> Result<(), DriverError> {
        let group = self
            .root
            .child_with_attr_mut("ItemGroup", "Label", SOURCES)
            .ok_or_else(|| missing(SOURCES))?;
        for item in items {
            group.push(item.to_element(item_type));
        }
        Ok(())
    }

    /// The `Include` of the project configuration, e.g. `Release|Win32`.
    pub fn project_configuration(&self) -> Option<&str> {
        self.root
            .child_with_attr("ItemGroup", "Label", PROJECT_CONFIGURATIONS)
            .and_then(|group| group.child("ProjectConfiguration"))
            .and_then(|pc| pc.attr("Include"))
    }

    /// Text of `name` inside the property group labelled `role`.
    pub fn property(&self, role: &str, name: &str) -> Option<String> {
        self.root
            .child_with_attr("PropertyGroup", "Label", role)
            .and_then(|group| group.child(name))
            .map(Element::text)
    }

    /// Every value of `name` inside the item definition for `role`.
    pub fn item_definitions(&self, role: &str, name: &str) -> Vec<String> {
        self.root
            .elements()
            .filter(|e| e.name == "ItemDefinitionGroup")
            .filter_map(|idg| idg.child(role))
            .flat_map(|group| group.elements().filter(|e| e.name == name))
            .map(Element::text)
            .collect()
    }

    /// Items of `item_type` in the sources group.
    pub fn items(&self, item_type: &str) -> Vec<&Element> {
        self.root
            .child_with_attr("ItemGroup", "Label", SOURCES)
            .map(|group| group.elements().filter(|e| e.name == item_type).collect())
            .unwrap_or_default()
    }

    /// Render the document as UTF-8 text.
    pub fn to_xml_string(&self) -> Result<String> {
        let bytes = xml::to_bytes(&self.root)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Write the document to `path`, replacing any existing file.
    pub fn serialize(&self, path: &Path) -> Result<()> {
        let bytes = xml::to_bytes(&self.root)
            .with_context(|| format!("failed to serialize project `{}`", self.source))?;
        write_bytes(path, &bytes)
    }
}

impl fmt::Display for ProjectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_xml_string() {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

fn missing(role: &str) -> DriverError {
    DriverError::MissingNode {
        role: role.to_string(),
    }
}

fn sorted_fields(options: &Options) -> Vec<(&'static crate::builder::options::FieldSpec, &str)> {
    let mut fields: Vec<_> = options.iter().collect();
    fields.sort_by_key(|(spec, _)| spec.name);
    fields
}

fn set_child_text(parent: &mut Element, name: &str, text: &str) {
    match parent.child_mut(name) {
        Some(child) => child.set_text(text),
        None => {
            parent.push(Element::new(name).with_text(text));
        }
    }
}
