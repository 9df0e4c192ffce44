//! Typed option records for MSBuild projects.
//!
//! Every record kind has a fixed table of [`FieldSpec`]s naming its fields,
//! their defaults and how they may be mutated. Records are plain values:
//! the driver keeps one long-lived record per kind and clones it for each
//! build request, so requests never share mutable state.
//!
//! Two mutation disciplines exist:
//! - [`Options::accumulate`] appends to list-like fields and never discards
//!   what is already there.
//! - [`Options::overwrite`] replaces a value and tolerates unknown fields, so
//!   probing an optional field never fails a build.

mod fields;

use std::fmt;

use crate::builder::errors::DriverError;
use crate::core::platform::Platform;

/// How a field may be mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Values are appended with a separator.
    Accumulate,
    /// Values replace the current content.
    Overwrite,
}

/// Default value of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Text(&'static str),
    Flag(bool),
    /// `%(FieldName)`: inherit the value MSBuild already has.
    Placeholder,
}

/// Static description of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub default: FieldDefault,
    pub mode: Mutation,
}

impl FieldSpec {
    /// The initial value of this field in a fresh record.
    pub fn default_value(&self) -> String {
        match self.default {
            FieldDefault::Text(s) => s.to_string(),
            FieldDefault::Flag(b) => flag_str(b).to_string(),
            FieldDefault::Placeholder => format!("%({})", self.name),
        }
    }
}

/// Where a record's fields land in the project document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    /// A `PropertyGroup` with a matching `Label`.
    Property,
    /// A child of an `ItemDefinitionGroup`.
    ItemDefinition,
}

/// The fixed set of option record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    Global,
    Output,
    ClCompile,
    Link,
    Lib,
    ResourceCompile,
    Midl,
}

impl OptionKind {
    pub const ALL: [OptionKind; 7] = [
        OptionKind::Global,
        OptionKind::Output,
        OptionKind::ClCompile,
        OptionKind::Link,
        OptionKind::Lib,
        OptionKind::ResourceCompile,
        OptionKind::Midl,
    ];

    /// Name of the template node this record merges into.
    pub fn role(&self) -> &'static str {
        match self {
            OptionKind::Global => "Globals",
            OptionKind::Output => "Outputs",
            OptionKind::ClCompile => "ClCompile",
            OptionKind::Link => "Link",
            OptionKind::Lib => "Lib",
            OptionKind::ResourceCompile => "ResourceCompile",
            OptionKind::Midl => "Midl",
        }
    }

    pub fn group(&self) -> Group {
        match self {
            OptionKind::Global | OptionKind::Output => Group::Property,
            _ => Group::ItemDefinition,
        }
    }

    /// The field table of this kind.
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            OptionKind::Global => fields::GLOBAL,
            OptionKind::Output => fields::OUTPUT,
            OptionKind::ClCompile => fields::CL_COMPILE,
            OptionKind::Link => fields::LINK,
            OptionKind::Lib => fields::LIB,
            OptionKind::ResourceCompile => fields::RESOURCE_COMPILE,
            OptionKind::Midl => fields::MIDL,
        }
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name == field)
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role())
    }
}

/// One option record: a value for every field declared by its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    kind: OptionKind,
    values: Vec<String>,
}

impl Options {
    /// A record of `kind` holding the default of every field.
    pub fn new(kind: OptionKind) -> Self {
        Options {
            kind,
            values: kind.fields().iter().map(FieldSpec::default_value).collect(),
        }
    }

    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    /// Current value of `field`, or `None` if the field is not declared.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.kind.position(field).map(|i| self.values[i].as_str())
    }

    /// All fields with their current values, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static FieldSpec, &str)> + '_ {
        self.kind
            .fields()
            .iter()
            .zip(self.values.iter().map(String::as_str))
    }

    /// Append `values` to an accumulate-mode field, joined by `separator`.
    ///
    /// An empty `values` leaves the field untouched. Existing content is kept
    /// and the new values follow it after one more `separator`.
    pub fn accumulate<I, S>(
        &mut self,
        field: &str,
        values: I,
        separator: &str,
    ) -> Result<(), DriverError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let index = self.kind.position(field).ok_or_else(|| DriverError::UnknownField {
            record: self.kind.role().to_string(),
            field: field.to_string(),
        })?;
        if self.kind.fields()[index].mode != Mutation::Accumulate {
            return Err(DriverError::NotAccumulable {
                record: self.kind.role().to_string(),
                field: field.to_string(),
            });
        }

        let joined = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(separator);
        if joined.is_empty() {
            return Ok(());
        }

        let current = &mut self.values[index];
        if current.is_empty() {
            *current = joined;
        } else {
            current.push_str(separator);
            current.push_str(&joined);
        }
        Ok(())
    }

    /// Replace the value of `field`.
    ///
    /// Returns `false`, after logging a warning, if the record does not
    /// declare `field`.
    pub fn overwrite(&mut self, field: &str, value: impl Into<String>) -> bool {
        let applied = self.set(field, value);
        if !applied {
            tracing::warn!("`{}` is not an option of `{}`; ignoring it", field, self.kind);
        }
        applied
    }

    /// Like [`Options::overwrite`], but silent when the field is missing.
    /// Used for toggles that only some record kinds carry.
    pub fn overwrite_if_present(&mut self, field: &str, value: impl Into<String>) -> bool {
        let applied = self.set(field, value);
        if !applied {
            tracing::trace!("`{}` has no `{}` option", self.kind, field);
        }
        applied
    }

    fn set(&mut self, field: &str, value: impl Into<String>) -> bool {
        match self.kind.position(field) {
            Some(i) => {
                self.values[i] = value.into();
                true
            }
            None => false,
        }
    }

    /// Switch to debug-appropriate settings.
    pub fn for_debug(&mut self) {
        match self.kind {
            OptionKind::Global => {
                self.set("Configuration", "Debug");
                self.set("UseDebugLibraries", flag_str(true));
            }
            OptionKind::ClCompile => {
                self.set("FunctionLevelLinking", flag_str(false));
                self.set("IntrinsicFunctions", flag_str(false));
                self.set("Optimization", "Disabled");
                self.set("RuntimeLibrary", "MultiThreadedDLL");
            }
            OptionKind::Link => {
                self.set("EnableCOMDATFolding", flag_str(false));
                self.set("OptimizeReferences", flag_str(false));
            }
            OptionKind::Output
            | OptionKind::Lib
            | OptionKind::ResourceCompile
            | OptionKind::Midl => {}
        }
    }

    /// Apply platform-dependent settings.
    pub fn for_platform(&mut self, platform: Platform) {
        if self.kind == OptionKind::Global {
            self.set("Platform", platform.msbuild_name());
        }
    }
}

fn flag_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
