use std::fmt;

/// Which script of an artifact is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScriptKind {
    Pre,
    Post,
    /// The single script of a function artifact.
    Function,
}

impl ScriptKind {
    /// Suffix a local file name must end with to hold this kind of script.
    pub fn file_suffix(self) -> &'static str {
        match self {
            ScriptKind::Pre => "pre.js",
            ScriptKind::Post => "post.js",
            ScriptKind::Function => ".js",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScriptKind::Pre => "pre",
            ScriptKind::Post => "post",
            ScriptKind::Function => "function",
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactType {
    Action,
    Function,
}

/// A remote script object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Stable ID used to fetch script content.
    pub id: String,
    /// Human readable identifier used to find the local file.
    pub display_id: String,
    pub name: String,
    /// Datastore name for actions, project display ID for functions.
    pub container: String,
    /// Project the artifact was listed from.
    pub project_id: String,
    pub artifact_type: ArtifactType,
}

impl Artifact {
    /// Script kinds checked for this artifact, in processing order.
    pub fn script_kinds(&self) -> &'static [ScriptKind] {
        match self.artifact_type {
            ArtifactType::Action => &[ScriptKind::Pre, ScriptKind::Post],
            ArtifactType::Function => &[ScriptKind::Function],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datastore {
    pub id: String,
    pub name: String,
    pub display_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedName {
    pub en: String,
    pub ja: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptVar {
    pub name: String,
    pub value: String,
}

/// Scalar settings and environment variables of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSettings {
    pub display_id: String,
    pub name: LocalizedName,
    pub script_vars: Vec<ScriptVar>,
}
