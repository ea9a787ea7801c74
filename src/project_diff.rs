//! Comparison of two remote projects.
//!
//! Settings, environment variables, functions and actions are matched by key
//! in both directions, so anything present in only one project is reported
//! no matter which side it is on.

use crate::artifact::{Artifact, ScriptKind, ScriptVar};
use crate::remote::{RemoteError, RemoteStore};
use crate::text_diff::{DiffEngine, RenderedDiff};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use tracing::{info, warn};

pub const DEFAULT_LARGE_VALUE_THRESHOLD: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("Failed to load settings of project {project}: {source}")]
    Settings {
        project: String,
        source: RemoteError,
    },
    #[error("Failed to list functions of project {project}: {source}")]
    Functions {
        project: String,
        source: RemoteError,
    },
    #[error("Failed to list actions of project {project}: {source}")]
    Actions {
        project: String,
        source: RemoteError,
    },
}

#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Environment variable values longer than this (in characters) on both
    /// sides are compared with the diff engine instead of by equality.
    pub large_value_threshold: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions {
            large_value_threshold: DEFAULT_LARGE_VALUE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    ValueDiffers {
        field: String,
        a: String,
        b: String,
    },
    LargeValueDiffers {
        field: String,
        diff: RenderedDiff,
    },
    VariableUnmatched {
        name: String,
        present_in: Side,
    },
    ArtifactUnmatched {
        label: String,
        present_in: Side,
    },
    ScriptDiffers {
        label: String,
        kind: ScriptKind,
        diff: RenderedDiff,
    },
    ScriptMissing {
        label: String,
        kind: ScriptKind,
        missing_in: Side,
    },
    /// Neither project has the script. Reported, but not a difference.
    BothEmpty {
        label: String,
        kind: ScriptKind,
    },
    FetchFailed {
        label: String,
        kind: ScriptKind,
        side: Side,
        error: String,
    },
}

impl Finding {
    /// Whether this finding means the projects are out of sync.
    pub fn is_difference(&self) -> bool {
        !matches!(self, Finding::BothEmpty { .. })
    }

    /// The rendered diff behind this finding, if it has one.
    pub fn diff(&self) -> Option<&RenderedDiff> {
        match self {
            Finding::LargeValueDiffers { diff, .. } | Finding::ScriptDiffers { diff, .. } => {
                Some(diff)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::ValueDiffers { field, a, b } => {
                write!(f, "{field} differs: A={a:?} B={b:?}")
            }
            Finding::LargeValueDiffers { field, .. } => write!(f, "{field} differs (see diff)"),
            Finding::VariableUnmatched { name, present_in } => write!(
                f,
                "**WARNING** environment variable {name} exists in {present_in} but not {}",
                present_in.other()
            ),
            Finding::ArtifactUnmatched { label, present_in } => write!(
                f,
                "**NO MATCH** {label} exists in {present_in} but not {} (check that names match between the projects)",
                present_in.other()
            ),
            Finding::ScriptDiffers { label, kind, .. } => write!(f, "{label} ({kind}) differs"),
            Finding::ScriptMissing {
                label,
                kind,
                missing_in,
            } => write!(
                f,
                "{label} ({kind}) is empty in {missing_in} but not {}",
                missing_in.other()
            ),
            Finding::BothEmpty { label, kind } => {
                write!(f, "{label} ({kind}) is empty in both projects")
            }
            Finding::FetchFailed {
                label,
                kind,
                side,
                error,
            } => write!(f, "{label} ({kind}) could not be loaded from {side}: {error}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectComparison {
    pub settings: Vec<Finding>,
    pub functions: Vec<Finding>,
    pub actions: Vec<Finding>,
}

impl ProjectComparison {
    pub fn has_differences(&self) -> bool {
        self.settings
            .iter()
            .chain(&self.functions)
            .chain(&self.actions)
            .any(Finding::is_difference)
    }
}

pub struct ProjectComparator<'a> {
    store: &'a dyn RemoteStore,
    engine: &'a DiffEngine,
    options: CompareOptions,
}

impl<'a> ProjectComparator<'a> {
    pub fn new(store: &'a dyn RemoteStore, engine: &'a DiffEngine, options: CompareOptions) -> Self {
        ProjectComparator {
            store,
            engine,
            options,
        }
    }

    /// Compare settings, functions and actions of project `a` against `b`.
    ///
    /// Failing to load a project's settings or artifact lists is fatal. A
    /// script that cannot be fetched is reported as a finding and the
    /// comparison continues.
    pub fn compare(&self, a: &str, b: &str) -> Result<ProjectComparison, CompareError> {
        let settings = self.compare_settings(a, b)?;
        info!("Settings compared: {} findings", settings.len());
        let functions = self.compare_functions(a, b)?;
        info!("Functions compared: {} findings", functions.len());
        let actions = self.compare_actions(a, b)?;
        info!("Actions compared: {} findings", actions.len());

        Ok(ProjectComparison {
            settings,
            functions,
            actions,
        })
    }

    pub fn compare_settings(&self, a: &str, b: &str) -> Result<Vec<Finding>, CompareError> {
        let load = |project: &str| {
            self.store
                .project_settings(project)
                .map_err(|source| CompareError::Settings {
                    project: project.to_string(),
                    source,
                })
        };
        let settings_a = load(a)?;
        let settings_b = load(b)?;

        let mut findings = Vec::new();
        for (field, value_a, value_b) in [
            ("Name (En)", &settings_a.name.en, &settings_b.name.en),
            ("Name (Ja)", &settings_a.name.ja, &settings_b.name.ja),
            ("Display ID", &settings_a.display_id, &settings_b.display_id),
        ] {
            if value_a != value_b {
                findings.push(Finding::ValueDiffers {
                    field: field.to_string(),
                    a: value_a.clone(),
                    b: value_b.clone(),
                });
            }
        }

        let vars_a = index_by(&settings_a.script_vars, |v| v.name.as_str());
        let vars_b = index_by(&settings_b.script_vars, |v| v.name.as_str());

        for var in &settings_a.script_vars {
            match vars_b.get(var.name.as_str()) {
                Some(other) => findings.extend(self.compare_var(var, other)),
                None => findings.push(Finding::VariableUnmatched {
                    name: var.name.clone(),
                    present_in: Side::A,
                }),
            }
        }
        for var in &settings_b.script_vars {
            if !vars_a.contains_key(var.name.as_str()) {
                findings.push(Finding::VariableUnmatched {
                    name: var.name.clone(),
                    present_in: Side::B,
                });
            }
        }

        Ok(findings)
    }

    fn compare_var(&self, a: &ScriptVar, b: &ScriptVar) -> Option<Finding> {
        let field = format!("{} (Env)", a.name);
        let threshold = self.options.large_value_threshold;
        let large = a.value.chars().count() > threshold && b.value.chars().count() > threshold;

        if large {
            self.engine
                .compute(&a.value, &b.value)
                .map(|diff| Finding::LargeValueDiffers { field, diff })
        } else if a.value != b.value {
            Some(Finding::ValueDiffers {
                field,
                a: a.value.clone(),
                b: b.value.clone(),
            })
        } else {
            None
        }
    }

    pub fn compare_functions(&self, a: &str, b: &str) -> Result<Vec<Finding>, CompareError> {
        let list = |project: &str| {
            self.store
                .list_functions(project)
                .map_err(|source| CompareError::Functions {
                    project: project.to_string(),
                    source,
                })
        };
        let functions_a = list(a)?;
        let functions_b = list(b)?;

        Ok(self.compare_artifacts(
            &functions_a,
            &functions_b,
            |f| f.display_id.clone(),
            |f| format!("function {}", f.display_id),
        ))
    }

    pub fn compare_actions(&self, a: &str, b: &str) -> Result<Vec<Finding>, CompareError> {
        let list = |project: &str| {
            self.store
                .list_actions(project)
                .map_err(|source| CompareError::Actions {
                    project: project.to_string(),
                    source,
                })
        };
        let actions_a = list(a)?;
        let actions_b = list(b)?;

        // Same display ID in a different datastore is a different action.
        Ok(self.compare_artifacts(
            &actions_a,
            &actions_b,
            |action| (action.display_id.clone(), action.container.clone()),
            |action| format!("action {} [{}]", action.display_id, action.container),
        ))
    }

    fn compare_artifacts<K: Eq + Hash>(
        &self,
        side_a: &[Artifact],
        side_b: &[Artifact],
        key: impl Fn(&Artifact) -> K,
        label: impl Fn(&Artifact) -> String,
    ) -> Vec<Finding> {
        let index_a = index_by(side_a, &key);
        let index_b = index_by(side_b, &key);

        let mut findings = Vec::new();
        for artifact in side_a {
            match index_b.get(&key(artifact)) {
                Some(other) => {
                    let label = label(artifact);
                    for &kind in artifact.script_kinds() {
                        findings.extend(self.compare_script(&label, artifact, other, kind));
                    }
                }
                None => findings.push(Finding::ArtifactUnmatched {
                    label: label(artifact),
                    present_in: Side::A,
                }),
            }
        }
        for artifact in side_b {
            if !index_a.contains_key(&key(artifact)) {
                findings.push(Finding::ArtifactUnmatched {
                    label: label(artifact),
                    present_in: Side::B,
                });
            }
        }
        findings
    }

    fn compare_script(
        &self,
        label: &str,
        a: &Artifact,
        b: &Artifact,
        kind: ScriptKind,
    ) -> Option<Finding> {
        let fetch = |artifact: &Artifact, side: Side| {
            self.store.fetch_script(artifact, kind).map_err(|e| {
                warn!("Failed to load {label} ({kind}) from {side}: {e}");
                Finding::FetchFailed {
                    label: label.to_string(),
                    kind,
                    side,
                    error: e.to_string(),
                }
            })
        };
        let script_a = match fetch(a, Side::A) {
            Ok(script) => script,
            Err(finding) => return Some(finding),
        };
        let script_b = match fetch(b, Side::B) {
            Ok(script) => script,
            Err(finding) => return Some(finding),
        };

        let label = label.to_string();
        match (script_a, script_b) {
            (None, None) => Some(Finding::BothEmpty { label, kind }),
            (Some(_), None) => Some(Finding::ScriptMissing {
                label,
                kind,
                missing_in: Side::B,
            }),
            (None, Some(_)) => Some(Finding::ScriptMissing {
                label,
                kind,
                missing_in: Side::A,
            }),
            (Some(script_a), Some(script_b)) => self
                .engine
                .compute(&script_a, &script_b)
                .map(|diff| Finding::ScriptDiffers { label, kind, diff }),
        }
    }
}

/// Index items by key. When keys repeat, the first item wins.
fn index_by<'t, T, K: Eq + Hash>(items: &'t [T], key: impl Fn(&'t T) -> K) -> HashMap<K, &'t T> {
    let mut index = HashMap::with_capacity(items.len());
    for item in items {
        index.entry(key(item)).or_insert(item);
    }
    index
}
