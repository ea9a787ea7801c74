//! In-memory [`RemoteStore`] for unit tests.

use super::{RemoteError, RemoteStore};
use crate::artifact::{Artifact, ArtifactType, ProjectSettings, ScriptKind, ScriptVar};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum FakeScript {
    Content(String),
    Unexpected,
}

#[derive(Debug, Default)]
pub struct FakeRemote {
    actions: HashMap<String, Vec<Artifact>>,
    functions: HashMap<String, Vec<Artifact>>,
    scripts: HashMap<(String, ScriptKind), FakeScript>,
    settings: HashMap<String, ProjectSettings>,
    /// Every (artifact id, kind) passed to `fetch_script`, in call order.
    pub fetches: RefCell<Vec<(String, ScriptKind)>>,
}

fn artifact(project: &str, container: &str, display_id: &str, artifact_type: ArtifactType) -> Artifact {
    Artifact {
        id: format!("{project}/{container}/{display_id}"),
        display_id: display_id.to_string(),
        name: format!("{display_id} name"),
        container: container.to_string(),
        project_id: project.to_string(),
        artifact_type,
    }
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action; `None` scripts are absent remotely.
    pub fn add_action(
        &mut self,
        project: &str,
        datastore: &str,
        display_id: &str,
        pre: Option<&str>,
        post: Option<&str>,
    ) -> Artifact {
        let action = artifact(project, datastore, display_id, ArtifactType::Action);
        for (kind, script) in [(ScriptKind::Pre, pre), (ScriptKind::Post, post)] {
            if let Some(script) = script {
                self.scripts.insert(
                    (action.id.clone(), kind),
                    FakeScript::Content(script.to_string()),
                );
            }
        }
        self.actions
            .entry(project.to_string())
            .or_default()
            .push(action.clone());
        action
    }

    pub fn add_function(&mut self, project: &str, display_id: &str, script: Option<&str>) -> Artifact {
        let function = artifact(project, project, display_id, ArtifactType::Function);
        if let Some(script) = script {
            self.scripts.insert(
                (function.id.clone(), ScriptKind::Function),
                FakeScript::Content(script.to_string()),
            );
        }
        self.functions
            .entry(project.to_string())
            .or_default()
            .push(function.clone());
        function
    }

    /// Make fetching this script fail with an unexpected response.
    pub fn break_script(&mut self, artifact: &Artifact, kind: ScriptKind) {
        self.scripts
            .insert((artifact.id.clone(), kind), FakeScript::Unexpected);
    }

    pub fn set_settings(&mut self, project: &str, display_id: &str, vars: &[(&str, &str)]) {
        let settings = ProjectSettings {
            display_id: display_id.to_string(),
            script_vars: vars
                .iter()
                .map(|(name, value)| ScriptVar {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
            ..ProjectSettings::default()
        };
        self.settings.insert(project.to_string(), settings);
    }

    pub fn settings_mut(&mut self, project: &str) -> &mut ProjectSettings {
        self.settings.entry(project.to_string()).or_default()
    }
}

impl RemoteStore for FakeRemote {
    fn list_actions(&self, project_id: &str) -> Result<Vec<Artifact>, RemoteError> {
        Ok(self.actions.get(project_id).cloned().unwrap_or_default())
    }

    fn list_functions(&self, project_id: &str) -> Result<Vec<Artifact>, RemoteError> {
        Ok(self.functions.get(project_id).cloned().unwrap_or_default())
    }

    fn fetch_script(
        &self,
        artifact: &Artifact,
        kind: ScriptKind,
    ) -> Result<Option<String>, RemoteError> {
        self.fetches.borrow_mut().push((artifact.id.clone(), kind));
        match self.scripts.get(&(artifact.id.clone(), kind)) {
            None => Ok(None),
            Some(FakeScript::Content(s)) if s.trim().is_empty() => Ok(None),
            Some(FakeScript::Content(s)) => Ok(Some(s.clone())),
            Some(FakeScript::Unexpected) => Err(RemoteError::unexpected(
                format!("fake://{}/{kind}", artifact.id),
                "garbled",
            )),
        }
    }

    fn project_settings(&self, project_id: &str) -> Result<ProjectSettings, RemoteError> {
        self.settings
            .get(project_id)
            .cloned()
            .ok_or_else(|| RemoteError::unexpected(format!("fake://{project_id}/settings"), "unknown project"))
    }
}
