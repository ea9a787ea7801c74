use super::{RemoteError, RemoteStore, classify_script_response, snippet};
use crate::artifact::{
    Artifact, ArtifactType, Datastore, LocalizedName, ProjectSettings, ScriptKind, ScriptVar,
};
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.hexabase.com";

const LOGIN_URI: &str = "/api/v0/login";
const PROJECT_FUNCTIONS_URI: &str = "/api/v0/project/functions";
const PROJECT_SETTINGS_URI: &str = "/api/v0/project/settings";

fn datastores_uri(project_id: &str) -> String {
    format!("/api/v0/applications/{project_id}/datastores")
}

fn actions_uri(datastore_id: &str) -> String {
    format!("/api/v0/datastores/{datastore_id}/actions")
}

fn download_script_uri(action_id: &str) -> String {
    format!("/api/v0/actions/{action_id}/actionscripts/download")
}

/// Bearer credential for one CLI invocation.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }
}

#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Classify a script download, taking the HTTP status into account.
///
/// The `NOT_FOUND` and "empty script" JSON bodies mean absent whatever the
/// status. Any other body on a non-success status is unexpected.
fn classify_download(uri: &str, response: &ApiResponse) -> Result<Option<String>, RemoteError> {
    let classified = classify_script_response(uri, &response.body);
    if response.is_success() {
        return classified;
    }
    match classified {
        Ok(None) if response.body.trim_start().starts_with('{') => Ok(None),
        _ => Err(RemoteError::unexpected(
            uri,
            format!("HTTP {}: {}", response.status, snippet(&response.body)),
        )),
    }
}

/// Thin blocking HTTP client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, uri: &str, query: &[(&str, &str)]) -> Result<Url, RemoteError> {
        let raw = format!("{}{}", self.base_url, uri);
        let parsed = if query.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, query)
        };
        parsed.map_err(|e| RemoteError::unexpected(uri, format!("invalid URL {raw}: {e}")))
    }

    fn send(
        &self,
        builder: RequestBuilder,
        session: Option<&Session>,
    ) -> Result<ApiResponse, RemoteError> {
        let builder = match session {
            Some(session) => builder.bearer_auth(session.token()),
            None => builder,
        };
        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(ApiResponse { status, body })
    }

    pub fn get(
        &self,
        uri: &str,
        query: &[(&str, &str)],
        session: Option<&Session>,
    ) -> Result<ApiResponse, RemoteError> {
        let url = self.url(uri, query)?;
        debug!("GET {url}");
        self.send(self.http.get(url), session)
    }

    pub fn post(
        &self,
        uri: &str,
        body: String,
        session: Option<&Session>,
    ) -> Result<ApiResponse, RemoteError> {
        let url = self.url(uri, &[])?;
        debug!("POST {url}");
        let builder = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.send(builder, session)
    }

    /// Exchange credentials for a session token.
    pub fn login(&self, email: &str, password: &str) -> Result<Session, RemoteError> {
        let payload = serde_json::json!({ "email": email, "password": password });
        let response = self.post(LOGIN_URI, payload.to_string(), None)?;

        let json: serde_json::Value = serde_json::from_str(&response.body).map_err(|_| {
            RemoteError::Login(format!(
                "HTTP {}: {}",
                response.status,
                snippet(&response.body)
            ))
        })?;

        match json.get("token").and_then(|t| t.as_str()) {
            Some(token) if !token.is_empty() => Ok(Session {
                token: token.to_string(),
            }),
            _ => Err(RemoteError::Login(format!(
                "no token in response (HTTP {}): {}",
                response.status,
                snippet(&response.body)
            ))),
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        uri: &str,
        query: &[(&str, &str)],
        session: &Session,
    ) -> Result<T, RemoteError> {
        let response = self.get(uri, query, Some(session))?;
        if !response.is_success() {
            return Err(RemoteError::unexpected(
                uri,
                format!("HTTP {}: {}", response.status, snippet(&response.body)),
            ));
        }
        serde_json::from_str(&response.body)
            .map_err(|e| RemoteError::unexpected(uri, format!("{e}: {}", snippet(&response.body))))
    }
}

#[derive(Debug, Deserialize)]
struct DatastoreRecord {
    datastore_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    display_id: String,
}

#[derive(Debug, Deserialize)]
struct ActionRecord {
    action_id: String,
    display_id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ScriptRecord {
    #[serde(default)]
    script: String,
}

#[derive(Debug, Deserialize)]
struct FunctionRecord {
    #[serde(default, alias = "id")]
    function_id: String,
    display_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    pre: ScriptRecord,
}

impl FunctionRecord {
    fn key(&self) -> &str {
        if self.function_id.is_empty() {
            &self.display_id
        } else {
            &self.function_id
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct NameRecord {
    #[serde(default)]
    en: String,
    #[serde(default)]
    ja: String,
}

#[derive(Debug, Deserialize)]
struct ScriptVarRecord {
    var_name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct SettingsRecord {
    #[serde(default)]
    display_id: String,
    #[serde(default)]
    name: NameRecord,
    #[serde(default)]
    script_vars: Vec<ScriptVarRecord>,
}

/// Trimmed function scripts of one project listing, by function key.
type FunctionScripts = HashMap<String, String>;

/// [`RemoteStore`] backed by the REST API with an authenticated session.
///
/// Function scripts come inline with the function listing. They are kept per
/// project for the life of the remote, so each project is listed once.
pub struct HttpRemote {
    client: ApiClient,
    session: Session,
    function_scripts: RefCell<HashMap<String, FunctionScripts>>,
}

impl HttpRemote {
    pub fn new(client: ApiClient, session: Session) -> Self {
        HttpRemote {
            client,
            session,
            function_scripts: RefCell::new(HashMap::new()),
        }
    }

    pub fn list_datastores(&self, project_id: &str) -> Result<Vec<Datastore>, RemoteError> {
        let records: Vec<DatastoreRecord> =
            self.client
                .get_json(&datastores_uri(project_id), &[], &self.session)?;
        Ok(records
            .into_iter()
            .map(|r| Datastore {
                id: r.datastore_id,
                name: r.name,
                display_id: r.display_id,
            })
            .collect())
    }

    /// List the project's functions and remember their scripts.
    fn function_records(&self, project_id: &str) -> Result<Vec<FunctionRecord>, RemoteError> {
        let records: Vec<FunctionRecord> =
            self.client
                .get_json(PROJECT_FUNCTIONS_URI, &[("p_id", project_id)], &self.session)?;

        let mut scripts = FunctionScripts::new();
        for record in &records {
            // Duplicate keys keep their first occurrence.
            scripts
                .entry(record.key().to_string())
                .or_insert_with(|| record.pre.script.trim().to_string());
        }
        self.function_scripts
            .borrow_mut()
            .insert(project_id.to_string(), scripts);
        Ok(records)
    }

    fn function_script(&self, artifact: &Artifact) -> Result<Option<String>, RemoteError> {
        if !self
            .function_scripts
            .borrow()
            .contains_key(&artifact.project_id)
        {
            self.function_records(&artifact.project_id)?;
        }
        Ok(self
            .function_scripts
            .borrow()
            .get(&artifact.project_id)
            .and_then(|scripts| scripts.get(&artifact.id))
            .filter(|script| !script.is_empty())
            .cloned())
    }
}

impl RemoteStore for HttpRemote {
    fn list_actions(&self, project_id: &str) -> Result<Vec<Artifact>, RemoteError> {
        let datastores = self.list_datastores(project_id)?;

        let mut actions = Vec::new();
        for datastore in &datastores {
            debug!(
                "Listing actions of datastore {} ({})",
                datastore.name, datastore.display_id
            );
            let records: Vec<ActionRecord> =
                match self
                    .client
                    .get_json(&actions_uri(&datastore.id), &[], &self.session)
                {
                    Ok(records) => records,
                    Err(e) => {
                        warn!("Skipping datastore {}: {e}", datastore.name);
                        continue;
                    }
                };
            actions.extend(records.into_iter().map(|r| Artifact {
                id: r.action_id,
                display_id: r.display_id,
                name: r.name,
                container: datastore.name.clone(),
                project_id: project_id.to_string(),
                artifact_type: ArtifactType::Action,
            }));
        }
        Ok(actions)
    }

    fn list_functions(&self, project_id: &str) -> Result<Vec<Artifact>, RemoteError> {
        Ok(self
            .function_records(project_id)?
            .into_iter()
            .map(|r| Artifact {
                id: r.key().to_string(),
                display_id: r.display_id,
                name: r.name,
                container: project_id.to_string(),
                project_id: project_id.to_string(),
                artifact_type: ArtifactType::Function,
            })
            .collect())
    }

    fn fetch_script(
        &self,
        artifact: &Artifact,
        kind: ScriptKind,
    ) -> Result<Option<String>, RemoteError> {
        match kind {
            ScriptKind::Pre | ScriptKind::Post => {
                let uri = download_script_uri(&artifact.id);
                let response =
                    self.client
                        .get(&uri, &[("script_type", kind.as_str())], Some(&self.session))?;
                classify_download(&uri, &response)
            }
            ScriptKind::Function => self.function_script(artifact),
        }
    }

    fn project_settings(&self, project_id: &str) -> Result<ProjectSettings, RemoteError> {
        let record: SettingsRecord =
            self.client
                .get_json(PROJECT_SETTINGS_URI, &[("p_id", project_id)], &self.session)?;
        Ok(ProjectSettings {
            display_id: record.display_id,
            name: LocalizedName {
                en: record.name.en,
                ja: record.name.ja,
            },
            script_vars: record
                .script_vars
                .into_iter()
                .map(|v| ScriptVar {
                    name: v.var_name,
                    value: v.value,
                })
                .collect(),
        })
    }
}
