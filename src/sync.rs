//! Fetching rubric lists from the backend and replacing them with an edited draft.
//!
//! A sync sends the whole list, never a diff: the backend replaces every row it holds for
//! the subject (and grading period, for daily work) with exactly the submitted rows, so a
//! row removed in the editor is deleted by leaving it out of the payload.

use crate::connection::{send_http_request, ApiSession, HttpMethod};
use crate::draft::RubricDraft;
use crate::error::{Result, RubricError};
use crate::rubric::{DailyWork, RubricItem, RubricVariant, Standard};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const RUBRIC_PATH: &str = "rubro";
pub const RUBRIC_SYNC_PATH: &str = "rubro/sync";
pub const DAILY_WORK_PATH: &str = "rubros/tc";
pub const DAILY_WORK_SYNC_PATH: &str = "rubros/tc/sync";

/// Identifies the daily-work rubric set of one subject, group, grading period and year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyWorkTarget {
    #[serde(rename = "materiaClave")]
    pub subject_key: String,
    #[serde(rename = "idGrupo")]
    pub group_id: String,
    #[serde(rename = "parcial")]
    pub partial: u8,
    #[serde(rename = "yearC")]
    pub year: i32,
}

impl DailyWorkTarget {
    pub fn new(subject_key: &str, group_id: &str, partial: u8, year: i32) -> Self {
        DailyWorkTarget {
            subject_key: subject_key.to_string(),
            group_id: group_id.to_string(),
            partial,
            year,
        }
    }

    fn check(&self) -> Result<()> {
        require(&self.subject_key, "subject")?;
        require(&self.group_id, "group")?;
        if self.partial == 0 {
            return Err(RubricError::MissingIdentifier("grading period"));
        }
        Ok(())
    }

    fn query(&self) -> Vec<(String, String)> {
        vec![
            ("idGrupo".to_string(), self.group_id.clone()),
            ("parcial".to_string(), self.partial.to_string()),
            ("yearC".to_string(), self.year.to_string()),
        ]
    }
}

#[derive(Deserialize)]
struct RubricListResponse<V> {
    #[serde(default = "Vec::new")]
    rubros: Vec<RubricItem<V>>,
}

#[derive(Serialize)]
struct StandardSyncPayload<'a> {
    #[serde(rename = "materiaClave")]
    subject_key: &'a str,
    rubros: Vec<RubricItem<Standard>>,
}

#[derive(Serialize)]
struct DailyWorkSyncPayload<'a> {
    #[serde(flatten)]
    target: &'a DailyWorkTarget,
    rubros: Vec<RubricItem<DailyWork>>,
}

fn require(value: &str, what: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        Err(RubricError::MissingIdentifier(what))
    } else {
        Ok(())
    }
}

const NOT_SAVED: &str = "The rubrics were not saved";

// `false`, `""` and `null` mean no error.
fn reports_error(err: &Value) -> bool {
    match err {
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.trim().is_empty(),
        Value::Object(_) => true,
        _ => false,
    }
}

/// Reads an error reported inside a successful response body.
///
/// The backend signals a refused sync with a set `"error"` (`true`, a non-empty string or
/// an object), `"success": false` or `"ok": false`; an empty body or any other JSON counts
/// as accepted.
fn check_sync_response(body: &str) -> Result<()> {
    if body.trim().is_empty() {
        return Ok(());
    }
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Ok(());
    };
    let message = value
        .get("message")
        .or_else(|| value.get("msg"))
        .and_then(Value::as_str)
        .map(String::from);

    if let Some(err) = value.get("error").filter(|err| reports_error(err)) {
        let text = match err {
            Value::String(text) => Some(text.clone()),
            Value::Object(detail) => detail
                .get("message")
                .and_then(Value::as_str)
                .map(String::from),
            _ => None,
        };
        return Err(RubricError::ServerRejected(
            text.or(message).unwrap_or_else(|| NOT_SAVED.to_string()),
        ));
    }
    let refused = ["success", "ok"]
        .iter()
        .any(|flag| value.get(*flag).and_then(Value::as_bool) == Some(false));
    if refused {
        return Err(RubricError::ServerRejected(
            message.unwrap_or_else(|| NOT_SAVED.to_string()),
        ));
    }
    Ok(())
}

/// Client for the rubric endpoints of the school-administration API.
///
/// Example:
/// ```no_run
/// use rubros_connector::{ApiCredentials, ApiSession, RubricClient, RubricEditor};
///
/// let session = ApiSession::new(ApiCredentials::credentials()?)?;
/// let client = RubricClient::new(session);
/// let rubros = client.fetch_rubrics("MAT-101")?;
///
/// let mut editor = RubricEditor::new("MAT-101");
/// editor.open(&rubros);
/// if editor.can_save() {
///     editor.save(&client)?;
/// }
/// # Ok::<(), rubros_connector::RubricError>(())
/// ```
#[derive(Clone, Debug)]
pub struct RubricClient {
    session: ApiSession,
}

impl RubricClient {
    pub fn new(session: ApiSession) -> Self {
        RubricClient { session }
    }

    pub fn session(&self) -> &ApiSession {
        &self.session
    }

    /// Fetches the standard rubric list of a subject (`GET /rubro/{subject}`).
    pub fn fetch_rubrics(&self, subject_key: &str) -> Result<Vec<RubricItem<Standard>>> {
        self.ensure_token()?;
        require(subject_key, "subject")?;
        let url = self.session.url_with_segment(RUBRIC_PATH, subject_key)?;
        self.fetch_list(&url, Vec::new())
            .map_err(|e| log_failure("fetch rubrics", subject_key, e))
    }

    /// Fetches the daily-work rubric list of a subject, group, grading period and year.
    pub fn fetch_daily_work(
        &self,
        target: &DailyWorkTarget,
    ) -> Result<Vec<RubricItem<DailyWork>>> {
        self.ensure_token()?;
        target.check()?;
        let url = self
            .session
            .url_with_segment(DAILY_WORK_PATH, &target.subject_key)?;
        self.fetch_list(&url, target.query())
            .map_err(|e| log_failure("fetch daily work", &target.subject_key, e))
    }

    /// Replaces the standard rubric list of a subject with the rows of `draft`
    /// (`PUT /rubro/sync`).
    ///
    /// The total is not re-checked here; gating on 100% is the editor's job.
    pub fn sync_rubrics(&self, subject_key: &str, draft: &RubricDraft<Standard>) -> Result<()> {
        self.ensure_token()?;
        require(subject_key, "subject")?;
        let payload = StandardSyncPayload {
            subject_key,
            rubros: draft.to_vec(),
        };
        self.put_list(RUBRIC_SYNC_PATH, &payload, draft.len())
            .map_err(|e| log_failure("sync rubrics", subject_key, e))
    }

    /// Replaces the daily-work rubric list of `target` with the rows of `draft`
    /// (`PUT /rubros/tc/sync`). Any total is accepted.
    pub fn sync_daily_work(
        &self,
        target: &DailyWorkTarget,
        draft: &RubricDraft<DailyWork>,
    ) -> Result<()> {
        self.ensure_token()?;
        target.check()?;
        let payload = DailyWorkSyncPayload {
            target,
            rubros: draft.to_vec(),
        };
        self.put_list(DAILY_WORK_SYNC_PATH, &payload, draft.len())
            .map_err(|e| log_failure("sync daily work", &target.subject_key, e))
    }

    fn ensure_token(&self) -> Result<()> {
        if self.session.credentials.has_token() {
            Ok(())
        } else {
            Err(RubricError::AuthorizationMissing)
        }
    }

    fn fetch_list<V: RubricVariant>(
        &self,
        url: &str,
        params: Vec<(String, String)>,
    ) -> Result<Vec<RubricItem<V>>> {
        let response = send_http_request(HttpMethod::Get, url, &self.session, params)?;
        let text = response
            .text()
            .map_err(|e| RubricError::Network(format!("Failed to read response text: {}", e)))?;
        let list: RubricListResponse<V> = serde_json::from_str(&text).map_err(|e| {
            RubricError::MalformedResponse(format!("Failed to parse rubrics JSON: {}", e))
        })?;
        Ok(list.rubros)
    }

    fn put_list<P: Serialize>(&self, path: &str, payload: &P, count: usize) -> Result<()> {
        let body = serde_json::to_value(payload)
            .map_err(|e| RubricError::MalformedResponse(format!("Failed to encode rubrics: {}", e)))?;
        let url = self.session.url(path);
        let response = send_http_request(HttpMethod::Put(body), &url, &self.session, Vec::new())?;
        let text = response
            .text()
            .map_err(|e| RubricError::Network(format!("Failed to read response text: {}", e)))?;
        check_sync_response(&text)?;
        info!("Synchronized {} rubric rows with {}", count, path);
        Ok(())
    }
}

fn log_failure(action: &str, subject_key: &str, err: RubricError) -> RubricError {
    error!("Failed to {} for {}: {}", action, subject_key, err);
    err
}
