//! HTTP client for the wizard endpoints.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::model::CourseSnapshot;
use crate::payloads::{
    CreatedId, GapPayload, ObjectiveCreate, ObjectivePatch, SubTaskCreate, SubTaskPatch,
    TriageItemCreate, TriageItemPatch,
};

/// HTTP method for a fire-and-forget write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethod {
    Patch,
    Delete,
}

impl WriteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMethod::Patch => "PATCH",
            WriteMethod::Delete => "DELETE",
        }
    }
}

/// A single autosave write, self-contained: ids, path, and body.
///
/// Creates are not represented here because their responses matter (the
/// server-issued id feeds reconciliation); everything that can be sent
/// blind goes through this type, including the teardown beacon path.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Gap {
        course_id: String,
        payload: GapPayload,
    },
    TriageItem {
        course_id: String,
        item_id: String,
        patch: TriageItemPatch,
    },
    TriageItemDelete {
        course_id: String,
        item_id: String,
    },
    SubTask {
        course_id: String,
        task_id: String,
        sub_task_id: String,
        patch: SubTaskPatch,
    },
    SubTaskDelete {
        course_id: String,
        task_id: String,
        sub_task_id: String,
    },
    Objective {
        course_id: String,
        objective_id: String,
        patch: ObjectivePatch,
    },
    ObjectiveDelete {
        course_id: String,
        objective_id: String,
    },
}

impl WriteOp {
    /// Request path relative to the API root.
    pub fn path(&self) -> String {
        match self {
            WriteOp::Gap { course_id, .. } => format!("/api/courses/{}/gap", course_id),
            WriteOp::TriageItem {
                course_id, item_id, ..
            }
            | WriteOp::TriageItemDelete { course_id, item_id } => {
                format!("/api/courses/{}/triage-items/{}", course_id, item_id)
            }
            WriteOp::SubTask {
                course_id,
                task_id,
                sub_task_id,
                ..
            }
            | WriteOp::SubTaskDelete {
                course_id,
                task_id,
                sub_task_id,
            } => format!(
                "/api/courses/{}/triage-items/{}/sub-tasks/{}",
                course_id, task_id, sub_task_id
            ),
            WriteOp::Objective {
                course_id,
                objective_id,
                ..
            }
            | WriteOp::ObjectiveDelete {
                course_id,
                objective_id,
            } => format!("/api/courses/{}/objectives/{}", course_id, objective_id),
        }
    }

    pub fn method(&self) -> WriteMethod {
        match self {
            WriteOp::TriageItemDelete { .. }
            | WriteOp::SubTaskDelete { .. }
            | WriteOp::ObjectiveDelete { .. } => WriteMethod::Delete,
            _ => WriteMethod::Patch,
        }
    }

    /// JSON body, if this write carries one.
    pub fn body(&self) -> Result<Option<serde_json::Value>, ApiError> {
        let body = match self {
            WriteOp::Gap { payload, .. } => Some(serde_json::to_value(payload)?),
            WriteOp::TriageItem { patch, .. } => Some(serde_json::to_value(patch)?),
            WriteOp::SubTask { patch, .. } => Some(serde_json::to_value(patch)?),
            WriteOp::Objective { patch, .. } => Some(serde_json::to_value(patch)?),
            WriteOp::TriageItemDelete { .. }
            | WriteOp::SubTaskDelete { .. }
            | WriteOp::ObjectiveDelete { .. } => None,
        };
        Ok(body)
    }

    /// Short label for log lines.
    pub fn describe(&self) -> String {
        match self {
            WriteOp::Gap { .. } => "gap update".to_string(),
            WriteOp::TriageItem { item_id, .. } => format!("triage item {}", item_id),
            WriteOp::TriageItemDelete { item_id, .. } => format!("triage item {} delete", item_id),
            WriteOp::SubTask { sub_task_id, .. } => format!("sub-task {}", sub_task_id),
            WriteOp::SubTaskDelete { sub_task_id, .. } => {
                format!("sub-task {} delete", sub_task_id)
            }
            WriteOp::Objective { objective_id, .. } => format!("objective {}", objective_id),
            WriteOp::ObjectiveDelete { objective_id, .. } => {
                format!("objective {} delete", objective_id)
            }
        }
    }
}

/// Client for the course-wizard REST API.
#[derive(Debug, Clone)]
pub struct CourseApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl CourseApiClient {
    /// Build a client against `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(path, "GET");
        let response = self.http.get(self.url(path)).send().await?;
        let response = self.check(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn post_created<B: Serialize>(&self, path: &str, body: &B) -> Result<String, ApiError> {
        debug!(path, "POST");
        let response = self.http.post(self.url(path)).json(body).send().await?;
        let response = self.check(response).await?;
        let created: CreatedId = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        if created.id.is_empty() {
            return Err(ApiError::InvalidResponse("create returned empty id".into()));
        }
        Ok(created.id)
    }

    /// Fetch the whole wizard document for a course.
    pub async fn fetch_snapshot(&self, course_id: &str) -> Result<CourseSnapshot, ApiError> {
        self.get_json(&format!("/api/courses/{}/wizard", course_id))
            .await
    }

    pub async fn create_triage_item(
        &self,
        course_id: &str,
        body: &TriageItemCreate,
    ) -> Result<String, ApiError> {
        self.post_created(&format!("/api/courses/{}/triage-items", course_id), body)
            .await
    }

    pub async fn create_sub_task(
        &self,
        course_id: &str,
        task_id: &str,
        body: &SubTaskCreate,
    ) -> Result<String, ApiError> {
        self.post_created(
            &format!(
                "/api/courses/{}/triage-items/{}/sub-tasks",
                course_id, task_id
            ),
            body,
        )
        .await
    }

    pub async fn create_objective(
        &self,
        course_id: &str,
        body: &ObjectiveCreate,
    ) -> Result<String, ApiError> {
        self.post_created(&format!("/api/courses/{}/objectives", course_id), body)
            .await
    }

    /// Send a patch or delete. The response body is discarded; only the
    /// status matters.
    pub async fn execute(&self, op: &WriteOp) -> Result<(), ApiError> {
        let path = op.path();
        debug!(method = op.method().as_str(), path, "write");
        let request = match op.method() {
            WriteMethod::Patch => self.http.patch(self.url(&path)),
            WriteMethod::Delete => self.http.delete(self.url(&path)),
        };
        let request = match op.body()? {
            Some(body) => request.json(&body),
            None => request,
        };
        let response = request.send().await?;
        self.check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub_task_op() -> WriteOp {
        WriteOp::SubTask {
            course_id: "c1".into(),
            task_id: "t1".into(),
            sub_task_id: "s1".into(),
            patch: SubTaskPatch::text("Read the chart"),
        }
    }

    #[test]
    fn test_write_op_paths() {
        assert_eq!(
            WriteOp::Gap {
                course_id: "c1".into(),
                payload: GapPayload {
                    gap_knowledge: true,
                    gap_skill: false
                }
            }
            .path(),
            "/api/courses/c1/gap"
        );
        assert_eq!(
            sub_task_op().path(),
            "/api/courses/c1/triage-items/t1/sub-tasks/s1"
        );
        assert_eq!(
            WriteOp::ObjectiveDelete {
                course_id: "c1".into(),
                objective_id: "o1".into()
            }
            .path(),
            "/api/courses/c1/objectives/o1"
        );
    }

    #[test]
    fn test_write_op_methods_and_bodies() {
        let patch = sub_task_op();
        assert_eq!(patch.method(), WriteMethod::Patch);
        let body = patch.body().unwrap().unwrap();
        assert_eq!(body["text"], "Read the chart");

        let delete = WriteOp::SubTaskDelete {
            course_id: "c1".into(),
            task_id: "t1".into(),
            sub_task_id: "s1".into(),
        };
        assert_eq!(delete.method(), WriteMethod::Delete);
        assert!(delete.body().unwrap().is_none());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client =
            CourseApiClient::new("http://localhost:4000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:4000");
        assert_eq!(
            client.url("/api/courses/c1/wizard"),
            "http://localhost:4000/api/courses/c1/wizard"
        );
    }
}
