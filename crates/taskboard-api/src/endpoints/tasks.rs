// Task endpoints, scoped to a project: `/projects/{project}/tasks`.

use crate::client::{ApiClient, HttpMethod, RequestSpec};
use crate::error::Error;
use crate::models::{Page, Task, TaskInput, TaskQuery};
use crate::payload::Payload;

use super::{to_body, to_query};

impl ApiClient {
    /// `GET /projects/{project}/tasks` with paging, search, and filters.
    pub async fn list_tasks(&self, project_id: u64, query: &TaskQuery) -> Result<Page<Task>, Error> {
        let spec = RequestSpec::new(HttpMethod::Get, format!("projects/{project_id}/tasks"))
            .payload(Payload::Query(to_query(query)?));
        self.send_json(spec).await
    }

    /// `POST /projects/{project}/tasks`.
    pub async fn create_task(&self, project_id: u64, input: &TaskInput) -> Result<Task, Error> {
        let spec = RequestSpec::new(HttpMethod::Post, format!("projects/{project_id}/tasks"))
            .payload(Payload::Json(to_body(input)?));
        self.send_data(spec).await
    }

    /// `PUT /projects/{project}/tasks/{id}`.
    pub async fn update_task(
        &self,
        project_id: u64,
        id: u64,
        input: &TaskInput,
    ) -> Result<Task, Error> {
        let spec = RequestSpec::new(HttpMethod::Put, format!("projects/{project_id}/tasks/{id}"))
            .payload(Payload::Json(to_body(input)?));
        self.send_data(spec).await
    }

    /// `DELETE /projects/{project}/tasks/{id}`.
    pub async fn delete_task(&self, project_id: u64, id: u64) -> Result<(), Error> {
        let spec = RequestSpec::new(HttpMethod::Delete, format!("projects/{project_id}/tasks/{id}"));
        self.send(spec).await?;
        Ok(())
    }
}
