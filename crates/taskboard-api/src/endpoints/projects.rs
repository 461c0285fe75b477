// Project endpoints: `/projects` and `/projects/{id}`.

use crate::client::{ApiClient, HttpMethod, RequestSpec};
use crate::error::Error;
use crate::models::{ListQuery, Page, Project, ProjectInput};
use crate::payload::Payload;

use super::{to_body, to_query};

impl ApiClient {
    /// `GET /projects` with paging and search.
    pub async fn list_projects(&self, query: &ListQuery) -> Result<Page<Project>, Error> {
        let spec = RequestSpec::new(HttpMethod::Get, "projects")
            .payload(Payload::Query(to_query(query)?));
        self.send_json(spec).await
    }

    /// `GET /projects/{id}`.
    pub async fn get_project(&self, id: u64) -> Result<Project, Error> {
        self.send_data(RequestSpec::new(HttpMethod::Get, format!("projects/{id}")))
            .await
    }

    /// `POST /projects`.
    pub async fn create_project(&self, input: &ProjectInput) -> Result<Project, Error> {
        let spec = RequestSpec::new(HttpMethod::Post, "projects")
            .payload(Payload::Json(to_body(input)?));
        self.send_data(spec).await
    }

    /// `PUT /projects/{id}`.
    pub async fn update_project(&self, id: u64, input: &ProjectInput) -> Result<Project, Error> {
        let spec = RequestSpec::new(HttpMethod::Put, format!("projects/{id}"))
            .payload(Payload::Json(to_body(input)?));
        self.send_data(spec).await
    }

    /// `DELETE /projects/{id}`.
    pub async fn delete_project(&self, id: u64) -> Result<(), Error> {
        self.send(RequestSpec::new(HttpMethod::Delete, format!("projects/{id}")))
            .await?;
        Ok(())
    }
}
