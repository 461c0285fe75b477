// User directory: `GET /users`.

use crate::client::{ApiClient, HttpMethod, RequestSpec};
use crate::error::Error;
use crate::models::{ListQuery, Page, User};
use crate::payload::Payload;

use super::to_query;

impl ApiClient {
    /// `GET /users`, used to populate assignee pickers.
    pub async fn list_users(&self, query: &ListQuery) -> Result<Page<User>, Error> {
        let spec = RequestSpec::new(HttpMethod::Get, "users")
            .payload(Payload::Query(to_query(query)?));
        self.send_json(spec).await
    }
}
