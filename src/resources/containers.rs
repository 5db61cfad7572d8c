use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check, mutation_message, require, unwrap_envelope, Envelope, FieldErrors, Page, ResourceError};
use crate::client::{ApiClient, RequestOptions};
use crate::models::{Pagination, RequestResult};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    pub code: String,
    pub created_at: String,
    pub modified_at: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContainerForm {
    pub code: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContainersListResponse {
    pub containers: Vec<Container>,
    pub pagination: Option<Pagination>,
}

impl ContainerForm {
    pub fn validate(&self) -> Result<(), ResourceError> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "code", &self.code, "Container code is required");
        check(errors)
    }
}

/// `/containers` endpoints.
#[derive(Clone)]
pub struct ContainersApi {
    client: ApiClient,
}

impl ContainersApi {
    pub fn new(client: ApiClient) -> Self {
        ContainersApi { client }
    }

    pub async fn list(&self, page: Page) -> Result<ContainersListResponse, ResourceError> {
        let result: RequestResult<Envelope<ContainersListResponse>> = self
            .client
            .get("/containers", page.apply(RequestOptions::new()))
            .await;
        unwrap_envelope(result, "Failed to fetch containers")
    }

    pub async fn get(&self, id: &str) -> Result<Container, ResourceError> {
        let result: RequestResult<Envelope<Container>> = self
            .client
            .get(&format!("/containers/{}", id), RequestOptions::new())
            .await;
        unwrap_envelope(result, "Container not found")
    }

    pub async fn create(&self, form: &ContainerForm) -> Result<String, ResourceError> {
        form.validate()?;
        let result: RequestResult<Value> = self
            .client
            .post("/containers", Some(form), RequestOptions::new())
            .await;
        mutation_message(result, "Container created successfully", "Failed to create container")
    }

    pub async fn update(&self, id: &str, form: &ContainerForm) -> Result<String, ResourceError> {
        form.validate()?;
        let result: RequestResult<Value> = self
            .client
            .put(&format!("/containers/{}", id), Some(form), RequestOptions::new())
            .await;
        mutation_message(result, "Container updated successfully", "Failed to update container")
    }

    pub async fn delete(&self, id: &str) -> Result<String, ResourceError> {
        let result: RequestResult<Value> = self
            .client
            .delete(&format!("/containers/{}", id), RequestOptions::new())
            .await;
        mutation_message(result, "Container deleted successfully", "Failed to delete container")
    }
}
