use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check, mutation_message, require, unwrap_envelope, Envelope, FieldErrors, Page, ResourceError};
use crate::client::{ApiClient, RequestOptions};
use crate::models::{Pagination, RequestResult};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    pub full_name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StudentForm {
    pub full_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StudentsListResponse {
    pub students: Vec<Student>,
    pub pagination: Option<Pagination>,
}

impl StudentForm {
    pub fn validate(&self) -> Result<(), ResourceError> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "full_name", &self.full_name, "Full name is required");
        check(errors)
    }
}

/// `/students` endpoints.
#[derive(Clone)]
pub struct StudentsApi {
    client: ApiClient,
}

impl StudentsApi {
    pub fn new(client: ApiClient) -> Self {
        StudentsApi { client }
    }

    pub async fn list(&self, page: Page) -> Result<StudentsListResponse, ResourceError> {
        let options = page.apply(RequestOptions::new());
        let result: RequestResult<Envelope<StudentsListResponse>> =
            self.client.get("/students", options).await;
        unwrap_envelope(result, "Failed to fetch students")
    }

    pub async fn get(&self, id: &str) -> Result<Student, ResourceError> {
        let result: RequestResult<Envelope<Student>> = self
            .client
            .get(&format!("/students/{}", id), RequestOptions::new())
            .await;
        unwrap_envelope(result, "Failed to fetch student")
    }

    pub async fn create(&self, form: &StudentForm) -> Result<String, ResourceError> {
        form.validate()?;
        let result: RequestResult<Value> = self
            .client
            .post("/students", Some(form), RequestOptions::new())
            .await;
        mutation_message(result, "Student created successfully", "Failed to create student")
    }

    pub async fn update(&self, id: &str, form: &StudentForm) -> Result<String, ResourceError> {
        form.validate()?;
        let result: RequestResult<Value> = self
            .client
            .put(&format!("/students/{}", id), Some(form), RequestOptions::new())
            .await;
        mutation_message(result, "Student updated successfully", "Failed to update student")
    }

    pub async fn delete(&self, id: &str) -> Result<String, ResourceError> {
        let result: RequestResult<Value> = self
            .client
            .delete(&format!("/students/{}", id), RequestOptions::new())
            .await;
        mutation_message(result, "Student deleted successfully", "Failed to delete student")
    }
}
