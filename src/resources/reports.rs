use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    check, mutation_message, optional_query, require, unwrap_envelope, Envelope, FieldErrors, Page,
    ResourceError,
};
use crate::client::{ApiClient, RequestOptions};
use crate::models::{Pagination, RequestResult};

/// A student's observation tied to a container and one of its readings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub id: String,
    pub student_id: String,
    pub container_id: String,
    pub sensor_data_id: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub modified_at: String,
    pub created_by: Option<String>,
    pub modified_by: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportForm {
    pub student_id: String,
    pub container_id: String,
    pub sensor_data_id: String,
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_data_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReportsListResponse {
    pub reports: Vec<Report>,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilters {
    pub page: Page,
    pub student_id: Option<String>,
    pub container_id: Option<String>,
}

const STUDENT_REQUIRED: &str = "Student is required";
const CONTAINER_REQUIRED: &str = "Container is required";
const SENSOR_DATA_REQUIRED: &str = "Sensor data is required";

impl ReportForm {
    pub fn validate(&self) -> Result<(), ResourceError> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "student_id", &self.student_id, STUDENT_REQUIRED);
        require(&mut errors, "container_id", &self.container_id, CONTAINER_REQUIRED);
        require(&mut errors, "sensor_data_id", &self.sensor_data_id, SENSOR_DATA_REQUIRED);
        check(errors)
    }
}

impl ReportUpdate {
    pub fn validate(&self) -> Result<(), ResourceError> {
        let mut errors = FieldErrors::new();
        let fields = [
            ("student_id", &self.student_id, STUDENT_REQUIRED),
            ("container_id", &self.container_id, CONTAINER_REQUIRED),
            ("sensor_data_id", &self.sensor_data_id, SENSOR_DATA_REQUIRED),
        ];
        for (field, value, problem) in fields {
            if let Some(value) = value {
                require(&mut errors, field, value, problem);
            }
        }
        check(errors)
    }
}

/// `/reports` endpoints.
#[derive(Clone)]
pub struct ReportsApi {
    client: ApiClient,
}

impl ReportsApi {
    pub fn new(client: ApiClient) -> Self {
        ReportsApi { client }
    }

    pub async fn list(&self, filters: &ReportFilters) -> Result<ReportsListResponse, ResourceError> {
        let options = filters.page.apply(RequestOptions::new());
        let options = optional_query(options, "student_id", filters.student_id.as_deref());
        let options = optional_query(options, "container_id", filters.container_id.as_deref());
        let result: RequestResult<Envelope<ReportsListResponse>> =
            self.client.get("/reports", options).await;
        unwrap_envelope(result, "Failed to fetch reports")
    }

    pub async fn get(&self, id: &str) -> Result<Report, ResourceError> {
        let result: RequestResult<Envelope<Report>> = self
            .client
            .get(&format!("/reports/{}", id), RequestOptions::new())
            .await;
        unwrap_envelope(result, "Report not found")
    }

    pub async fn create(&self, form: &ReportForm) -> Result<String, ResourceError> {
        form.validate()?;
        let result: RequestResult<Value> = self
            .client
            .post("/reports", Some(form), RequestOptions::new())
            .await;
        mutation_message(result, "Report created successfully", "Failed to create report")
    }

    pub async fn update(&self, id: &str, update: &ReportUpdate) -> Result<String, ResourceError> {
        update.validate()?;
        let result: RequestResult<Value> = self
            .client
            .put(&format!("/reports/{}", id), Some(update), RequestOptions::new())
            .await;
        mutation_message(result, "Report updated successfully", "Failed to update report")
    }

    pub async fn delete(&self, id: &str) -> Result<String, ResourceError> {
        let result: RequestResult<Value> = self
            .client
            .delete(&format!("/reports/{}", id), RequestOptions::new())
            .await;
        mutation_message(result, "Report deleted successfully", "Failed to delete report")
    }
}
