use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    check, mutation_message, optional_query, require, unwrap_envelope, Envelope, FieldErrors, Page,
    ResourceError,
};
use crate::client::{ApiClient, RequestOptions};
use crate::models::{Pagination, RequestResult};

/// One reading taken inside a container.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SensorData {
    pub id: String,
    pub container_id: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub gas: Option<f64>,
    pub ph: Option<f64>,
    pub status: Option<String>,
    pub created_at: String,
    pub modified_at: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SensorDataForm {
    pub container_id: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub gas: Option<f64>,
    pub ph: Option<f64>,
    pub status: Option<String>,
}

/// Partial update; absent fields are left untouched on the server.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SensorDataUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SensorDataListResponse {
    pub sensor_data: Vec<SensorData>,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorDataFilters {
    pub page: Page,
    pub container_id: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl SensorDataFilters {
    fn apply(&self, options: RequestOptions) -> RequestOptions {
        let options = self.page.apply(options);
        let options = optional_query(options, "container_id", self.container_id.as_deref());
        let options = optional_query(options, "date_from", self.date_from.as_deref());
        optional_query(options, "date_to", self.date_to.as_deref())
    }
}

fn check_ranges(
    errors: &mut FieldErrors,
    temperature: Option<f64>,
    humidity: Option<f64>,
    gas: Option<f64>,
    ph: Option<f64>,
) {
    if temperature.is_some_and(|t| !(-50.0..=100.0).contains(&t)) {
        errors.insert(
            "temperature".into(),
            "Temperature must be between -50°C and 100°C".into(),
        );
    }
    if humidity.is_some_and(|h| !(0.0..=100.0).contains(&h)) {
        errors.insert(
            "humidity".into(),
            "Humidity must be between 0% and 100%".into(),
        );
    }
    if gas.is_some_and(|g| g < 0.0) {
        errors.insert("gas".into(), "Gas reading cannot be negative".into());
    }
    if ph.is_some_and(|p| !(0.0..=14.0).contains(&p)) {
        errors.insert("ph".into(), "pH must be between 0 and 14".into());
    }
}

impl SensorDataForm {
    pub fn validate(&self) -> Result<(), ResourceError> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "container_id", &self.container_id, "Container is required");
        check_ranges(&mut errors, self.temperature, self.humidity, self.gas, self.ph);
        check(errors)
    }
}

impl SensorDataUpdate {
    pub fn validate(&self) -> Result<(), ResourceError> {
        let mut errors = FieldErrors::new();
        if let Some(container_id) = &self.container_id {
            require(&mut errors, "container_id", container_id, "Container is required");
        }
        check_ranges(&mut errors, self.temperature, self.humidity, self.gas, self.ph);
        check(errors)
    }
}

/// `/sensor-data` endpoints.
#[derive(Clone)]
pub struct SensorDataApi {
    client: ApiClient,
}

impl SensorDataApi {
    pub fn new(client: ApiClient) -> Self {
        SensorDataApi { client }
    }

    pub async fn list(&self, filters: &SensorDataFilters) -> Result<SensorDataListResponse, ResourceError> {
        let result: RequestResult<Envelope<SensorDataListResponse>> = self
            .client
            .get("/sensor-data", filters.apply(RequestOptions::new()))
            .await;
        unwrap_envelope(result, "Failed to fetch sensor data")
    }

    pub async fn get(&self, id: &str) -> Result<SensorData, ResourceError> {
        let result: RequestResult<Envelope<SensorData>> = self
            .client
            .get(&format!("/sensor-data/{}", id), RequestOptions::new())
            .await;
        unwrap_envelope(result, "Sensor data not found")
    }

    /// Most recent reading of one container.
    pub async fn latest(&self, container_id: &str) -> Result<SensorData, ResourceError> {
        let result: RequestResult<Envelope<SensorData>> = self
            .client
            .get(
                &format!("/sensor-data/latest/{}", container_id),
                RequestOptions::new(),
            )
            .await;
        unwrap_envelope(result, "No sensor data found for this container")
    }

    pub async fn create(&self, form: &SensorDataForm) -> Result<String, ResourceError> {
        form.validate()?;
        let result: RequestResult<Value> = self
            .client
            .post("/sensor-data", Some(form), RequestOptions::new())
            .await;
        mutation_message(result, "Sensor data created successfully", "Failed to create sensor data")
    }

    pub async fn update(&self, id: &str, update: &SensorDataUpdate) -> Result<String, ResourceError> {
        update.validate()?;
        let result: RequestResult<Value> = self
            .client
            .put(&format!("/sensor-data/{}", id), Some(update), RequestOptions::new())
            .await;
        mutation_message(result, "Sensor data updated successfully", "Failed to update sensor data")
    }

    pub async fn delete(&self, id: &str) -> Result<String, ResourceError> {
        let result: RequestResult<Value> = self
            .client
            .delete(&format!("/sensor-data/{}", id), RequestOptions::new())
            .await;
        mutation_message(result, "Sensor data deleted successfully", "Failed to delete sensor data")
    }
}
