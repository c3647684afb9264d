use reqwest::multipart::{Form, Part};

use crate::adapters::http::client::ApiClient;
use crate::core::errors::Result;
use crate::core::models::hsm::{HsmHealth, OperationStatus};
use crate::core::traits::hsm_provisioning::HsmProvisioning;

/// File name the backend expects for the uploaded customer CA.
const CERTIFICATE_FILE_NAME: &str = "customerCA.crt";

/// `HsmProvisioning` backed by the unauthenticated `/hsm` endpoints.
pub struct HttpHsmService<'a> {
    client: &'a ApiClient,
}

impl<'a> HttpHsmService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }
}

impl HsmProvisioning for HttpHsmService<'_> {
    fn health(&self) -> Result<HsmHealth> {
        self.client.get("/hsm/health", "Failed to check HSM health")
    }

    fn configure(&self, ip_address: &str, certificate: Vec<u8>) -> Result<OperationStatus> {
        let part = Part::bytes(certificate).file_name(CERTIFICATE_FILE_NAME);
        let form = Form::new()
            .text("ip_address", ip_address.to_string())
            .part("certificate", part);
        self.client
            .post_multipart("/hsm/configure", form, "Failed to configure HSM")
    }

    fn test_connection(&self) -> Result<OperationStatus> {
        self.client
            .post_empty("/hsm/test-connection", "Failed to test HSM connection")
    }
}
