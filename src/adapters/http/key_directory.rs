use crate::adapters::http::client::ApiClient;
use crate::core::errors::{HsmError, Result};
use crate::core::models::filter::FilterSpec;
use crate::core::models::key_record::{
    CreateKeyParams, CreateKeyResponse, DeleteKeyResponse, KeyListResponse, KeyQuery, KeyRecord,
};
use crate::core::traits::key_directory::KeyDirectory;

/// `KeyDirectory` backed by the `/keys` endpoints.
pub struct HttpKeyDirectory<'a> {
    client: &'a ApiClient,
}

impl<'a> HttpKeyDirectory<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }
}

impl KeyDirectory for HttpKeyDirectory<'_> {
    fn list(&self) -> Result<Vec<KeyRecord>> {
        let resp: KeyListResponse = self.client.get("/keys", "Failed to list keys")?;
        tracing::debug!(count = resp.count, "keys listed");
        Ok(resp.keys)
    }

    fn filter(&self, spec: &FilterSpec) -> Result<Vec<KeyRecord>> {
        let resp: KeyListResponse = self.client.post("/keys", spec, "Failed to filter keys")?;
        tracing::debug!(count = resp.count, "keys filtered");
        Ok(resp.keys)
    }

    fn find(&self, query: &KeyQuery) -> Result<KeyRecord> {
        self.client
            .post("/keys/find", query, "Failed to load key details")
            .map_err(|e| match e {
                HsmError::NotFound { .. } => HsmError::NotFound { what: "Key".into() },
                other => other,
            })
    }

    fn create(&self, params: &CreateKeyParams) -> Result<CreateKeyResponse> {
        self.client.post("/keys/create", params, "Failed to create key")
    }

    fn delete(&self, query: &KeyQuery) -> Result<DeleteKeyResponse> {
        self.client.post("/keys/delete", query, "Failed to delete keys")
    }
}
