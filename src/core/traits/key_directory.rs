use crate::core::errors::Result;
use crate::core::models::filter::FilterSpec;
use crate::core::models::key_record::{
    CreateKeyParams, CreateKeyResponse, DeleteKeyResponse, KeyQuery, KeyRecord,
};

/// Port for the backend's key inventory.
///
/// Implementations live in `adapters::http`. The key list controller only
/// depends on this trait, which keeps it testable with an in-memory fake.
pub trait KeyDirectory {
    /// All keys visible to the current session.
    fn list(&self) -> Result<Vec<KeyRecord>>;

    /// Keys matching `spec`.
    fn filter(&self, spec: &FilterSpec) -> Result<Vec<KeyRecord>>;

    /// Full attributes of the single key matching `query`.
    /// Fails with `NotFound` when nothing matches.
    fn find(&self, query: &KeyQuery) -> Result<KeyRecord>;

    /// Generate a key. Malformed size/type combinations fail with `ValidationError`.
    fn create(&self, params: &CreateKeyParams) -> Result<CreateKeyResponse>;

    /// Delete the key(s) matching `query`.
    fn delete(&self, query: &KeyQuery) -> Result<DeleteKeyResponse>;
}
