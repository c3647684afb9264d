use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::HsmError;

/// PKCS#11 object class of a key as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyClass {
    SecretKey,
    PrivateKey,
    PublicKey,
}

impl KeyClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyClass::SecretKey => "SECRET_KEY",
            KeyClass::PrivateKey => "PRIVATE_KEY",
            KeyClass::PublicKey => "PUBLIC_KEY",
        }
    }
}

impl fmt::Display for KeyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyClass {
    type Err = HsmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SECRET_KEY" | "SECRET" => Ok(KeyClass::SecretKey),
            "PRIVATE_KEY" | "PRIVATE" => Ok(KeyClass::PrivateKey),
            "PUBLIC_KEY" | "PUBLIC" => Ok(KeyClass::PublicKey),
            _ => Err(HsmError::ValidationError {
                detail: format!(
                    "Unknown key class '{s}'. Expected SECRET_KEY, PRIVATE_KEY or PUBLIC_KEY"
                ),
            }),
        }
    }
}

/// Key algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    Aes,
    Rsa,
    Ec,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Aes => "AES",
            KeyType::Rsa => "RSA",
            KeyType::Ec => "EC",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = HsmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AES" => Ok(KeyType::Aes),
            "RSA" => Ok(KeyType::Rsa),
            "EC" => Ok(KeyType::Ec),
            _ => Err(HsmError::ValidationError {
                detail: format!("Unknown key type '{s}'. Expected AES, RSA or EC"),
            }),
        }
    }
}

/// Metadata of one HSM-managed key.
///
/// List responses only carry class, type, label and id; the attribute
/// flags are filled in by a detail lookup and default to `false` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    #[serde(default)]
    pub label: Option<String>,
    pub key_class: KeyClass,
    pub key_type: KeyType,
    #[serde(default)]
    pub key_id: Option<String>,
    #[serde(default)]
    pub token: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub extractable: bool,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub modifiable: bool,
    #[serde(default)]
    pub destroyable: bool,
}

impl KeyRecord {
    /// Selector identifying this key for detail lookups and deletes.
    pub fn query(&self) -> KeyQuery {
        KeyQuery {
            key_class: self.key_class,
            key_type: self.key_type,
            label: self.label.clone(),
            key_id: self.key_id.clone(),
        }
    }

    /// Attribute flags in display order.
    pub fn attributes(&self) -> [(&'static str, bool); 7] {
        [
            ("Token", self.token),
            ("Private", self.private),
            ("Sensitive", self.sensitive),
            ("Extractable", self.extractable),
            ("Local", self.local),
            ("Modifiable", self.modifiable),
            ("Destroyable", self.destroyable),
        ]
    }
}

impl fmt::Display for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} - {})",
            self.label.as_deref().unwrap_or("Unlabeled"),
            self.key_class,
            self.key_type
        )?;
        if let Some(id) = &self.key_id {
            write!(f, " ID: {id}")?;
        }
        Ok(())
    }
}

/// Lookup / delete selector: `{key_class, key_type, label, key_id?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyQuery {
    pub key_class: KeyClass,
    pub key_type: KeyType,
    pub label: Option<String>,
    pub key_id: Option<String>,
}

/// Parameters of a key generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateKeyParams {
    pub label: String,
    pub key_class: KeyClass,
    pub key_type: KeyType,
    /// Bytes for AES, bits for RSA. `None` is sent as `null` and left
    /// to the backend to accept or reject.
    pub key_size: Option<u32>,
    pub token: bool,
    pub private: bool,
    pub sensitive: bool,
    pub extractable: bool,
}

impl CreateKeyParams {
    /// A request with the backend's default attribute flags.
    pub fn new(label: impl Into<String>, key_class: KeyClass, key_type: KeyType) -> Self {
        Self {
            label: label.into(),
            key_class,
            key_type,
            key_size: None,
            token: true,
            private: true,
            sensitive: true,
            extractable: false,
        }
    }

    pub fn with_size(mut self, key_size: Option<u32>) -> Self {
        self.key_size = key_size;
        self
    }
}

/// `GET /keys` and `POST /keys` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyListResponse {
    pub keys: Vec<KeyRecord>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateKeyResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteKeyResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub deleted_count: usize,
}
