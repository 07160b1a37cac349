use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvlinkError {
    /// Custom key rejected by the format rules (length or charset).
    InvalidKeyFormat(String),
    /// Custom key collides with an operationally reserved word.
    ReservedKey(String),
    /// Key already belongs to a different target.
    KeyTaken(String),
    /// Bounded key generation ran out of retries.
    GenerationExhausted {
        min_length: usize,
        max_length: usize,
        attempts: usize,
    },
    /// Store rejected a write because of its unique key constraint.
    DuplicateKey(String),
    /// Transient store failure; never cached, propagated upward.
    StoreUnavailable(String),
    Configuration(String),
}

impl EvlinkError {
    pub fn code(&self) -> &'static str {
        match self {
            EvlinkError::InvalidKeyFormat(_) => "E001",
            EvlinkError::ReservedKey(_) => "E002",
            EvlinkError::KeyTaken(_) => "E003",
            EvlinkError::GenerationExhausted { .. } => "E004",
            EvlinkError::DuplicateKey(_) => "E005",
            EvlinkError::StoreUnavailable(_) => "E006",
            EvlinkError::Configuration(_) => "E007",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            EvlinkError::InvalidKeyFormat(_) => "Invalid Key Format",
            EvlinkError::ReservedKey(_) => "Reserved Key",
            EvlinkError::KeyTaken(_) => "Key Taken",
            EvlinkError::GenerationExhausted { .. } => "Key Generation Exhausted",
            EvlinkError::DuplicateKey(_) => "Duplicate Key",
            EvlinkError::StoreUnavailable(_) => "Store Unavailable",
            EvlinkError::Configuration(_) => "Configuration Error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            EvlinkError::InvalidKeyFormat(msg)
            | EvlinkError::ReservedKey(msg)
            | EvlinkError::KeyTaken(msg)
            | EvlinkError::DuplicateKey(msg)
            | EvlinkError::StoreUnavailable(msg)
            | EvlinkError::Configuration(msg) => msg.clone(),
            EvlinkError::GenerationExhausted {
                min_length,
                max_length,
                attempts,
            } => format!(
                "no free key found after {} attempts with lengths {}-{}",
                attempts, min_length, max_length
            ),
        }
    }

    /// Caller-fixable input errors, as opposed to capacity or infrastructure
    /// failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EvlinkError::InvalidKeyFormat(_)
                | EvlinkError::ReservedKey(_)
                | EvlinkError::KeyTaken(_)
        )
    }
}

impl fmt::Display for EvlinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for EvlinkError {}

impl EvlinkError {
    pub fn invalid_key_format<T: Into<String>>(msg: T) -> Self {
        EvlinkError::InvalidKeyFormat(msg.into())
    }

    pub fn reserved_key<T: Into<String>>(msg: T) -> Self {
        EvlinkError::ReservedKey(msg.into())
    }

    pub fn key_taken<T: Into<String>>(msg: T) -> Self {
        EvlinkError::KeyTaken(msg.into())
    }

    pub fn generation_exhausted(min_length: usize, max_length: usize, attempts: usize) -> Self {
        EvlinkError::GenerationExhausted {
            min_length,
            max_length,
            attempts,
        }
    }

    pub fn duplicate_key<T: Into<String>>(msg: T) -> Self {
        EvlinkError::DuplicateKey(msg.into())
    }

    pub fn store_unavailable<T: Into<String>>(msg: T) -> Self {
        EvlinkError::StoreUnavailable(msg.into())
    }

    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        EvlinkError::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EvlinkError>;
