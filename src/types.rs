use std::fmt;

/// Bearer credential for the mail API. Obtained once per run and never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<{} chars>)", self.0.len())
    }
}

/// One message as delivered by the API, reduced to the fields the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// `@odata.type`, e.g. `#microsoft.graph.message`
    pub kind: String,
    pub id: String,
    /// `sentDateTime` exactly as the server sent it
    pub sent: String,
    /// `uniqueBody.content`, requested as plain text
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub id: String,
    pub sent: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledRecord {
    pub record: NormalizedRecord,
    pub label: bool,
}
