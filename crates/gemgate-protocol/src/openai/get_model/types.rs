use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelObjectType {
    #[serde(rename = "model")]
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Model {
    /// The model identifier callers put in `model`.
    pub id: String,
    pub object: ModelObjectType,
    /// Unix seconds.
    pub created: i64,
    pub owned_by: String,
}
