use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Most recently accessed set ids, newest first. At most 5, no duplicates.
    #[serde(default)]
    pub recent_sets: Vec<String>,
}
