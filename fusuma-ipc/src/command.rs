use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Reflow,
    Reload,

    // Queries
    ListApplications,
    ListBindings,

    // Control
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error { message: String },
    Applications { applications: Vec<ApplicationInfo> },
    Bindings { bindings: Vec<BindingInfo> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationInfo {
    pub pid: i32,
    pub bundle_id: String,
    pub title: Option<String>,
    pub window_count: usize,
    pub managed_count: usize,
    pub hidden: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingInfo {
    pub key: String,
    pub action: String,
}
