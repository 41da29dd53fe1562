//! Tool definition types

/// Definition of an external tool Black Road depends on
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    /// Unique identifier (the executable name)
    pub id: &'static str,

    /// Human-readable name
    pub name: &'static str,

    /// What the tool is used for
    pub description: &'static str,

    /// Command to check existence
    pub command: &'static str,

    /// Flag to get the version
    pub version_flag: &'static str,

    /// One-line installation pointer shown when the tool is missing
    pub install_hint: &'static str,

    /// Official documentation URL
    pub docs_url: &'static str,
}
