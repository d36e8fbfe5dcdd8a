//! Programs driven by the `pilot` binary.

pub mod database;
pub mod pet;
pub mod website;

/// A resource provider plugin pinned to a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginRef {
    pub name: &'static str,
    pub version: &'static str,
}

pub const AWS_PLUGIN: PluginRef = PluginRef {
    name: "aws",
    version: "v6.68.0",
};

pub const RANDOM_PLUGIN: PluginRef = PluginRef {
    name: "random",
    version: "v4.8.2",
};

/// Region every AWS program deploys to.
pub const DEFAULT_REGION: &str = "us-west-2";
