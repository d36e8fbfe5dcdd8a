//! Resource declarations for inline programs.
//!
//! A program is a closure over a [`ProgramContext`]. The context records
//! resources, invoke-backed variables and exports; nothing is evaluated
//! here. Values computed by the engine are written as `${name.attr}`
//! interpolations and resolved during the update.

use serde_json::Value;
use serde_yaml::Mapping;

use crate::error::AutomationResult;

/// Engine runtime used for rendered programs.
pub const YAML_RUNTIME: &str = "yaml";

/// Handle to a declared resource or variable, used to build interpolations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    name: String,
}

impl Reference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `${name}`: the resource itself, or a variable's value.
    pub fn value(&self) -> String {
        format!("${{{}}}", self.name)
    }

    /// `${name.id}`
    pub fn id(&self) -> String {
        self.attr("id")
    }

    /// `${name.<attr>}`
    pub fn attr(&self, attr: &str) -> String {
        format!("${{{}.{}}}", self.name, attr)
    }
}

/// A declared resource.
#[derive(Debug, Clone)]
pub struct Resource {
    /// Logical name, unique within the program
    pub name: String,
    /// Engine type token (e.g. `aws:s3:BucketV2`)
    pub type_token: String,
    /// Input properties
    pub properties: Value,
    /// Names of resources that must be created first
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(name: impl Into<String>, type_token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_token: type_token.into(),
            properties: Value::Null,
            depends_on: Vec::new(),
        }
    }

    pub fn properties(mut self, properties: Value) -> Self {
        self.properties = properties;
        self
    }

    pub fn depends_on<'a>(mut self, deps: impl IntoIterator<Item = &'a Reference>) -> Self {
        self.depends_on
            .extend(deps.into_iter().map(|r| r.name().to_string()));
        self
    }

    fn to_yaml(&self) -> AutomationResult<serde_yaml::Value> {
        let mut body = Mapping::new();
        body.insert("type".into(), self.type_token.clone().into());
        if !self.properties.is_null() {
            body.insert("properties".into(), serde_yaml::to_value(&self.properties)?);
        }
        if !self.depends_on.is_empty() {
            let deps: Vec<serde_yaml::Value> = self
                .depends_on
                .iter()
                .map(|d| Reference::new(d.as_str()).value().into())
                .collect();
            let mut options = Mapping::new();
            options.insert("dependsOn".into(), serde_yaml::Value::Sequence(deps));
            body.insert("options".into(), serde_yaml::Value::Mapping(options));
        }
        Ok(serde_yaml::Value::Mapping(body))
    }
}

/// A variable bound to the result of a provider function call.
#[derive(Debug, Clone)]
pub struct Invoke {
    pub name: String,
    /// Function token (e.g. `aws:ec2:getVpc`)
    pub function: String,
    pub arguments: Value,
    /// Field of the result to bind, or the whole result when `None`
    pub return_field: Option<String>,
}

impl Invoke {
    pub fn new(name: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            function: function.into(),
            arguments: Value::Null,
            return_field: None,
        }
    }

    pub fn arguments(mut self, arguments: Value) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn returning(mut self, field: impl Into<String>) -> Self {
        self.return_field = Some(field.into());
        self
    }

    fn to_yaml(&self) -> AutomationResult<serde_yaml::Value> {
        let mut call = Mapping::new();
        call.insert("function".into(), self.function.clone().into());
        if !self.arguments.is_null() {
            call.insert("arguments".into(), serde_yaml::to_value(&self.arguments)?);
        }
        if let Some(field) = &self.return_field {
            call.insert("return".into(), field.clone().into());
        }
        let mut body = Mapping::new();
        body.insert("fn::invoke".into(), serde_yaml::Value::Mapping(call));
        Ok(serde_yaml::Value::Mapping(body))
    }
}

/// Collects the declarations made by an inline program.
#[derive(Debug, Clone)]
pub struct ProgramContext {
    project_name: String,
    description: Option<String>,
    resources: Vec<Resource>,
    variables: Vec<Invoke>,
    outputs: Vec<(String, Value)>,
}

impl ProgramContext {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            description: None,
            resources: Vec::new(),
            variables: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Declare a resource.
    pub fn resource(&mut self, resource: Resource) -> Reference {
        let reference = Reference::new(resource.name.as_str());
        self.resources.push(resource);
        reference
    }

    /// Declare an invoke-backed variable.
    pub fn invoke(&mut self, invoke: Invoke) -> Reference {
        let reference = Reference::new(invoke.name.as_str());
        self.variables.push(invoke);
        reference
    }

    /// Export a stack output. Later exports replace earlier ones.
    pub fn export(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.outputs.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.outputs.push((key, value)),
        }
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn variables(&self) -> &[Invoke] {
        &self.variables
    }

    pub fn outputs(&self) -> &[(String, Value)] {
        &self.outputs
    }

    /// Render the project document (`Pulumi.yaml` contents).
    pub fn to_document(&self) -> AutomationResult<serde_yaml::Value> {
        let mut doc = Mapping::new();
        doc.insert("name".into(), self.project_name.clone().into());
        doc.insert("runtime".into(), YAML_RUNTIME.into());
        if let Some(description) = &self.description {
            doc.insert("description".into(), description.clone().into());
        }

        if !self.variables.is_empty() {
            let mut variables = Mapping::new();
            for variable in &self.variables {
                variables.insert(variable.name.clone().into(), variable.to_yaml()?);
            }
            doc.insert("variables".into(), serde_yaml::Value::Mapping(variables));
        }

        let mut resources = Mapping::new();
        for resource in &self.resources {
            resources.insert(resource.name.clone().into(), resource.to_yaml()?);
        }
        doc.insert("resources".into(), serde_yaml::Value::Mapping(resources));

        if !self.outputs.is_empty() {
            let mut outputs = Mapping::new();
            for (key, value) in &self.outputs {
                outputs.insert(key.clone().into(), serde_yaml::to_value(value)?);
            }
            doc.insert("outputs".into(), serde_yaml::Value::Mapping(outputs));
        }

        Ok(serde_yaml::Value::Mapping(doc))
    }

    pub fn to_yaml(&self) -> AutomationResult<String> {
        Ok(serde_yaml::to_string(&self.to_document()?)?)
    }
}
