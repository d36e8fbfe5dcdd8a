//! Static checks on a program before it is handed to the engine.

use std::collections::HashSet;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{AutomationError, AutomationResult};
use crate::program::ProgramContext;

/// Root name of every `${name...}` interpolation.
const INTERPOLATION_PATTERN: &str = r"\$\{([^}.\[]+)";

/// `pkg:Type` or `pkg:module:Type`.
const TOKEN_PATTERN: &str = r"^[A-Za-z0-9-]+(:[A-Za-z0-9/_-]*)?:[A-Za-z0-9_]+$";

/// Validation report for a program.
#[derive(Debug)]
pub struct ValidationReport {
    pub checks: Vec<ValidationCheck>,
    pub passed: bool,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            passed: true,
        }
    }

    pub fn add_check(&mut self, name: &str, passed: bool, message: &str) {
        if !passed {
            self.passed = false;
        }
        self.checks.push(ValidationCheck {
            name: name.to_string(),
            passed,
            message: message.to_string(),
        });
    }

    /// Messages of the failed checks.
    pub fn failures(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| format!("{}: {}", c.name, c.message))
            .collect()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ValidationCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,
}

/// Checks declarations for mistakes the engine would only report mid-update.
#[derive(Debug, Clone)]
pub struct ProgramValidator {
    interpolation: Regex,
    token: Regex,
}

impl ProgramValidator {
    pub fn new() -> AutomationResult<Self> {
        Ok(Self {
            interpolation: compile(INTERPOLATION_PATTERN)?,
            token: compile(TOKEN_PATTERN)?,
        })
    }

    fn is_valid_token(&self, token: &str) -> bool {
        self.token.is_match(token)
    }

    pub fn validate(&self, program: &ProgramContext) -> ValidationReport {
        info!("Validating program {}", program.project_name());
        let mut report = ValidationReport::new();

        if program.resources().is_empty() {
            report.add_check("resources", false, "program declares no resources");
            return report;
        }

        let mut declared = HashSet::new();
        let names = program
            .resources()
            .iter()
            .map(|r| r.name.as_str())
            .chain(program.variables().iter().map(|v| v.name.as_str()));
        for name in names {
            if !declared.insert(name) {
                report.add_check("names", false, &format!("'{}' is declared twice", name));
            }
        }

        for resource in program.resources() {
            if !self.is_valid_token(&resource.type_token) {
                report.add_check(
                    "types",
                    false,
                    &format!("'{}' has malformed type '{}'", resource.name, resource.type_token),
                );
            }
            for dep in &resource.depends_on {
                if !program.resources().iter().any(|r| &r.name == dep) {
                    report.add_check(
                        "dependsOn",
                        false,
                        &format!("'{}' depends on undeclared resource '{}'", resource.name, dep),
                    );
                }
            }
            self.check_references(&mut report, &declared, &resource.name, &resource.properties);
        }

        for variable in program.variables() {
            if !self.is_valid_token(&variable.function) {
                report.add_check(
                    "functions",
                    false,
                    &format!("'{}' has malformed function '{}'", variable.name, variable.function),
                );
            }
            self.check_references(&mut report, &declared, &variable.name, &variable.arguments);
        }

        for (key, value) in program.outputs() {
            self.check_references(&mut report, &declared, key, value);
        }

        if report.passed {
            report.add_check("program", true, "all declarations resolve");
        }
        debug!("Validation finished with {} checks", report.checks.len());
        report
    }

    fn check_references(
        &self,
        report: &mut ValidationReport,
        declared: &HashSet<&str>,
        owner: &str,
        value: &Value,
    ) {
        match value {
            Value::String(s) => {
                for capture in self.interpolation.captures_iter(s) {
                    let target = &capture[1];
                    if !declared.contains(target) {
                        report.add_check(
                            "references",
                            false,
                            &format!("'{}' refers to undeclared '{}'", owner, target),
                        );
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.check_references(report, declared, owner, item);
                }
            }
            Value::Object(map) => {
                for item in map.values() {
                    self.check_references(report, declared, owner, item);
                }
            }
            _ => {}
        }
    }
}

fn compile(pattern: &str) -> AutomationResult<Regex> {
    Regex::new(pattern).map_err(|e| {
        AutomationError::InvalidProgram(format!("invalid validation pattern {}: {}", pattern, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Invoke, Reference, Resource};
    use serde_json::json;

    #[test]
    fn test_valid_program_passes() {
        let mut ctx = ProgramContext::new("demo");
        let vpc = ctx.invoke(Invoke::new("vpcId", "aws:ec2:getVpc").returning("id"));
        let sg = ctx.resource(
            Resource::new("sg", "aws:ec2:SecurityGroup").properties(json!({ "vpcId": vpc.value() })),
        );
        ctx.export("sg", sg.id());

        let report = ProgramValidator::new().unwrap().validate(&ctx);
        assert!(report.passed, "{:?}", report.failures());
    }

    #[test]
    fn test_empty_program_fails() {
        let report = ProgramValidator::new().unwrap().validate(&ProgramContext::new("empty"));
        assert!(!report.passed);
        assert_eq!(report.checks[0].name, "resources");
    }

    #[test]
    fn test_undeclared_reference_fails() {
        let mut ctx = ProgramContext::new("demo");
        ctx.resource(
            Resource::new("object", "aws:s3:BucketObject")
                .properties(json!({ "bucket": "${missing.id}" })),
        );

        let report = ProgramValidator::new().unwrap().validate(&ctx);
        assert!(!report.passed);
        assert!(report.failures()[0].contains("undeclared 'missing'"));
    }

    #[test]
    fn test_output_reference_checked() {
        let mut ctx = ProgramContext::new("demo");
        ctx.resource(Resource::new("bucket", "aws:s3:BucketV2"));
        ctx.export("url", "${nowhere.url}");

        let failures = ProgramValidator::new().unwrap().validate(&ctx).failures();
        assert_eq!(failures, vec!["references: 'url' refers to undeclared 'nowhere'"]);
    }

    #[test]
    fn test_duplicate_names_and_bad_depends_on() {
        let mut ctx = ProgramContext::new("demo");
        ctx.resource(Resource::new("bucket", "aws:s3:BucketV2"));
        ctx.resource(
            Resource::new("bucket", "aws:s3:BucketV2").depends_on([&Reference::new("ghost")]),
        );

        let failures = ProgramValidator::new().unwrap().validate(&ctx).failures();
        assert!(failures.iter().any(|f| f.contains("declared twice")));
        assert!(failures.iter().any(|f| f.contains("undeclared resource 'ghost'")));
    }

    #[test]
    fn test_type_tokens() {
        let validator = ProgramValidator::new().unwrap();
        for ok in ["aws:s3:BucketV2", "random:RandomPet", "random:index/randomPet:RandomPet"] {
            assert!(validator.is_valid_token(ok), "{}", ok);
        }
        for bad in ["BucketV2", "aws s3 Bucket", ""] {
            assert!(!validator.is_valid_token(bad), "{}", bad);
        }
    }
}
