use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::lib::errors::ArgumentError;

/// Separator used by `name:=value` launch argument assignments.
pub const ASSIGNMENT_SEPARATOR: &str = ":=";

/// A typed launch argument: name, optional default and optional choice set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentDeclaration {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    pub description: String,
}

impl ArgumentDeclaration {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            default: None,
            choices: None,
            description: description.to_string(),
        }
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn with_choices(mut self, choices: &[&str]) -> Self {
        self.choices = Some(choices.iter().map(|choice| choice.to_string()).collect());
        self
    }

    /// Check `value` against the declared choices, if any.
    pub fn validate(&self, value: &str) -> Result<(), ArgumentError> {
        match &self.choices {
            Some(choices) if !choices.iter().any(|choice| choice == value) => {
                Err(ArgumentError::InvalidChoice {
                    name: self.name.clone(),
                    value: value.to_string(),
                    choices: choices.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// A declaration is consistent when its default is one of its choices.
    pub fn is_consistent(&self) -> bool {
        match &self.default {
            Some(default) => self.validate(default).is_ok(),
            None => true,
        }
    }
}

/// Argument values for one launch: defaults overlaid with caller overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfiguration {
    values: BTreeMap<String, String>,
}

impl ResolvedConfiguration {
    /// Resolve every declaration, validating choices before anything else runs.
    ///
    /// Overrides naming undeclared arguments are kept (they may be referenced by
    /// parameter files) but logged, matching how the launch runtime ignores them.
    pub fn resolve(
        declarations: &[ArgumentDeclaration],
        overrides: &BTreeMap<String, String>,
    ) -> Result<Self, ArgumentError> {
        let mut values = BTreeMap::new();
        for declaration in declarations {
            let value = overrides
                .get(&declaration.name)
                .or(declaration.default.as_ref())
                .ok_or_else(|| ArgumentError::MissingRequired {
                    name: declaration.name.clone(),
                })?;
            declaration.validate(value)?;
            values.insert(declaration.name.clone(), value.clone());
        }

        for (name, value) in overrides {
            if !values.contains_key(name) {
                warn!(
                    target: "onrobot_launch::plan",
                    argument = %name,
                    "Ignoring launch argument that is not declared by this plan"
                );
                values.insert(name.clone(), value.clone());
            }
        }

        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl FromIterator<(String, String)> for ResolvedConfiguration {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Parse `name:=value` assignments; later assignments win.
pub fn parse_assignments<I, S>(raw: I) -> Result<BTreeMap<String, String>, ArgumentError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = BTreeMap::new();
    for item in raw {
        let item = item.as_ref();
        let (name, value) = item
            .split_once(ASSIGNMENT_SEPARATOR)
            .filter(|(name, _)| is_valid_argument_name(name))
            .ok_or_else(|| ArgumentError::MalformedAssignment {
                raw: item.to_string(),
            })?;
        parsed.insert(name.to_string(), value.to_string());
    }
    Ok(parsed)
}

fn is_valid_argument_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gripper_type() -> ArgumentDeclaration {
        ArgumentDeclaration::new("onrobot_type", "Type of OnRobot gripper.")
            .with_choices(&["rg2", "rg6"])
    }

    fn overrides(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn defaults_fill_unset_arguments() {
        let declarations = vec![
            gripper_type(),
            ArgumentDeclaration::new("port", "TCP port.").with_default("502"),
        ];
        let resolved =
            ResolvedConfiguration::resolve(&declarations, &overrides(&[("onrobot_type", "rg6")]))
                .expect("valid arguments");
        assert_eq!(resolved.get("onrobot_type"), Some("rg6"));
        assert_eq!(resolved.get("port"), Some("502"));
    }

    #[test]
    fn value_outside_choices_is_rejected() {
        let err = ResolvedConfiguration::resolve(
            &[gripper_type()],
            &overrides(&[("onrobot_type", "rg9")]),
        )
        .expect_err("rg9 is not a valid gripper");
        assert_eq!(
            err,
            ArgumentError::InvalidChoice {
                name: "onrobot_type".into(),
                value: "rg9".into(),
                choices: vec!["rg2".into(), "rg6".into()],
            }
        );
    }

    #[test]
    fn argument_without_default_is_required() {
        let err = ResolvedConfiguration::resolve(&[gripper_type()], &BTreeMap::new())
            .expect_err("onrobot_type has no default");
        assert_eq!(
            err,
            ArgumentError::MissingRequired {
                name: "onrobot_type".into()
            }
        );
    }

    #[test]
    fn empty_default_is_still_a_default() {
        let declarations = [ArgumentDeclaration::new("prefix", "Joint prefix.").with_default("")];
        let resolved = ResolvedConfiguration::resolve(&declarations, &BTreeMap::new())
            .expect("empty default is valid");
        assert_eq!(resolved.get("prefix"), Some(""));
    }

    #[test]
    fn undeclared_overrides_are_kept() {
        let resolved = ResolvedConfiguration::resolve(
            &[gripper_type()],
            &overrides(&[("onrobot_type", "rg2"), ("robot_ip", "10.0.0.2")]),
        )
        .expect("extra arguments are tolerated");
        assert_eq!(resolved.get("robot_ip"), Some("10.0.0.2"));
    }

    #[test]
    fn default_outside_choices_is_inconsistent() {
        let declaration = gripper_type().with_default("rg9");
        assert!(!declaration.is_consistent());
        assert!(gripper_type().with_default("rg2").is_consistent());
    }

    #[test]
    fn assignments_split_on_first_separator() {
        let parsed = parse_assignments(["ip_address:=10.0.0.5", "prefix:=", "device:=a:=b"])
            .expect("well-formed assignments");
        assert_eq!(parsed.get("ip_address").map(String::as_str), Some("10.0.0.5"));
        assert_eq!(parsed.get("prefix").map(String::as_str), Some(""));
        assert_eq!(parsed.get("device").map(String::as_str), Some("a:=b"));
    }

    #[test]
    fn malformed_assignment_is_rejected() {
        for raw in ["onrobot_type=rg2", ":=rg2", "bad name:=x"] {
            assert_eq!(
                parse_assignments([raw]),
                Err(ArgumentError::MalformedAssignment { raw: raw.into() }),
                "{raw} should be rejected"
            );
        }
    }
}
