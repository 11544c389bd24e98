use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::schema::{type_name, ValidationErrors, Validator};

pub const DEFAULT_NAME: &str = "nitish";
pub const DEFAULT_CGPA: f64 = 5.0;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

/// A student record.
///
/// | field | default | constraint |
/// |-------|---------|------------|
/// | `name` | `"nitish"` | string |
/// | `age` | none | non-negative integer or null |
/// | `email` | required | valid address |
/// | `cgpa` | `5.0` | `0 < cgpa < 10` |
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Student {
    pub name: String,
    pub age: Option<u32>,
    pub email: String,
    /// A decimal value representing the cgpa of the student
    pub cgpa: f64,
}

impl Student {
    /// Build a student from typed values, checking `email` and `cgpa`.
    pub fn new(
        name: impl Into<String>,
        age: Option<u32>,
        email: impl Into<String>,
        cgpa: f64,
    ) -> Result<Self, ValidationErrors> {
        let email = email.into();
        let mut v = Validator::new("Student");
        check_email(&mut v, &email);
        check_cgpa(&mut v, cgpa);

        v.finish(Some(Self {
            name: name.into(),
            age,
            email,
            cgpa,
        }))
    }

    /// Build a student from a JSON object, applying defaults for absent
    /// fields and reporting every invalid one.
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new("Student");
        let Some(object) = value.as_object() else {
            v.error("(root)", format!("expected object, got {}", type_name(value)));
            return v.finish(None);
        };

        let name = match object.get("name") {
            None => Some(DEFAULT_NAME.to_string()),
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                v.error("name", format!("expected string, got {}", type_name(other)));
                None
            }
        };

        let age = match object.get("age") {
            None | Some(Value::Null) => Some(None),
            Some(Value::Number(n)) => match n.as_u64().and_then(|a| u32::try_from(a).ok()) {
                Some(a) => Some(Some(a)),
                None => {
                    v.error("age", format!("expected a non-negative integer, got {n}"));
                    None
                }
            },
            Some(other) => {
                v.error("age", format!("expected integer, got {}", type_name(other)));
                None
            }
        };

        let email = match object.get("email") {
            None => {
                v.error("email", "field required");
                None
            }
            Some(Value::String(s)) => {
                check_email(&mut v, s);
                Some(s.clone())
            }
            Some(other) => {
                v.error("email", format!("expected string, got {}", type_name(other)));
                None
            }
        };

        let cgpa = match object.get("cgpa") {
            None => Some(DEFAULT_CGPA),
            Some(Value::Number(n)) => n.as_f64().inspect(|c| check_cgpa(&mut v, *c)),
            Some(other) => {
                v.error("cgpa", format!("expected number, got {}", type_name(other)));
                None
            }
        };

        let student = match (name, age, email, cgpa) {
            (Some(name), Some(age), Some(email), Some(cgpa)) => Some(Self {
                name,
                age,
                email,
                cgpa,
            }),
            _ => None,
        };
        v.finish(student)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Field names and values in declaration order.
    pub fn to_map(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", Value::from(self.name.clone())),
            ("age", self.age.map_or(Value::Null, Value::from)),
            ("email", Value::from(self.email.clone())),
            ("cgpa", Value::from(self.cgpa)),
        ]
    }
}

fn check_email(v: &mut Validator, email: &str) {
    if !EMAIL.is_match(email) {
        v.error("email", format!("'{email}' is not a valid email address"));
    }
}

fn check_cgpa(v: &mut Validator, cgpa: f64) {
    if !(cgpa > 0.0 && cgpa < 10.0) {
        v.error("cgpa", format!("must be greater than 0 and less than 10, got {cgpa}"));
    }
}
