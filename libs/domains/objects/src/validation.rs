use chrono::DateTime;
use serde_json::Value;

use crate::error::FieldViolation;
use crate::models::{ClassDefinition, Properties, PropertyKind};

/// Validate a property payload against a class definition.
///
/// Collects every violation rather than stopping at the first: missing
/// required properties, values of the wrong kind, and properties the class
/// does not define.
pub fn validate_properties(class: &ClassDefinition, properties: &Properties) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    for definition in &class.properties {
        match properties.get(&definition.name) {
            None if definition.required => violations.push(FieldViolation::new(
                &definition.name,
                "required property is missing",
            )),
            None => {}
            Some(value) => {
                if !matches_kind(definition.kind, value) {
                    violations.push(FieldViolation::new(
                        &definition.name,
                        format!("expected {} value", definition.kind),
                    ));
                }
            }
        }
    }

    for name in properties.keys() {
        if class.property(name).is_none() {
            violations.push(FieldViolation::new(
                name,
                format!("property is not part of class '{}'", class.name),
            ));
        }
    }

    violations
}

fn matches_kind(kind: PropertyKind, value: &Value) -> bool {
    match kind {
        PropertyKind::Text => value.is_string(),
        PropertyKind::Int => value.is_i64() || value.is_u64(),
        PropertyKind::Number => value.is_number(),
        PropertyKind::Bool => value.is_boolean(),
        PropertyKind::Date => value
            .as_str()
            .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::PropertyDefinition;

    fn article_class() -> ClassDefinition {
        ClassDefinition::new("Article", 4)
            .with_property(PropertyDefinition::new("title", PropertyKind::Text).required())
            .with_property(PropertyDefinition::new("words", PropertyKind::Int))
            .with_property(PropertyDefinition::new("rating", PropertyKind::Number))
            .with_property(PropertyDefinition::new("published", PropertyKind::Bool))
    }

    fn props(pairs: &[(&str, Value)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn valid_payload_passes() {
        let violations = validate_properties(
            &article_class(),
            &props(&[
                ("title", json!("intro")),
                ("words", json!(120)),
                ("rating", json!(4.5)),
                ("published", json!(true)),
            ]),
        );
        assert!(violations.is_empty(), "unexpected violations: {violations:?}");
    }

    #[test]
    fn every_violation_is_collected() {
        let violations = validate_properties(
            &article_class(),
            &props(&[("words", json!("not a number")), ("bogus", json!(1))]),
        );

        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(violations.len(), 3);
        assert!(fields.contains(&"title"), "missing required title");
        assert!(fields.contains(&"words"), "wrong kind for words");
        assert!(fields.contains(&"bogus"), "undefined property");
    }

    #[test]
    fn optional_properties_may_be_absent() {
        let violations =
            validate_properties(&article_class(), &props(&[("title", json!("intro"))]));
        assert!(violations.is_empty());
    }

    #[test]
    fn date_requires_an_rfc3339_string() {
        let class = ClassDefinition::new("C", 1)
            .with_property(PropertyDefinition::new("at", PropertyKind::Date));
        assert!(
            validate_properties(&class, &props(&[("at", json!("2026-08-30T12:00:00Z"))]))
                .is_empty()
        );
        assert_eq!(
            validate_properties(&class, &props(&[("at", json!("yesterday"))])).len(),
            1
        );
        assert_eq!(
            validate_properties(&class, &props(&[("at", json!(1756555200))])).len(),
            1
        );
    }

    #[test]
    fn int_accepts_unsigned_and_signed() {
        let class = ClassDefinition::new("C", 1)
            .with_property(PropertyDefinition::new("n", PropertyKind::Int));
        assert!(validate_properties(&class, &props(&[("n", json!(-3))])).is_empty());
        assert!(validate_properties(&class, &props(&[("n", json!(3))])).is_empty());
        assert_eq!(
            validate_properties(&class, &props(&[("n", json!(3.5))])).len(),
            1
        );
    }
}
