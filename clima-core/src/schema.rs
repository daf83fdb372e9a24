//! Declarative description of JSON shapes.
//!
//! A [`Schema`] says what a value must look like; a [`SchemaSet`] names
//! schemas so objects can refer to each other. The generic walker that
//! applies a schema to a value lives in [`crate::codec`].

use std::{collections::HashMap, fmt, sync::LazyLock};

use serde_json::Value;

use crate::error::DecodeError;

/// Name of the root schema for one `current.json` response.
pub const WEATHER: &str = "Weather";

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Accepts any value unchanged.
    Any,
    /// Accepts nothing. Used as the additional-properties schema of closed objects.
    Never,
    Null,
    String,
    /// Any JSON number, integral or not.
    Number,
    Boolean,
    /// A calendar date given as anything but a bare number.
    Date,
    /// One of a closed set of literal values.
    Enum(Vec<Value>),
    Array(Box<Schema>),
    /// Alternatives tried in order; the first that matches wins.
    Union(Vec<Schema>),
    Object(ObjectSchema),
    /// Named schema, resolved through a [`SchemaSet`].
    Ref(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    pub props: Vec<Property>,
    /// Schema applied to fields not listed in `props`.
    pub additional: Box<Schema>,
}

/// One declared object field: its wire name, the name it gets once decoded,
/// and its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub json: String,
    pub field: String,
    pub schema: Schema,
}

impl Property {
    /// Property whose wire and decoded names are the same.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        let name = name.into();
        Self { json: name.clone(), field: name, schema }
    }

    pub fn renamed(json: impl Into<String>, field: impl Into<String>, schema: Schema) -> Self {
        Self { json: json.into(), field: field.into(), schema }
    }
}

impl ObjectSchema {
    pub fn by_json(&self, json: &str) -> Option<&Property> {
        self.props.iter().find(|p| p.json == json)
    }

    pub fn by_field(&self, field: &str) -> Option<&Property> {
        self.props.iter().find(|p| p.field == field)
    }
}

impl Schema {
    pub fn object(props: Vec<Property>, additional: Schema) -> Self {
        Schema::Object(ObjectSchema { props, additional: Box::new(additional) })
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array(Box::new(items))
    }

    pub fn union(members: impl IntoIterator<Item = Schema>) -> Self {
        Schema::Union(members.into_iter().collect())
    }

    pub fn literals(values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Schema::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Schema::Ref(name.into())
    }

    /// Short name used as the "expected" part of error messages.
    pub fn describe(&self) -> String {
        match self {
            Schema::Any => "any".to_string(),
            Schema::Never => "never".to_string(),
            Schema::Null => "null".to_string(),
            Schema::String => "string".to_string(),
            Schema::Number => "number".to_string(),
            Schema::Boolean => "boolean".to_string(),
            Schema::Date => "date".to_string(),
            Schema::Enum(cases) => Value::Array(cases.clone()).to_string(),
            Schema::Array(_) => "array".to_string(),
            Schema::Union(_) => "union".to_string(),
            Schema::Object(_) => "object".to_string(),
            Schema::Ref(name) => name.clone(),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Registry of named schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    schemas: HashMap<String, Schema>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`SchemaSet::insert`].
    pub fn with(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.insert(name, schema);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) {
        self.schemas.insert(name.into(), schema);
    }

    pub fn get(&self, name: &str) -> Result<&Schema, DecodeError> {
        self.schemas
            .get(name)
            .ok_or_else(|| DecodeError::UnknownSchema(name.to_string()))
    }

    /// Follow references until a concrete schema is reached.
    pub fn resolve<'a>(&'a self, mut schema: &'a Schema) -> Result<&'a Schema, DecodeError> {
        let mut hops = 0;
        while let Schema::Ref(name) = schema {
            if hops > self.schemas.len() {
                // Only a cycle can take more hops than there are names.
                return Err(DecodeError::UnknownSchema(name.clone()));
            }
            schema = self.get(name)?;
            hops += 1;
        }
        Ok(schema)
    }
}

static WEATHER_SCHEMAS: LazyLock<SchemaSet> = LazyLock::new(build_weather_schemas);

/// Schemas of the weatherapi.com `current.json` response.
///
/// Objects are open: fields upstream adds over time are carried through
/// untouched instead of failing the whole report.
pub fn weather_schemas() -> &'static SchemaSet {
    &WEATHER_SCHEMAS
}

fn build_weather_schemas() -> SchemaSet {
    use Property as P;

    SchemaSet::new()
        .with(
            WEATHER,
            Schema::object(
                vec![
                    P::new("location", Schema::reference("Location")),
                    P::new("current", Schema::reference("Current")),
                ],
                Schema::Any,
            ),
        )
        .with(
            "Location",
            Schema::object(
                vec![
                    P::new("name", Schema::String),
                    P::new("region", Schema::String),
                    P::new("country", Schema::String),
                    P::renamed("lat", "latitude", Schema::Number),
                    P::renamed("lon", "longitude", Schema::Number),
                    P::renamed("tz_id", "timezone_id", Schema::String),
                    P::new("localtime_epoch", Schema::Number),
                    P::new("localtime", Schema::String),
                ],
                Schema::Any,
            ),
        )
        .with(
            "Current",
            Schema::object(
                vec![
                    P::new("last_updated_epoch", Schema::Number),
                    P::new("last_updated", Schema::String),
                    P::new("temp_c", Schema::Number),
                    P::new("temp_f", Schema::Number),
                    P::new("is_day", Schema::Number),
                    P::new("condition", Schema::reference("Condition")),
                    P::new("wind_mph", Schema::Number),
                    P::new("wind_kph", Schema::Number),
                    P::new("wind_degree", Schema::Number),
                    P::new("wind_dir", Schema::String),
                    P::new("pressure_mb", Schema::Number),
                    P::new("pressure_in", Schema::Number),
                    P::new("precip_mm", Schema::Number),
                    P::new("precip_in", Schema::Number),
                    P::new("humidity", Schema::Number),
                    P::new("cloud", Schema::Number),
                    P::renamed("feelslike_c", "feels_like_c", Schema::Number),
                    P::renamed("feelslike_f", "feels_like_f", Schema::Number),
                    P::renamed("vis_km", "visibility_km", Schema::Number),
                    P::renamed("vis_miles", "visibility_miles", Schema::Number),
                    P::new("uv", Schema::Number),
                    P::new("gust_mph", Schema::Number),
                    P::new("gust_kph", Schema::Number),
                ],
                Schema::Any,
            ),
        )
        .with(
            "Condition",
            Schema::object(
                vec![
                    P::new("text", Schema::String),
                    P::new("icon", Schema::String),
                    P::new("code", Schema::Number),
                ],
                Schema::Any,
            ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_refs_all_resolve() {
        let set = weather_schemas();
        for name in [WEATHER, "Location", "Current", "Condition"] {
            let reference = Schema::reference(name);
            let schema = set.resolve(&reference).expect("schema must exist");
            assert!(matches!(schema, Schema::Object(_)), "{name} should be an object");
        }
    }

    #[test]
    fn resolve_follows_chains() {
        let set = SchemaSet::new()
            .with("A", Schema::reference("B"))
            .with("B", Schema::String);

        assert_eq!(set.resolve(&Schema::reference("A")).unwrap(), &Schema::String);
    }

    #[test]
    fn resolve_unknown_and_cyclic_refs_fail() {
        let set = SchemaSet::new()
            .with("A", Schema::reference("B"))
            .with("B", Schema::reference("A"));

        let err = set.resolve(&Schema::reference("Nope")).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownSchema(name) if name == "Nope"));

        assert!(set.resolve(&Schema::reference("A")).is_err());
    }

    #[test]
    fn renamed_properties_map_both_ways() {
        let Ok(Schema::Object(location)) = weather_schemas().get("Location") else {
            panic!("Location must be an object schema");
        };

        assert_eq!(location.by_json("tz_id").map(|p| p.field.as_str()), Some("timezone_id"));
        assert_eq!(location.by_field("latitude").map(|p| p.json.as_str()), Some("lat"));
        assert!(location.by_json("latitude").is_none());
    }

    #[test]
    fn describe_enum_lists_literals() {
        let schema = Schema::literals(["N", "S"]);
        assert_eq!(schema.describe(), r#"["N","S"]"#);
    }
}
