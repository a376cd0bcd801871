use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::FieldSpec;

const KEPLER_FIELDS: [FieldSpec; 13] = [
    FieldSpec::new("koi_period", "Orbital Period", "days"),
    FieldSpec::new("koi_time0bk", "Transit Epoch", "BKJD"),
    FieldSpec::new("koi_impact", "Impact Parameter", ""),
    FieldSpec::new("koi_duration", "Transit Duration", "hours"),
    FieldSpec::new("koi_depth", "Transit Depth", "ppm"),
    FieldSpec::new("koi_prad", "Planetary Radius", "Earth radii"),
    FieldSpec::new("koi_teq", "Equilibrium Temperature", "K"),
    FieldSpec::new("koi_insol", "Insolation Flux", "Earth flux"),
    FieldSpec::new("koi_model_snr", "Transit Signal-to-Noise", ""),
    FieldSpec::new("koi_steff", "Stellar Effective Temperature", "K"),
    FieldSpec::new("koi_slogg", "Stellar Surface Gravity", "log10(cm/s^2)"),
    FieldSpec::new("koi_srad", "Stellar Radius", "Solar radii"),
    FieldSpec::new("koi_kepmag", "Kepler-band Magnitude", "mag"),
];

const TESS_FIELDS: [FieldSpec; 11] = [
    FieldSpec::new("pl_orbper", "Orbital Period", "days"),
    FieldSpec::new("pl_trandurh", "Transit Duration", "hours"),
    FieldSpec::new("pl_trandep", "Transit Depth", "ppm"),
    FieldSpec::new("pl_rade", "Planet Radius", "Earth radii"),
    FieldSpec::new("pl_insol", "Insolation Flux", "Earth flux"),
    FieldSpec::new("pl_eqt", "Equilibrium Temperature", "K"),
    FieldSpec::new("st_tmag", "TESS Magnitude", "mag"),
    FieldSpec::new("st_dist", "Stellar Distance", "pc"),
    FieldSpec::new("st_teff", "Stellar Effective Temperature", "K"),
    FieldSpec::new("st_logg", "Stellar Surface Gravity", "log10(cm/s^2)"),
    FieldSpec::new("st_rad", "Stellar Radius", "Solar radii"),
];

const KEPLER_CLASSES: [&str; 3] = ["CONFIRMED", "CANDIDATE", "FALSE POSITIVE"];
const TESS_CLASSES: [&str; 6] = ["CP", "KP", "PC", "APC", "FP", "FA"];

/// Measurement schema accepted by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    #[default]
    Kepler,
    Tess,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown schema '{0}': expected 'kepler' or 'tess'")]
pub struct UnknownSchema(pub String);

impl Schema {
    pub const ALL: [Schema; 2] = [Schema::Kepler, Schema::Tess];

    /// Ordered field set; the order is the order of the wire feature vector
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Self::Kepler => &KEPLER_FIELDS,
            Self::Tess => &TESS_FIELDS,
        }
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields().iter().map(|f| f.name).collect()
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Class labels the base model is known to emit
    pub fn known_classes(&self) -> &'static [&'static str] {
        match self {
            Self::Kepler => &KEPLER_CLASSES,
            Self::Tess => &TESS_CLASSES,
        }
    }

    /// Name the backend uses to locate the model artifacts
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::Kepler => "kepler",
            Self::Tess => "tess",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Kepler => "Kepler",
            Self::Tess => "TESS",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownSchema> {
        match value.trim().to_lowercase().as_str() {
            "kepler" | "koi" => Ok(Self::Kepler),
            "tess" | "toi" => Ok(Self::Tess),
            _ => Err(UnknownSchema(value.to_string())),
        }
    }
}

impl FromStr for Schema {
    type Err = UnknownSchema;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.model_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_counts() {
        assert_eq!(Schema::Kepler.fields().len(), 13);
        assert_eq!(Schema::Tess.fields().len(), 11);
    }

    #[test]
    fn test_field_names_are_unique() {
        for schema in Schema::ALL {
            let mut names = schema.field_names();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), schema.fields().len());
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(Schema::parse("kepler"), Ok(Schema::Kepler));
        assert_eq!(Schema::parse(" TESS "), Ok(Schema::Tess));
        assert!(Schema::parse("k2").is_err());
    }

    #[test]
    fn test_serde_uses_model_name() {
        assert_eq!(serde_json::to_string(&Schema::Tess).unwrap(), "\"tess\"");
        let schema: Schema = serde_json::from_str("\"kepler\"").unwrap();
        assert_eq!(schema, Schema::Kepler);
    }

    #[test]
    fn test_field_lookup() {
        assert!(Schema::Kepler.field("koi_prad").is_some());
        assert!(Schema::Kepler.field("pl_rade").is_none());
    }
}
