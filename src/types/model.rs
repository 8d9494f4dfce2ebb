use std::fmt;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Represents a ZhipuAI model identifier.
///
/// This can be a predefined model version or a custom string value
/// for models that may be added in the future.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier (for future models or private models)
    Custom(String),
}

/// Known ZhipuAI model versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownModel {
    /// GLM-4, the general-purpose flagship.
    Glm4,

    /// GLM-4-Plus, higher quality variant.
    Glm4Plus,

    /// GLM-4-Air, lighter and cheaper.
    Glm4Air,

    /// GLM-4-AirX, low-latency variant of Air.
    Glm4AirX,

    /// GLM-4-Long, extended context window.
    Glm4Long,

    /// GLM-4-Flash, the fastest and cheapest variant.
    Glm4Flash,

    /// GLM-4-FlashX, enhanced Flash.
    Glm4FlashX,

    /// GLM-3-Turbo, previous generation.
    Glm3Turbo,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known_model) => write!(f, "{}", known_model),
            Model::Custom(custom) => write!(f, "{}", custom),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnownModel::Glm4 => write!(f, "glm-4"),
            KnownModel::Glm4Plus => write!(f, "glm-4-plus"),
            KnownModel::Glm4Air => write!(f, "glm-4-air"),
            KnownModel::Glm4AirX => write!(f, "glm-4-airx"),
            KnownModel::Glm4Long => write!(f, "glm-4-long"),
            KnownModel::Glm4Flash => write!(f, "glm-4-flash"),
            KnownModel::Glm4FlashX => write!(f, "glm-4-flashx"),
            KnownModel::Glm3Turbo => write!(f, "glm-3-turbo"),
        }
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        match s {
            "glm-4" => Model::Known(KnownModel::Glm4),
            "glm-4-plus" => Model::Known(KnownModel::Glm4Plus),
            "glm-4-air" => Model::Known(KnownModel::Glm4Air),
            "glm-4-airx" => Model::Known(KnownModel::Glm4AirX),
            "glm-4-long" => Model::Known(KnownModel::Glm4Long),
            "glm-4-flash" => Model::Known(KnownModel::Glm4Flash),
            "glm-4-flashx" => Model::Known(KnownModel::Glm4FlashX),
            "glm-3-turbo" => Model::Known(KnownModel::Glm3Turbo),
            other => Model::Custom(other.to_string()),
        }
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Model::from(s))
    }
}

// Model identifiers contain digit boundaries ("glm-4") that serde's
// rename_all cannot produce, so (de)serialization goes through the
// Display/From string forms.
impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Model::from(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_value, json, to_value};

    #[test]
    fn display_known_models() {
        assert_eq!(Model::Known(KnownModel::Glm4).to_string(), "glm-4");
        assert_eq!(
            Model::Known(KnownModel::Glm4Flash).to_string(),
            "glm-4-flash"
        );
        assert_eq!(
            Model::Custom("glm-experimental".to_string()).to_string(),
            "glm-experimental"
        );
    }

    #[test]
    fn parse_round_trips() {
        let model: Model = "glm-4".parse().unwrap();
        assert_eq!(model, Model::Known(KnownModel::Glm4));

        let model: Model = "glm-4-plus".parse().unwrap();
        assert_eq!(model, Model::Known(KnownModel::Glm4Plus));

        let model: Model = "some-private-model".parse().unwrap();
        assert_eq!(model, Model::Custom("some-private-model".to_string()));
    }

    #[test]
    fn serializes_as_string() {
        let json = to_value(Model::Known(KnownModel::Glm4)).unwrap();
        assert_eq!(json, json!("glm-4"));

        let model: Model = from_value(json!("glm-4-air")).unwrap();
        assert_eq!(model, Model::Known(KnownModel::Glm4Air));

        let model: Model = from_value(json!("glm-next")).unwrap();
        assert_eq!(model, Model::Custom("glm-next".to_string()));
    }
}
