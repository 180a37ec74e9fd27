use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Visibility test used by the lit program when sampling a light's shadow map.
///
/// The discriminant is the integer handed to the fragment shader as
/// `shadow_class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadowTechnique {
    /// Single depth comparison.
    Hard = 0,
    /// Percentage-closer filtering over a fixed Poisson disk.
    Pcf = 1,
    /// Percentage-closer soft shadows: blocker search, penumbra estimate, PCF.
    #[default]
    Pcss = 2,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShadowTechniqueError {
    #[error("shadow class {0} is out of range (expected 0, 1 or 2)")]
    OutOfRange(i32),
    #[error("unknown shadow technique `{0}` (expected SM, PCF or PCSS)")]
    UnknownName(String),
}

impl ShadowTechnique {
    /// Value written into the `shadow_class` uniform.
    pub const fn as_uniform(self) -> i32 {
        self as i32
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Hard => "SM",
            Self::Pcf => "PCF",
            Self::Pcss => "PCSS",
        }
    }
}

impl TryFrom<i32> for ShadowTechnique {
    type Error = ShadowTechniqueError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Hard),
            1 => Ok(Self::Pcf),
            2 => Ok(Self::Pcss),
            other => Err(ShadowTechniqueError::OutOfRange(other)),
        }
    }
}

impl FromStr for ShadowTechnique {
    type Err = ShadowTechniqueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<i32>() {
            return Self::try_from(value);
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "SM" | "HARD" => Ok(Self::Hard),
            "PCF" => Ok(Self::Pcf),
            "PCSS" => Ok(Self::Pcss),
            _ => Err(ShadowTechniqueError::UnknownName(trimmed.to_string())),
        }
    }
}

impl fmt::Display for ShadowTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_values_match_shader_branches() {
        assert_eq!(ShadowTechnique::Hard.as_uniform(), 0);
        assert_eq!(ShadowTechnique::Pcf.as_uniform(), 1);
        assert_eq!(ShadowTechnique::Pcss.as_uniform(), 2);
    }

    #[test]
    fn parses_gui_names_and_numbers() {
        assert_eq!("SM".parse::<ShadowTechnique>().unwrap(), ShadowTechnique::Hard);
        assert_eq!("pcf".parse::<ShadowTechnique>().unwrap(), ShadowTechnique::Pcf);
        assert_eq!(" PCSS ".parse::<ShadowTechnique>().unwrap(), ShadowTechnique::Pcss);
        assert_eq!("1".parse::<ShadowTechnique>().unwrap(), ShadowTechnique::Pcf);
    }

    #[test]
    fn rejects_unknown_modes() {
        assert_eq!(
            ShadowTechnique::try_from(3),
            Err(ShadowTechniqueError::OutOfRange(3))
        );
        assert!("VSM".parse::<ShadowTechnique>().is_err());
    }
}
