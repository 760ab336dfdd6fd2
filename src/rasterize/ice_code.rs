use std::fmt;
use std::str::FromStr;

use crate::error::IceError;

/// Analyst ice categories and the concentration each stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IceCode {
    /// Marginal ice zone, 10-80% concentration.
    Ct18,
    /// Pack ice, 80-100% concentration.
    Ct81,
}

impl IceCode {
    pub const ALL: [IceCode; 2] = [IceCode::Ct18, IceCode::Ct81];

    pub fn from_label(label: &str) -> Result<Self, IceError> {
        match label.trim() {
            "CT18" => Ok(IceCode::Ct18),
            "CT81" => Ok(IceCode::Ct81),
            other => Err(IceError::UnknownCategory(other.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IceCode::Ct18 => "CT18",
            IceCode::Ct81 => "CT81",
        }
    }

    /// Representative concentration burned into the grid.
    pub fn fraction(&self) -> f32 {
        match self {
            IceCode::Ct18 => 0.18,
            IceCode::Ct81 => 0.80,
        }
    }
}

impl FromStr for IceCode {
    type Err = IceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IceCode::from_label(s)
    }
}

impl fmt::Display for IceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2})", self.label(), self.fraction())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels_map_to_fractions() {
        assert_eq!("CT18".parse::<IceCode>().unwrap().fraction(), 0.18);
        assert_eq!(IceCode::from_label("CT81 ").unwrap().fraction(), 0.80);
        for code in IceCode::ALL {
            assert_eq!(IceCode::from_label(code.label()).unwrap(), code);
        }
    }

    #[test]
    fn test_unknown_label_is_loud() {
        match IceCode::from_label("ct18") {
            Err(IceError::UnknownCategory(label)) => assert_eq!(label, "ct18"),
            other => panic!("expected UnknownCategory, got {other:?}"),
        }
    }
}
