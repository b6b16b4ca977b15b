use serde::Serialize;
use std::fmt;

/// Seven ordered descriptive bands over [0, 100]. Each band includes its
/// upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureBand {
    RecordCold,
    VeryCold,
    SomewhatCold,
    NearNormal,
    SomewhatWarm,
    VeryWarm,
    RecordHeat,
}

impl TemperatureBand {
    pub const ALL: [TemperatureBand; 7] = [
        TemperatureBand::RecordCold,
        TemperatureBand::VeryCold,
        TemperatureBand::SomewhatCold,
        TemperatureBand::NearNormal,
        TemperatureBand::SomewhatWarm,
        TemperatureBand::VeryWarm,
        TemperatureBand::RecordHeat,
    ];

    /// A NaN percentile compares false against every bound and lands in the
    /// top band.
    pub fn from_percentile(percentile: f64) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|band| band.upper_bound().map_or(false, |bound| percentile <= bound))
            .unwrap_or(TemperatureBand::RecordHeat)
    }

    pub fn upper_bound(&self) -> Option<f64> {
        match self {
            TemperatureBand::RecordCold => Some(5.0),
            TemperatureBand::VeryCold => Some(15.0),
            TemperatureBand::SomewhatCold => Some(30.0),
            TemperatureBand::NearNormal => Some(70.0),
            TemperatureBand::SomewhatWarm => Some(85.0),
            TemperatureBand::VeryWarm => Some(95.0),
            TemperatureBand::RecordHeat => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TemperatureBand::RecordCold => "Record cold",
            TemperatureBand::VeryCold => "Very cold",
            TemperatureBand::SomewhatCold => "Somewhat cold",
            TemperatureBand::NearNormal => "Near normal",
            TemperatureBand::SomewhatWarm => "Somewhat warm",
            TemperatureBand::VeryWarm => "Very warm",
            TemperatureBand::RecordHeat => "Record heat",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            TemperatureBand::RecordCold => "blue",
            TemperatureBand::VeryCold => "lightblue",
            TemperatureBand::SomewhatCold => "cyan",
            TemperatureBand::NearNormal => "gray",
            TemperatureBand::SomewhatWarm => "orange",
            TemperatureBand::VeryWarm => "orangered",
            TemperatureBand::RecordHeat => "red",
        }
    }
}

impl fmt::Display for TemperatureBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
