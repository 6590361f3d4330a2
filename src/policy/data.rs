//! Policy and claim records with their fixed categorical vocabularies

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize, Serializer};

/// A categorical field with a closed, fixed vocabulary
pub trait Categorical: Copy + Sized + 'static {
    /// Column name used in diagnostics
    const FIELD: &'static str;

    /// Every level, in vocabulary order
    const LEVELS: &'static [Self];

    /// Label as it appears in the dataset
    fn as_str(&self) -> &'static str;

    /// Parse a label, rejecting anything outside the vocabulary
    fn parse_level(value: &str) -> Result<Self> {
        let value = value.trim();
        Self::LEVELS
            .iter()
            .copied()
            .find(|level| level.as_str() == value)
            .ok_or_else(|| DataError::UnknownLevel {
                field: Self::FIELD,
                value: value.to_string(),
            })
    }
}

macro_rules! serialize_as_label {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.as_str())
                }
            }
        )*
    };
}

/// Fiscal power band of the vehicle (ordered d..o)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Power {
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
}

impl Categorical for Power {
    const FIELD: &'static str = "power";
    const LEVELS: &'static [Self] = &[
        Power::D,
        Power::E,
        Power::F,
        Power::G,
        Power::H,
        Power::I,
        Power::J,
        Power::K,
        Power::L,
        Power::M,
        Power::N,
        Power::O,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Power::D => "d",
            Power::E => "e",
            Power::F => "f",
            Power::G => "g",
            Power::H => "h",
            Power::I => "i",
            Power::J => "j",
            Power::K => "k",
            Power::L => "l",
            Power::M => "m",
            Power::N => "n",
            Power::O => "o",
        }
    }
}

/// Vehicle brand group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Brand {
    Fiat,
    JapaneseOrKorean,
    MercedesChryslerBmw,
    OpelGmFord,
    Other,
    RenaultNissanCitroen,
    VolkswagenAudiSkodaSeat,
}

impl Categorical for Brand {
    const FIELD: &'static str = "brand";
    const LEVELS: &'static [Self] = &[
        Brand::Fiat,
        Brand::JapaneseOrKorean,
        Brand::MercedesChryslerBmw,
        Brand::OpelGmFord,
        Brand::Other,
        Brand::RenaultNissanCitroen,
        Brand::VolkswagenAudiSkodaSeat,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Brand::Fiat => "Fiat",
            Brand::JapaneseOrKorean => "Japanese (except Nissan) or Korean",
            Brand::MercedesChryslerBmw => "Mercedes, Chrysler or BMW",
            Brand::OpelGmFord => "Opel, General Motors or Ford",
            Brand::Other => "other",
            Brand::RenaultNissanCitroen => "Renault, Nissan or Citroen",
            Brand::VolkswagenAudiSkodaSeat => "Volkswagen, Audi, Skoda or Seat",
        }
    }
}

/// Fuel type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Fuel {
    Diesel,
    Regular,
}

impl Categorical for Fuel {
    const FIELD: &'static str = "fuel";
    const LEVELS: &'static [Self] = &[Fuel::Diesel, Fuel::Regular];

    fn as_str(&self) -> &'static str {
        match self {
            Fuel::Diesel => "Diesel",
            Fuel::Regular => "Regular",
        }
    }
}

/// Administrative region code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    R11,
    R23,
    R24,
    R25,
    R31,
    R52,
    R53,
    R54,
    R72,
    R74,
}

impl Categorical for Region {
    const FIELD: &'static str = "region";
    const LEVELS: &'static [Self] = &[
        Region::R11,
        Region::R23,
        Region::R24,
        Region::R25,
        Region::R31,
        Region::R52,
        Region::R53,
        Region::R54,
        Region::R72,
        Region::R74,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Region::R11 => "R11",
            Region::R23 => "R23",
            Region::R24 => "R24",
            Region::R25 => "R25",
            Region::R31 => "R31",
            Region::R52 => "R52",
            Region::R53 => "R53",
            Region::R54 => "R54",
            Region::R72 => "R72",
            Region::R74 => "R74",
        }
    }
}

serialize_as_label!(Power, Brand, Fuel, Region);

/// A categorical column of the policy table, addressed by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    Power,
    Brand,
    Fuel,
    Region,
}

impl CategoricalField {
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalField::Power => Power::FIELD,
            CategoricalField::Brand => Brand::FIELD,
            CategoricalField::Fuel => Fuel::FIELD,
            CategoricalField::Region => Region::FIELD,
        }
    }

    /// Labels of the field's vocabulary
    pub fn levels(&self) -> Vec<&'static str> {
        fn labels<C: Categorical>() -> Vec<&'static str> {
            C::LEVELS.iter().map(|level| level.as_str()).collect()
        }

        match self {
            CategoricalField::Power => labels::<Power>(),
            CategoricalField::Brand => labels::<Brand>(),
            CategoricalField::Fuel => labels::<Fuel>(),
            CategoricalField::Region => labels::<Region>(),
        }
    }

    /// Label of this field for a given policy
    pub fn level(&self, policy: &PolicyRecord) -> &'static str {
        match self {
            CategoricalField::Power => policy.power.as_str(),
            CategoricalField::Brand => policy.brand.as_str(),
            CategoricalField::Fuel => policy.fuel.as_str(),
            CategoricalField::Region => policy.region.as_str(),
        }
    }
}

/// A continuous column of the policy table, addressed by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Exposure,
    CarAge,
    DriverAge,
    Density,
}

impl NumericField {
    pub fn name(&self) -> &'static str {
        match self {
            NumericField::Exposure => "exposure",
            NumericField::CarAge => "car_age",
            NumericField::DriverAge => "driver_age",
            NumericField::Density => "density",
        }
    }

    pub fn value(&self, policy: &PolicyRecord) -> f64 {
        match self {
            NumericField::Exposure => policy.exposure,
            NumericField::CarAge => policy.car_age,
            NumericField::DriverAge => policy.driver_age,
            NumericField::Density => policy.density,
        }
    }
}

/// A single policy from the raw policy table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyRecord {
    /// Unique policy identifier
    pub policy_id: u32,

    /// Number of claims recorded on the policy itself
    pub claim_count: u32,

    /// Policy-years in force
    pub exposure: f64,

    pub power: Power,

    /// Vehicle age in years
    pub car_age: f64,

    /// Driver age in years
    pub driver_age: f64,

    pub brand: Brand,

    pub fuel: Fuel,

    pub region: Region,

    /// Population density of the driver's municipality
    pub density: f64,
}

/// A single claim event from the raw claims table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClaimEvent {
    /// Policy the claim was filed against
    pub policy_id: u32,

    /// Claim amount
    pub claim_amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!(Power::parse_level("i").unwrap(), Power::I);
        assert_eq!(Region::parse_level(" R25 ").unwrap(), Region::R25);
        assert_eq!(
            Brand::parse_level("Mercedes, Chrysler or BMW").unwrap(),
            Brand::MercedesChryslerBmw
        );
        assert_eq!(Fuel::parse_level("Diesel").unwrap(), Fuel::Diesel);
    }

    #[test]
    fn test_unknown_level_names_field() {
        match Power::parse_level("z") {
            Err(DataError::UnknownLevel { field, value }) => {
                assert_eq!(field, "power");
                assert_eq!(value, "z");
            }
            other => panic!("expected UnknownLevel, got {:?}", other),
        }
    }

    #[test]
    fn test_vocabularies_round_trip_labels() {
        assert_eq!(CategoricalField::Power.levels().len(), 12);
        assert_eq!(CategoricalField::Region.levels().len(), 10);
        assert_eq!(CategoricalField::Brand.levels().len(), 7);
        for label in CategoricalField::Brand.levels() {
            assert_eq!(Brand::parse_level(label).unwrap().as_str(), label);
        }
    }
}
