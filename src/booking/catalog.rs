//! Fixed vocabularies for vehicle and material matching

/// Spoken forms (lowercase) mapped to the canonical vehicle label.
///
/// Includes common mishearings from the transcription provider.
pub const VEHICLE_CATALOG: &[(&str, &str)] = &[
    ("tata ace", "Tata Ace"),
    ("tata ac", "Tata Ace"),
    ("chota hathi", "Tata Ace"),
    ("chhota hathi", "Tata Ace"),
    ("bada dost", "Bada Dost"),
    ("dost", "Dost"),
    ("bolero", "Bolero Pickup"),
    ("bolero pickup", "Bolero Pickup"),
    ("tata 407", "Tata 407"),
    ("407", "Tata 407"),
    ("eicher", "Eicher"),
    ("multi axle", "32 Feet Multi-Axle"),
    ("multiaxle", "32 Feet Multi-Axle"),
    ("trailer", "Trailer"),
    ("low bed", "Low-Bed Trailer"),
    ("semi bed", "Semi-Bed Trailer"),
    ("high bed", "High-Bed Trailer"),
    ("six wheel", "6 Wheel"),
    ("6 wheel", "6 Wheel"),
    ("ten wheel", "10 Wheel"),
    ("10 wheel", "10 Wheel"),
    ("twelve wheel", "12 Wheel"),
    ("12 wheel", "12 Wheel"),
    ("fourteen wheel", "14 Wheel"),
    ("14 wheel", "14 Wheel"),
    ("sixteen wheel", "16 Wheel"),
    ("16 wheel", "16 Wheel"),
    ("car carrier", "Car Carrier"),
    ("part load", "Part Load"),
];

/// Label used when the caller only says "truck"
pub const GENERIC_VEHICLE: &str = "Truck";

/// Material keywords (lowercase) and their stored label, in match priority
pub const GOODS_KEYWORDS: &[(&str, &str)] = &[
    ("steel", "Steel"),
    ("cement", "Cement"),
    ("fmcg", "FMCG"),
    ("machinery", "Machinery"),
    ("iron", "Iron"),
    ("sand", "Sand"),
    ("bricks", "Bricks"),
    ("furniture", "Furniture"),
    ("electronics", "Electronics"),
    ("food grains", "Food Grains"),
    ("grains", "Grains"),
    ("rice", "Rice"),
    ("vegetables", "Vegetables"),
    ("fruits", "Fruits"),
    ("chemicals", "Chemicals"),
    ("textiles", "Textiles"),
    ("paper", "Paper"),
    ("plastic", "Plastic"),
    ("coal", "Coal"),
    ("timber", "Timber"),
    ("household goods", "Household Goods"),
    ("household", "Household Goods"),
];

/// Body types in the order they are checked
pub const BODY_TYPES: &[(&str, &str)] = &[("open", "Open"), ("container", "Container")];

pub fn canonical_vehicle(key: &str) -> Option<&'static str> {
    VEHICLE_CATALOG
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_keys_are_lowercase_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for (alias, _) in VEHICLE_CATALOG {
            assert_eq!(*alias, alias.to_lowercase());
            assert!(seen.insert(*alias), "duplicate alias {}", alias);
        }
    }

    #[test]
    fn test_mishearing_maps_to_canonical() {
        assert_eq!(canonical_vehicle("tata ac"), Some("Tata Ace"));
        assert_eq!(canonical_vehicle("lorry"), None);
    }
}
