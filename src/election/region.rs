use crate::error::LoadError;

/// Two-digit province prefix of a federal electoral district number → postal abbreviation.
const PROVINCES: [(&str, &str); 13] = [
    ("59", "BC"),
    ("48", "AB"),
    ("47", "SK"),
    ("46", "MB"),
    ("35", "ON"),
    ("24", "QC"),
    ("13", "NB"),
    ("12", "NS"),
    ("11", "PE"),
    ("10", "NL"),
    ("60", "YT"),
    ("61", "NU"),
    ("62", "NT"),
];

/// Province or territory of an electoral district, e.g. `"59001"` → `"BC"`.
pub fn province_for_district(district: &str) -> Result<&'static str, LoadError> {
    district
        .get(..2)
        .and_then(|prefix| {
            PROVINCES
                .iter()
                .find(|(code, _)| *code == prefix)
                .map(|(_, abbrev)| *abbrev)
        })
        .ok_or_else(|| LoadError::UnknownProvince {
            district: district.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_prefixes() {
        assert_eq!(province_for_district("59001").unwrap(), "BC");
        assert_eq!(province_for_district("35001").unwrap(), "ON");
        assert_eq!(province_for_district("24077").unwrap(), "QC");
        assert_eq!(province_for_district("62001").unwrap(), "NT");
    }

    #[test]
    fn test_every_prefix_maps() {
        for (code, abbrev) in PROVINCES {
            let district = format!("{}001", code);
            assert_eq!(province_for_district(&district).unwrap(), abbrev);
        }
    }

    #[test]
    fn test_unknown_prefix_fails() {
        for district in ["99001", "5", "", "É9001", "ON001"] {
            match province_for_district(district) {
                Err(LoadError::UnknownProvince { district: d }) => assert_eq!(d, district),
                other => panic!("expected UnknownProvince for {:?}, got {:?}", district, other),
            }
        }
    }
}
