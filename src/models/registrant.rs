use serde::{Deserialize, Serialize};

/// The six schools invited to the Open House. Order matters: it is the
/// order the dropdown renders in.
pub const SCHOOLS: [&str; 6] = [
    "SMAN 4 Padang",
    "SMAN 14 Padang",
    "SMAS Adabiah 1 Padang",
    "SMAS Kartika 1-5 Padang",
    "SMAS Pertiwi 1 Padang",
    "SMKN 4 Padang",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "Laki-laki")]
    LakiLaki,
    #[serde(rename = "Perempuan")]
    Perempuan,
}

impl Gender {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Laki-laki" => Some(Self::LakiLaki),
            "Perempuan" => Some(Self::Perempuan),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::LakiLaki => "Laki-laki",
            Self::Perempuan => "Perempuan",
        }
    }
}

pub fn is_known_school(school: &str) -> bool {
    SCHOOLS.contains(&school)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_parses_wire_labels_only() {
        assert_eq!(Gender::parse("Laki-laki"), Some(Gender::LakiLaki));
        assert_eq!(Gender::parse("Perempuan"), Some(Gender::Perempuan));
        assert_eq!(Gender::parse("laki-laki"), None);
        assert_eq!(Gender::parse(""), None);
    }

    #[test]
    fn gender_label_round_trips() {
        for g in [Gender::LakiLaki, Gender::Perempuan] {
            assert_eq!(Gender::parse(g.label()), Some(g));
        }
    }

    #[test]
    fn school_list_is_closed() {
        assert!(is_known_school("SMAN 4 Padang"));
        assert!(is_known_school("SMAS Kartika 1-5 Padang"));
        assert!(!is_known_school("SMAN 1 Jakarta"));
        assert!(!is_known_school(""));
    }
}
