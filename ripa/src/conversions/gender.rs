/// Normalized perceived gender identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenderIdentity {
    pub perceived_gender: String,
    pub perceived_transgender: bool,
    pub perceived_lgbtqia: bool,
}

/// Gender code of the legacy `gend` column meaning gender nonconforming.
pub const NONCONFORMING_GENDER_CODE: &str = "5";

/// Maps a perceived gender onto the three recognized categories (Male, Female, Non-Binary).
///
/// Any value other than exactly `Male` or `Female` marks the person as lgbtqia. Informal terms
/// containing "boy" or "girl" are rewritten to `Male` or `Female`, and an empty value becomes
/// `Non-Binary` when the person was perceived as gender nonconforming.
pub fn normalize_gender_identity(
    perceived_gender: &str,
    nonconforming: bool,
    lgbtqia: bool,
) -> GenderIdentity {
    let lowered = perceived_gender.to_lowercase();
    let transgender = lowered.contains("trans");

    let mut gender = perceived_gender.to_string();
    let mut lgbtqia = lgbtqia;

    if gender != "Male" && gender != "Female" {
        lgbtqia = true;

        if lowered.contains("boy") {
            gender = "Male".to_string();
        } else if lowered.contains("girl") {
            gender = "Female".to_string();
        }

        if gender.is_empty() && nonconforming {
            gender = "Non-Binary".to_string();
        }
    }

    GenderIdentity {
        perceived_gender: gender,
        perceived_transgender: transgender,
        perceived_lgbtqia: lgbtqia,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transboy_is_male_and_transgender() {
        assert_eq!(
            normalize_gender_identity("Transboy", false, false),
            GenderIdentity {
                perceived_gender: "Male".to_string(),
                perceived_transgender: true,
                perceived_lgbtqia: true,
            }
        );
    }

    #[test]
    fn binary_genders_are_unchanged() {
        for gender in ["Male", "Female"] {
            assert_eq!(
                normalize_gender_identity(gender, false, false),
                GenderIdentity {
                    perceived_gender: gender.to_string(),
                    perceived_transgender: false,
                    perceived_lgbtqia: false,
                }
            );
        }

        assert!(normalize_gender_identity("Female", false, true).perceived_lgbtqia);
    }

    #[test]
    fn transgirl_is_female() {
        let identity = normalize_gender_identity("transgirl", false, false);

        assert_eq!(identity.perceived_gender, "Female");
        assert!(identity.perceived_transgender);
        assert!(identity.perceived_lgbtqia);
    }

    #[test]
    fn empty_gender_is_non_binary_only_when_nonconforming() {
        assert_eq!(
            normalize_gender_identity("", true, false).perceived_gender,
            "Non-Binary"
        );
        assert_eq!(normalize_gender_identity("", false, false).perceived_gender, "");
    }

    #[test]
    fn unrecognized_values_are_kept_and_flagged() {
        let identity = normalize_gender_identity("Nonconforming", true, false);

        assert_eq!(identity.perceived_gender, "Nonconforming");
        assert!(!identity.perceived_transgender);
        assert!(identity.perceived_lgbtqia);
    }
}
