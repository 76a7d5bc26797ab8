use crate::error::EtlResult;

use super::numeric::truncate_to_integer_text;

/// The six source columns an address description is composed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFragments<'a> {
    pub intersection: &'a str,
    pub land_mark: &'a str,
    pub school_name: &'a str,
    /// Street number, often exported as a float (`"400.0"`).
    pub address_block: &'a str,
    pub address_street: &'a str,
    pub highway_exit: &'a str,
}

/// Renders an address block as a plain integer string.
///
/// An empty block stays empty.
pub fn normalize_address_block(block: &str) -> EtlResult<String> {
    if block.trim().is_empty() {
        return Ok(String::new());
    }

    truncate_to_integer_text("address_block", block)
}

/// Composes a human readable location from its fragments.
///
/// A landmark and a street address fold into `"<landmark> on <address>"`. When an intersection
/// is known it always frames the rest: `"The intersection of <intersection> and <rest>"`.
/// Returns an empty string only when every fragment is empty.
pub fn compose_address(fragments: &AddressFragments<'_>) -> EtlResult<String> {
    let block = normalize_address_block(fragments.address_block)?;

    let mut landmark = join_non_empty(&[fragments.land_mark, fragments.school_name]);
    let mut address = join_non_empty(&[&block, fragments.address_street]);

    if !landmark.is_empty() && !address.is_empty() {
        address = format!("{landmark} on {address}");
        landmark.clear();
    }

    let descriptor = join_non_empty(&[&landmark, &address, fragments.highway_exit]);
    let intersection = fragments.intersection.trim();

    let composed = match (intersection.is_empty(), descriptor.is_empty()) {
        (false, true) => intersection.to_string(),
        (false, false) => format!("The intersection of {intersection} and {descriptor}"),
        (true, _) => descriptor,
    };

    Ok(composed)
}

fn join_non_empty(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_frames_the_street_address() {
        let fragments = AddressFragments {
            intersection: "5th & Main",
            address_block: "400.0",
            address_street: "Elm St",
            ..Default::default()
        };

        assert_eq!(
            compose_address(&fragments).unwrap(),
            "The intersection of 5th & Main and 400 Elm St"
        );
    }

    #[test]
    fn street_address_alone_drops_the_fraction() {
        let fragments = AddressFragments {
            address_block: "12.0",
            address_street: "Oak Ave",
            ..Default::default()
        };

        assert_eq!(compose_address(&fragments).unwrap(), "12 Oak Ave");
    }

    #[test]
    fn no_fragments_compose_to_empty_text() {
        assert_eq!(compose_address(&AddressFragments::default()).unwrap(), "");

        let blanks = AddressFragments {
            intersection: " ",
            land_mark: "",
            school_name: "  ",
            address_block: "",
            address_street: "",
            highway_exit: "",
        };
        assert_eq!(compose_address(&blanks).unwrap(), "");
    }

    #[test]
    fn landmark_folds_into_the_address_once() {
        let fragments = AddressFragments {
            land_mark: "Balboa Park",
            school_name: "Roosevelt Middle",
            address_block: "1500.0",
            address_street: "Park Blvd",
            highway_exit: "SR-163 exit 1B",
            ..Default::default()
        };

        assert_eq!(
            compose_address(&fragments).unwrap(),
            "Balboa Park Roosevelt Middle on 1500 Park Blvd SR-163 exit 1B"
        );
    }

    #[test]
    fn intersection_alone_is_returned_as_is() {
        let fragments = AddressFragments {
            intersection: "Broadway / 5th Ave",
            ..Default::default()
        };

        assert_eq!(compose_address(&fragments).unwrap(), "Broadway / 5th Ave");
    }

    #[test]
    fn landmark_without_address_is_kept() {
        let fragments = AddressFragments {
            intersection: "I-5",
            land_mark: "Old Town Transit Center",
            ..Default::default()
        };

        assert_eq!(
            compose_address(&fragments).unwrap(),
            "The intersection of I-5 and Old Town Transit Center"
        );
    }

    #[test]
    fn any_fragment_yields_a_non_empty_description() {
        let values = ["x", "", "", "", "", ""];
        for shift in 0..values.len() {
            let mut rotated = values;
            rotated.rotate_right(shift);
            let [intersection, land_mark, school_name, address_block, address_street, highway_exit] =
                rotated;
            let fragments = AddressFragments {
                intersection,
                land_mark,
                school_name,
                address_block: if address_block.is_empty() { "" } else { "7" },
                address_street,
                highway_exit,
            };

            assert!(!compose_address(&fragments).unwrap().is_empty());
        }
    }

    #[test]
    fn unparsable_block_is_a_conversion_error() {
        let fragments = AddressFragments {
            address_block: "four hundred",
            address_street: "Elm St",
            ..Default::default()
        };

        let err = compose_address(&fragments).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ConversionError);
    }
}
