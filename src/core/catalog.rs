//! Region name normalization.
//!
//! The nation listing shows county labels such as `Stockholms län`, while a
//! region's listing page lives under a lowercase token (`stockholm`). One
//! label does not follow the pattern and is mapped explicitly.

use crate::domain::model::RegionId;

const WEST_GOTALAND_LABEL: &str = "V Götalands län";
const WEST_GOTALAND_TOKEN: &str = "västragötaland";

/// Maps a displayed region label to its URL token.
///
/// Takes the first space-delimited word, lowercases it, and drops a single
/// trailing `s` (the genitive in `Stockholms län`) unless that would leave
/// nothing. Applying it to its own output returns the same token for every
/// label the map publishes. Listing rows with a blank name are rejected by
/// the table reader, so the token is never empty.
pub fn normalize(display_name: &str) -> RegionId {
    let display_name = display_name.trim();
    if display_name == WEST_GOTALAND_LABEL {
        return RegionId::from_normalized(WEST_GOTALAND_TOKEN.to_string());
    }

    let first_word = display_name.split(' ').next().unwrap_or_default();
    let lowered = first_word.to_lowercase();
    let token = match lowered.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => lowered,
    };

    RegionId::from_normalized(token)
}
