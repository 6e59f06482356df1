//! Reduction of arbitrary Unicode text to the Latin-1 repertoire of the
//! built-in PDF faces.

/// Characters with a readable Latin-1 spelling, applied in order.
///
/// Replacements only ever contain ASCII, so a later entry can never match the
/// output of an earlier one.
const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2022}', "-"),
    ('\u{2191}', "Up"),
    ('\u{2193}', "Down"),
    ('\u{2190}', "Left"),
    ('\u{2192}', "Right"),
    ('\u{2014}', "--"),
    ('\u{2013}', "-"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201c}', "\""),
    ('\u{201d}', "\""),
    ('\u{2026}', "..."),
    ('\u{00a0}', " "),
    ('\u{200b}', ""),
    ('\u{2003}', " "),
    ('\u{2002}', " "),
    ('\u{2009}', " "),
    ('\u{200a}', " "),
    ('\u{2501}', "-"),
    ('\u{2502}', "|"),
    ('\u{250c}', "+"),
    ('\u{2510}', "+"),
    ('\u{2514}', "+"),
    ('\u{2518}', "+"),
    ('\u{251c}', "+"),
    ('\u{2524}', "+"),
    ('\u{252c}', "+"),
    ('\u{2534}', "+"),
    ('\u{253c}', "+"),
    ('\u{2500}', "-"),
];

/// Placeholder for characters that have no Latin-1 representation.
pub const PLACEHOLDER: char = '?';

/// Returns whether `c` can be encoded by the target text encoding.
pub fn is_representable(c: char) -> bool {
    u32::from(c) <= 0xff
}

/// Maps `text` onto the Latin-1 repertoire.
///
/// Known typographic characters are spelled out first; anything still outside
/// Latin-1 afterwards becomes [`PLACEHOLDER`]. The function is total and
/// idempotent.
pub fn sanitize(text: &str) -> String {
    let mut substituted = text.to_owned();
    for (from, to) in REPLACEMENTS {
        if substituted.contains(*from) {
            substituted = substituted.replace(*from, to);
        }
    }

    substituted
        .chars()
        .map(|c| if is_representable(c) { c } else { PLACEHOLDER })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn spells_out_typographic_characters() {
        assert_eq!(
            sanitize("\u{201c}Quoted\u{201d} \u{2014} it\u{2019}s \u{2192} next\u{2026}"),
            "\"Quoted\" -- it's Right next..."
        );
    }

    #[test]
    fn maps_box_drawing_to_ascii_frames() {
        assert_eq!(
            sanitize("\u{250c}\u{2500}\u{2510}\n\u{2502} \u{2502}\n\u{2514}\u{2501}\u{2518}"),
            "+-+\n| |\n+-+"
        );
    }

    #[test]
    fn removes_zero_width_and_normalises_spaces() {
        assert_eq!(sanitize("a\u{200b}b\u{00a0}c\u{2009}d"), "ab c d");
    }

    #[test]
    fn keeps_latin1_and_replaces_the_rest() {
        assert_eq!(sanitize("caf\u{e9} \u{4e2d}\u{1f600}"), "caf\u{e9} ??");
    }

    proptest! {
        #[test]
        fn output_is_always_representable(input in any::<String>()) {
            let output = sanitize(&input);
            prop_assert!(output.chars().all(is_representable));
        }

        #[test]
        fn sanitize_is_idempotent(input in any::<String>()) {
            let once = sanitize(&input);
            prop_assert_eq!(sanitize(&once), once);
        }
    }
}
