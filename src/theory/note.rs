//! Pitch-class names and MIDI pitch helpers.

/// Pitch-class names, spelled with flats.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Pitch classes drawn as black keys on a piano.
pub const BLACK_KEYS: [u8; 5] = [1, 3, 6, 8, 10];

/// Parse a pitch-class name (`"C"`, `"Eb"`, `"F#"`, case-insensitive) into 0-11.
pub fn pitch_class(name: &str) -> Option<u8> {
    let name = name.trim();
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let natural: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let accidental: i32 = match chars.as_str() {
        "" => 0,
        "b" | "B" => -1,
        "#" | "s" | "S" => 1,
        _ => return None,
    };
    Some((natural + accidental).rem_euclid(12) as u8)
}

/// MIDI number of `pitch_class` in `octave`, where octave 4 holds middle C (60).
pub fn midi_of(pitch_class: u8, octave: i32) -> i32 {
    pitch_class as i32 + (octave + 1) * 12
}

/// Name of the pitch class of a MIDI number.
pub fn pitch_class_name(midi: i32) -> &'static str {
    NOTE_NAMES[midi.rem_euclid(12) as usize]
}

/// Scientific-pitch label, e.g. 60 → `"C4"`.
pub fn note_label(midi: i32) -> String {
    format!("{}{}", pitch_class_name(midi), midi.div_euclid(12) - 1)
}

/// Whether a MIDI number falls on a black key.
pub fn is_black_key(midi: i32) -> bool {
    BLACK_KEYS.contains(&(midi.rem_euclid(12) as u8))
}

/// Clamp an integer pitch into the 7-bit MIDI range.
pub fn to_midi_byte(midi: i32) -> u8 {
    midi.clamp(0, 127) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flats_and_sharps_parse() {
        assert_eq!(pitch_class("C"), Some(0));
        assert_eq!(pitch_class("Eb"), Some(3));
        assert_eq!(pitch_class("D#"), Some(3));
        assert_eq!(pitch_class("a"), Some(9));
        assert_eq!(pitch_class("Cb"), Some(11));
        assert_eq!(pitch_class("B#"), Some(0));
    }

    #[test]
    fn garbage_does_not_parse() {
        assert_eq!(pitch_class(""), None);
        assert_eq!(pitch_class("H"), None);
        assert_eq!(pitch_class("Cx#"), None);
    }

    #[test]
    fn octave_four_is_middle_c() {
        assert_eq!(midi_of(0, 4), 60);
        assert_eq!(midi_of(9, 3), 57);
        assert_eq!(midi_of(0, -1), 0);
    }

    #[test]
    fn labels() {
        assert_eq!(note_label(60), "C4");
        assert_eq!(note_label(69), "A4");
        assert_eq!(note_label(61), "Db4");
        assert_eq!(note_label(0), "C-1");
    }

    #[test]
    fn black_keys() {
        assert!(is_black_key(61));
        assert!(!is_black_key(60));
        assert!(is_black_key(70));
    }

    #[test]
    fn midi_byte_clamps() {
        assert_eq!(to_midi_byte(-5), 0);
        assert_eq!(to_midi_byte(200), 127);
        assert_eq!(to_midi_byte(64), 64);
    }
}
