//! Per-row effect codes.

/// Effect column command, decoded from 3 bits of a note row.
///
/// Codes 6 and 7 are reserved; they decode to explicit variants so the
/// engine can treat them as no-ops rather than fall through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Effect {
    #[default]
    None,
    /// Linear pitch glide from the previous note to this one
    Slide,
    /// ±0.25 semitone pitch wobble at 15 Hz
    Vibrato,
    /// Pitch decays to zero over the note
    Drop,
    FadeIn,
    FadeOut,
    Reserved6,
    Reserved7,
}

impl Effect {
    /// Decode a 3-bit effect code. Only the low 3 bits are considered.
    pub const fn from_code(code: u8) -> Self {
        match code & 0x07 {
            0 => Effect::None,
            1 => Effect::Slide,
            2 => Effect::Vibrato,
            3 => Effect::Drop,
            4 => Effect::FadeIn,
            5 => Effect::FadeOut,
            6 => Effect::Reserved6,
            _ => Effect::Reserved7,
        }
    }

    /// The 3-bit code this effect is stored as.
    pub const fn code(self) -> u8 {
        match self {
            Effect::None => 0,
            Effect::Slide => 1,
            Effect::Vibrato => 2,
            Effect::Drop => 3,
            Effect::FadeIn => 4,
            Effect::FadeOut => 5,
            Effect::Reserved6 => 6,
            Effect::Reserved7 => 7,
        }
    }

    /// Returns the variant name as a static string.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::None => "None",
            Effect::Slide => "Slide",
            Effect::Vibrato => "Vibrato",
            Effect::Drop => "Drop",
            Effect::FadeIn => "FadeIn",
            Effect::FadeOut => "FadeOut",
            Effect::Reserved6 => "Reserved6",
            Effect::Reserved7 => "Reserved7",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_maps_back_to_itself() {
        for code in 0..8 {
            assert_eq!(Effect::from_code(code).code(), code);
        }
    }

    #[test]
    fn high_bits_are_ignored() {
        assert_eq!(Effect::from_code(0b1111_1001), Effect::Slide);
    }
}
