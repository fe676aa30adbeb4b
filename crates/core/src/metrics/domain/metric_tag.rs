use std::fmt;

/// Category a metric belongs to. Bands appear in the catalog in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricBand {
    Emotions,
    Expressions,
    Measurements,
    Qualities,
    Appearance,
}

impl MetricBand {
    pub const ALL: [MetricBand; 5] = [
        MetricBand::Emotions,
        MetricBand::Expressions,
        MetricBand::Measurements,
        MetricBand::Qualities,
        MetricBand::Appearance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricBand::Emotions => "emotions",
            MetricBand::Expressions => "expressions",
            MetricBand::Measurements => "measurements",
            MetricBand::Qualities => "qualities",
            MetricBand::Appearance => "appearance",
        }
    }
}

/// Whether a metric resolves to a number or to a label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    Numeric,
    Categorical,
}

/// Identifier of one named output of the metric catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricTag {
    // Emotions
    Anger,
    Contempt,
    Disgust,
    Fear,
    Joy,
    Sadness,
    Surprise,
    Engagement,
    Valence,

    // Expressions
    Attention,
    BrowFurrow,
    BrowRaise,
    CheekRaise,
    ChinRaise,
    Dimpler,
    EyeClosure,
    EyeWiden,
    InnerBrowRaise,
    JawDrop,
    LidTighten,
    LipDepressor,
    LipPress,
    LipPucker,
    LipStretch,
    LipSuck,
    MouthOpen,
    NoseWrinkle,
    Smile,
    Smirk,
    UpperLipRaise,

    // Measurements
    Yaw,
    Pitch,
    Roll,
    InterocularDistance,

    // Qualities
    Brightness,

    // Appearance
    Gender,
    Age,
    Ethnicity,
    Glasses,
}

impl MetricTag {
    /// The catalog, in display order. Band boundaries are declared separately
    /// in [`crate::metrics::domain::metric_catalog::BAND_SIZES`].
    pub const ALL: [MetricTag; 39] = [
        MetricTag::Anger,
        MetricTag::Contempt,
        MetricTag::Disgust,
        MetricTag::Fear,
        MetricTag::Joy,
        MetricTag::Sadness,
        MetricTag::Surprise,
        MetricTag::Engagement,
        MetricTag::Valence,
        MetricTag::Attention,
        MetricTag::BrowFurrow,
        MetricTag::BrowRaise,
        MetricTag::CheekRaise,
        MetricTag::ChinRaise,
        MetricTag::Dimpler,
        MetricTag::EyeClosure,
        MetricTag::EyeWiden,
        MetricTag::InnerBrowRaise,
        MetricTag::JawDrop,
        MetricTag::LidTighten,
        MetricTag::LipDepressor,
        MetricTag::LipPress,
        MetricTag::LipPucker,
        MetricTag::LipStretch,
        MetricTag::LipSuck,
        MetricTag::MouthOpen,
        MetricTag::NoseWrinkle,
        MetricTag::Smile,
        MetricTag::Smirk,
        MetricTag::UpperLipRaise,
        MetricTag::Yaw,
        MetricTag::Pitch,
        MetricTag::Roll,
        MetricTag::InterocularDistance,
        MetricTag::Brightness,
        MetricTag::Gender,
        MetricTag::Age,
        MetricTag::Ethnicity,
        MetricTag::Glasses,
    ];

    /// Stable snake_case identifier, used in configuration and output files.
    pub fn name(self) -> &'static str {
        match self {
            MetricTag::Anger => "anger",
            MetricTag::Contempt => "contempt",
            MetricTag::Disgust => "disgust",
            MetricTag::Fear => "fear",
            MetricTag::Joy => "joy",
            MetricTag::Sadness => "sadness",
            MetricTag::Surprise => "surprise",
            MetricTag::Engagement => "engagement",
            MetricTag::Valence => "valence",
            MetricTag::Attention => "attention",
            MetricTag::BrowFurrow => "brow_furrow",
            MetricTag::BrowRaise => "brow_raise",
            MetricTag::CheekRaise => "cheek_raise",
            MetricTag::ChinRaise => "chin_raise",
            MetricTag::Dimpler => "dimpler",
            MetricTag::EyeClosure => "eye_closure",
            MetricTag::EyeWiden => "eye_widen",
            MetricTag::InnerBrowRaise => "inner_brow_raise",
            MetricTag::JawDrop => "jaw_drop",
            MetricTag::LidTighten => "lid_tighten",
            MetricTag::LipDepressor => "lip_depressor",
            MetricTag::LipPress => "lip_press",
            MetricTag::LipPucker => "lip_pucker",
            MetricTag::LipStretch => "lip_stretch",
            MetricTag::LipSuck => "lip_suck",
            MetricTag::MouthOpen => "mouth_open",
            MetricTag::NoseWrinkle => "nose_wrinkle",
            MetricTag::Smile => "smile",
            MetricTag::Smirk => "smirk",
            MetricTag::UpperLipRaise => "upper_lip_raise",
            MetricTag::Yaw => "yaw",
            MetricTag::Pitch => "pitch",
            MetricTag::Roll => "roll",
            MetricTag::InterocularDistance => "interocular_distance",
            MetricTag::Brightness => "brightness",
            MetricTag::Gender => "gender",
            MetricTag::Age => "age",
            MetricTag::Ethnicity => "ethnicity",
            MetricTag::Glasses => "glasses",
        }
    }

    /// Upper-case label for metric panels, e.g. `"BROW FURROW"`.
    pub fn display_name(self) -> String {
        self.name().replace('_', " ").to_uppercase()
    }

    pub fn from_name(name: &str) -> Option<MetricTag> {
        let wanted = name.trim().to_lowercase().replace([' ', '-'], "_");
        MetricTag::ALL.into_iter().find(|t| t.name() == wanted)
    }

    /// Category this metric intrinsically belongs to. Declared per tag so a
    /// reordered catalog can be checked against the band table.
    pub fn band(self) -> MetricBand {
        use MetricTag::*;
        match self {
            Anger | Contempt | Disgust | Fear | Joy | Sadness | Surprise | Engagement
            | Valence => MetricBand::Emotions,
            Attention | BrowFurrow | BrowRaise | CheekRaise | ChinRaise | Dimpler
            | EyeClosure | EyeWiden | InnerBrowRaise | JawDrop | LidTighten | LipDepressor
            | LipPress | LipPucker | LipStretch | LipSuck | MouthOpen | NoseWrinkle | Smile
            | Smirk | UpperLipRaise => MetricBand::Expressions,
            Yaw | Pitch | Roll | InterocularDistance => MetricBand::Measurements,
            Brightness => MetricBand::Qualities,
            Gender | Age | Ethnicity | Glasses => MetricBand::Appearance,
        }
    }

    pub fn kind(self) -> MetricKind {
        match self.band() {
            MetricBand::Appearance => MetricKind::Categorical,
            _ => MetricKind::Numeric,
        }
    }
}

impl fmt::Display for MetricTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
