use serde::{Deserialize, Serialize};

/// Emotion scores, each bounded by the engine (typically 0-100; valence
/// spans -100..100).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Emotions {
    pub anger: f32,
    pub contempt: f32,
    pub disgust: f32,
    pub fear: f32,
    pub joy: f32,
    pub sadness: f32,
    pub surprise: f32,
    pub engagement: f32,
    pub valence: f32,
}

/// Facial action scores.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Expressions {
    pub attention: f32,
    pub brow_furrow: f32,
    pub brow_raise: f32,
    pub cheek_raise: f32,
    pub chin_raise: f32,
    pub dimpler: f32,
    pub eye_closure: f32,
    pub eye_widen: f32,
    pub inner_brow_raise: f32,
    pub jaw_drop: f32,
    pub lid_tighten: f32,
    pub lip_depressor: f32,
    pub lip_press: f32,
    pub lip_pucker: f32,
    pub lip_stretch: f32,
    pub lip_suck: f32,
    pub mouth_open: f32,
    pub nose_wrinkle: f32,
    pub smile: f32,
    pub smirk: f32,
    pub upper_lip_raise: f32,
}

/// Head orientation in degrees.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Measurements {
    pub orientation: Orientation,
    pub interocular_distance: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Qualities {
    pub brightness: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Unknown,
    Female,
    Male,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeBracket {
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "under_18")]
    Under18,
    #[serde(rename = "18_24")]
    From18To24,
    #[serde(rename = "25_34")]
    From25To34,
    #[serde(rename = "35_44")]
    From35To44,
    #[serde(rename = "45_54")]
    From45To54,
    #[serde(rename = "55_64")]
    From55To64,
    #[serde(rename = "65_plus")]
    Over64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ethnicity {
    #[default]
    Unknown,
    Caucasian,
    BlackAfrican,
    EastAsian,
    SouthAsian,
    Hispanic,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Glasses {
    #[default]
    Unknown,
    Yes,
    No,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Appearance {
    pub gender: Gender,
    pub age: AgeBracket,
    pub ethnicity: Ethnicity,
    pub glasses: Glasses,
}

/// Everything the engine reports about one detected face.
///
/// Fields missing from a recording deserialize to their defaults (zero
/// scores, unknown appearance).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Face {
    pub emotions: Emotions,
    pub expressions: Expressions,
    pub measurements: Measurements,
    pub qualities: Qualities,
    pub appearance: Appearance,
    /// Facial landmark points in frame pixel coordinates.
    pub points: Vec<(f32, f32)>,
}
