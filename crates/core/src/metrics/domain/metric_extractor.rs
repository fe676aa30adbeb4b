use crate::metrics::domain::metric_catalog::{CatalogError, MetricCatalog};
use crate::metrics::domain::metric_tag::MetricTag;
use crate::metrics::domain::metric_value::MetricValue;
use crate::shared::detection_result::DetectionResult;
use crate::shared::face::{AgeBracket, Ethnicity, Face, Gender, Glasses};

/// Reads one metric from a face.
#[derive(Clone, Copy)]
pub enum Accessor {
    Score(fn(&Face) -> f32),
    Label(fn(&Face) -> &'static str),
}

impl Accessor {
    fn read(&self, face: &Face) -> MetricValue {
        match self {
            Accessor::Score(get) => MetricValue::Score(get(face)),
            Accessor::Label(get) => MetricValue::Label(get(face)),
        }
    }
}

/// Tag → accessor table. Must cover every tag of the catalog exactly once.
pub static ACCESSORS: &[(MetricTag, Accessor)] = &[
    (MetricTag::Anger, Accessor::Score(|f| f.emotions.anger)),
    (MetricTag::Contempt, Accessor::Score(|f| f.emotions.contempt)),
    (MetricTag::Disgust, Accessor::Score(|f| f.emotions.disgust)),
    (MetricTag::Fear, Accessor::Score(|f| f.emotions.fear)),
    (MetricTag::Joy, Accessor::Score(|f| f.emotions.joy)),
    (MetricTag::Sadness, Accessor::Score(|f| f.emotions.sadness)),
    (MetricTag::Surprise, Accessor::Score(|f| f.emotions.surprise)),
    (MetricTag::Engagement, Accessor::Score(|f| f.emotions.engagement)),
    (MetricTag::Valence, Accessor::Score(|f| f.emotions.valence)),
    (MetricTag::Attention, Accessor::Score(|f| f.expressions.attention)),
    (MetricTag::BrowFurrow, Accessor::Score(|f| f.expressions.brow_furrow)),
    (MetricTag::BrowRaise, Accessor::Score(|f| f.expressions.brow_raise)),
    (MetricTag::CheekRaise, Accessor::Score(|f| f.expressions.cheek_raise)),
    (MetricTag::ChinRaise, Accessor::Score(|f| f.expressions.chin_raise)),
    (MetricTag::Dimpler, Accessor::Score(|f| f.expressions.dimpler)),
    (MetricTag::EyeClosure, Accessor::Score(|f| f.expressions.eye_closure)),
    (MetricTag::EyeWiden, Accessor::Score(|f| f.expressions.eye_widen)),
    (MetricTag::InnerBrowRaise, Accessor::Score(|f| f.expressions.inner_brow_raise)),
    (MetricTag::JawDrop, Accessor::Score(|f| f.expressions.jaw_drop)),
    (MetricTag::LidTighten, Accessor::Score(|f| f.expressions.lid_tighten)),
    (MetricTag::LipDepressor, Accessor::Score(|f| f.expressions.lip_depressor)),
    (MetricTag::LipPress, Accessor::Score(|f| f.expressions.lip_press)),
    (MetricTag::LipPucker, Accessor::Score(|f| f.expressions.lip_pucker)),
    (MetricTag::LipStretch, Accessor::Score(|f| f.expressions.lip_stretch)),
    (MetricTag::LipSuck, Accessor::Score(|f| f.expressions.lip_suck)),
    (MetricTag::MouthOpen, Accessor::Score(|f| f.expressions.mouth_open)),
    (MetricTag::NoseWrinkle, Accessor::Score(|f| f.expressions.nose_wrinkle)),
    (MetricTag::Smile, Accessor::Score(|f| f.expressions.smile)),
    (MetricTag::Smirk, Accessor::Score(|f| f.expressions.smirk)),
    (MetricTag::UpperLipRaise, Accessor::Score(|f| f.expressions.upper_lip_raise)),
    (MetricTag::Yaw, Accessor::Score(|f| f.measurements.orientation.yaw)),
    (MetricTag::Pitch, Accessor::Score(|f| f.measurements.orientation.pitch)),
    (MetricTag::Roll, Accessor::Score(|f| f.measurements.orientation.roll)),
    (MetricTag::InterocularDistance, Accessor::Score(|f| f.measurements.interocular_distance)),
    (MetricTag::Brightness, Accessor::Score(|f| f.qualities.brightness)),
    (MetricTag::Gender, Accessor::Label(|f| gender_label(f.appearance.gender))),
    (MetricTag::Age, Accessor::Label(|f| age_label(f.appearance.age))),
    (MetricTag::Ethnicity, Accessor::Label(|f| ethnicity_label(f.appearance.ethnicity))),
    (MetricTag::Glasses, Accessor::Label(|f| glasses_label(f.appearance.glasses))),
];

pub fn gender_label(gender: Gender) -> &'static str {
    match gender {
        Gender::Unknown => "unknown",
        Gender::Female => "female",
        Gender::Male => "male",
    }
}

pub fn age_label(age: AgeBracket) -> &'static str {
    match age {
        AgeBracket::Unknown => "unknown",
        AgeBracket::Under18 => "under 18",
        AgeBracket::From18To24 => "18-24",
        AgeBracket::From25To34 => "25-34",
        AgeBracket::From35To44 => "35-44",
        AgeBracket::From45To54 => "45-54",
        AgeBracket::From55To64 => "55-64",
        AgeBracket::Over64 => "65+",
    }
}

pub fn ethnicity_label(ethnicity: Ethnicity) -> &'static str {
    match ethnicity {
        Ethnicity::Unknown => "unknown",
        Ethnicity::Caucasian => "caucasian",
        Ethnicity::BlackAfrican => "black african",
        Ethnicity::EastAsian => "east asian",
        Ethnicity::SouthAsian => "south asian",
        Ethnicity::Hispanic => "hispanic",
    }
}

pub fn glasses_label(glasses: Glasses) -> &'static str {
    match glasses {
        Glasses::Unknown => "unknown",
        Glasses::Yes => "yes",
        Glasses::No => "no",
    }
}

/// Maps a detection result to the named outputs of the metric catalog.
///
/// Construction resolves every catalog tag to its accessor up front, so a
/// catalog/table mismatch fails at startup rather than on some later frame.
/// Only the first face of a result is read.
pub struct MetricExtractor {
    catalog: MetricCatalog,
    /// Indexed by catalog position.
    accessors: Vec<Accessor>,
}

impl MetricExtractor {
    pub fn new() -> Result<Self, CatalogError> {
        Self::with_table(MetricCatalog::standard()?, ACCESSORS)
    }

    pub fn with_table(
        catalog: MetricCatalog,
        table: &[(MetricTag, Accessor)],
    ) -> Result<Self, CatalogError> {
        let mut resolved: Vec<Option<Accessor>> = vec![None; catalog.len()];
        for &(tag, accessor) in table {
            let Some(pos) = catalog.position(tag) else {
                continue;
            };
            if resolved[pos].replace(accessor).is_some() {
                return Err(CatalogError::DuplicateAccessor(tag));
            }
        }

        let accessors = resolved
            .into_iter()
            .zip(catalog.tags())
            .map(|(accessor, &tag)| accessor.ok_or(CatalogError::MissingAccessor(tag)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { catalog, accessors })
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn extract(&self, tag: MetricTag, result: &DetectionResult) -> MetricValue {
        match (result.first_face(), self.catalog.position(tag)) {
            (Some(face), Some(pos)) => self.accessors[pos].read(face),
            _ => MetricValue::NotApplicable,
        }
    }

    /// Every catalog metric for `result`, in catalog order.
    pub fn extract_all(&self, result: &DetectionResult) -> Vec<(MetricTag, MetricValue)> {
        let face = result.first_face();
        self.catalog
            .tags()
            .iter()
            .zip(&self.accessors)
            .map(|(&tag, accessor)| {
                let value = face.map_or(MetricValue::NotApplicable, |f| accessor.read(f));
                (tag, value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::domain::metric_catalog::BAND_SIZES;
    use crate::metrics::domain::metric_tag::MetricKind;
    use rstest::rstest;

    fn face() -> Face {
        let mut face = Face::default();
        face.emotions.joy = 55.0;
        face.emotions.valence = -20.0;
        face.expressions.brow_furrow = 12.0;
        face.expressions.smile = 91.0;
        face.measurements.orientation.yaw = -15.0;
        face.measurements.orientation.pitch = 4.0;
        face.measurements.orientation.roll = 2.5;
        face.measurements.interocular_distance = 64.0;
        face.qualities.brightness = 70.0;
        face.appearance.gender = Gender::Female;
        face.appearance.age = AgeBracket::From35To44;
        face.appearance.ethnicity = Ethnicity::SouthAsian;
        face.appearance.glasses = Glasses::No;
        face
    }

    #[test]
    fn test_standard_table_is_total() {
        let extractor = MetricExtractor::new().unwrap();
        assert_eq!(extractor.catalog().len(), MetricTag::ALL.len());
    }

    #[test]
    fn test_no_face_yields_not_applicable_for_every_tag() {
        let extractor = MetricExtractor::new().unwrap();
        let result = DetectionResult::no_face(0.0);
        for tag in MetricTag::ALL {
            assert_eq!(extractor.extract(tag, &result), MetricValue::NotApplicable);
        }
        assert!(extractor
            .extract_all(&result)
            .iter()
            .all(|(_, v)| *v == MetricValue::NotApplicable));
    }

    #[test]
    fn test_face_yields_a_value_of_the_right_kind_for_every_tag() {
        let extractor = MetricExtractor::new().unwrap();
        let result = DetectionResult::new(0.0, vec![face()]);
        for (tag, value) in extractor.extract_all(&result) {
            match tag.kind() {
                MetricKind::Numeric => assert!(value.as_score().is_some(), "{tag} should be a score"),
                MetricKind::Categorical => assert!(value.as_label().is_some(), "{tag} should be a label"),
            }
        }
    }

    #[rstest]
    #[case(MetricTag::Joy, MetricValue::Score(55.0))]
    #[case(MetricTag::Valence, MetricValue::Score(-20.0))]
    #[case(MetricTag::BrowFurrow, MetricValue::Score(12.0))]
    #[case(MetricTag::Smile, MetricValue::Score(91.0))]
    #[case(MetricTag::Yaw, MetricValue::Score(-15.0))]
    #[case(MetricTag::Pitch, MetricValue::Score(4.0))]
    #[case(MetricTag::Roll, MetricValue::Score(2.5))]
    #[case(MetricTag::InterocularDistance, MetricValue::Score(64.0))]
    #[case(MetricTag::Brightness, MetricValue::Score(70.0))]
    #[case(MetricTag::Gender, MetricValue::Label("female"))]
    #[case(MetricTag::Age, MetricValue::Label("35-44"))]
    #[case(MetricTag::Ethnicity, MetricValue::Label("south asian"))]
    #[case(MetricTag::Glasses, MetricValue::Label("no"))]
    fn test_extract_reads_the_matching_field(#[case] tag: MetricTag, #[case] expected: MetricValue) {
        let extractor = MetricExtractor::new().unwrap();
        let result = DetectionResult::new(0.0, vec![face()]);
        assert_eq!(extractor.extract(tag, &result), expected);
    }

    #[test]
    fn test_first_face_wins() {
        let extractor = MetricExtractor::new().unwrap();
        let mut other = face();
        other.expressions.smile = 3.0;
        let result = DetectionResult::new(0.0, vec![face(), other]);
        assert_eq!(
            extractor.extract(MetricTag::Smile, &result),
            MetricValue::Score(91.0)
        );
    }

    #[test]
    fn test_extract_all_follows_catalog_order() {
        let extractor = MetricExtractor::new().unwrap();
        let result = DetectionResult::new(0.0, vec![face()]);
        let tags: Vec<MetricTag> = extractor.extract_all(&result).into_iter().map(|(t, _)| t).collect();
        assert_eq!(tags, MetricTag::ALL.to_vec());
    }

    #[rstest]
    #[case(AgeBracket::Unknown, "unknown")]
    #[case(AgeBracket::Under18, "under 18")]
    #[case(AgeBracket::From18To24, "18-24")]
    #[case(AgeBracket::From25To34, "25-34")]
    #[case(AgeBracket::From35To44, "35-44")]
    #[case(AgeBracket::From45To54, "45-54")]
    #[case(AgeBracket::From55To64, "55-64")]
    #[case(AgeBracket::Over64, "65+")]
    fn test_age_labels(#[case] age: AgeBracket, #[case] expected: &str) {
        assert_eq!(age_label(age), expected);
    }

    #[rstest]
    #[case(Ethnicity::Unknown, "unknown")]
    #[case(Ethnicity::Caucasian, "caucasian")]
    #[case(Ethnicity::BlackAfrican, "black african")]
    #[case(Ethnicity::EastAsian, "east asian")]
    #[case(Ethnicity::SouthAsian, "south asian")]
    #[case(Ethnicity::Hispanic, "hispanic")]
    fn test_ethnicity_labels(#[case] ethnicity: Ethnicity, #[case] expected: &str) {
        assert_eq!(ethnicity_label(ethnicity), expected);
    }

    #[test]
    fn test_missing_accessor_fails_at_construction() {
        let table: Vec<_> = ACCESSORS
            .iter()
            .copied()
            .filter(|(tag, _)| *tag != MetricTag::Dimpler)
            .collect();
        let catalog = MetricCatalog::new(&MetricTag::ALL, &BAND_SIZES).unwrap();
        assert!(matches!(
            MetricExtractor::with_table(catalog, &table),
            Err(CatalogError::MissingAccessor(MetricTag::Dimpler))
        ));
    }

    #[test]
    fn test_duplicate_accessor_fails_at_construction() {
        let mut table: Vec<_> = ACCESSORS.to_vec();
        table.push((MetricTag::Smile, Accessor::Score(|f| f.expressions.smirk)));
        let catalog = MetricCatalog::standard().unwrap();
        assert!(matches!(
            MetricExtractor::with_table(catalog, &table),
            Err(CatalogError::DuplicateAccessor(MetricTag::Smile))
        ));
    }
}
