use std::collections::HashSet;
use std::ops::Range;

use thiserror::Error;

use crate::metrics::domain::metric_tag::{MetricBand, MetricTag};

/// Number of tags in each band, in catalog order.
///
/// Band boundaries come from these counts only, never from where a tag
/// happens to sit in [`MetricTag::ALL`].
pub const BAND_SIZES: [(MetricBand, usize); 5] = [
    (MetricBand::Emotions, 9),
    (MetricBand::Expressions, 21),
    (MetricBand::Measurements, 4),
    (MetricBand::Qualities, 1),
    (MetricBand::Appearance, 4),
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("band sizes sum to {declared} but the catalog has {actual} tags")]
    SizeMismatch { declared: usize, actual: usize },
    #[error("band table must list {expected:?} at position {position}, found {found:?}")]
    BandOrder {
        position: usize,
        expected: MetricBand,
        found: MetricBand,
    },
    #[error("tag {tag} belongs to {actual:?} but sits in the {declared:?} band")]
    MisplacedTag {
        tag: MetricTag,
        declared: MetricBand,
        actual: MetricBand,
    },
    #[error("tag {0} appears more than once in the catalog")]
    DuplicateTag(MetricTag),
    #[error("no accessor resolves tag {0}")]
    MissingAccessor(MetricTag),
    #[error("tag {0} resolves to more than one accessor")]
    DuplicateAccessor(MetricTag),
}

/// An ordered metric catalog partitioned into five contiguous bands.
#[derive(Clone, Debug)]
pub struct MetricCatalog {
    tags: Vec<MetricTag>,
    bands: Vec<(MetricBand, Range<usize>)>,
}

impl MetricCatalog {
    /// The catalog shipped with the crate.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::new(&MetricTag::ALL, &BAND_SIZES)
    }

    /// Builds and validates a catalog from tags and a band-size table.
    pub fn new(tags: &[MetricTag], band_sizes: &[(MetricBand, usize)]) -> Result<Self, CatalogError> {
        let declared: usize = band_sizes.iter().map(|(_, n)| n).sum();
        if declared != tags.len() || band_sizes.len() != MetricBand::ALL.len() {
            return Err(CatalogError::SizeMismatch {
                declared,
                actual: tags.len(),
            });
        }

        let mut seen = HashSet::with_capacity(tags.len());
        for &tag in tags {
            if !seen.insert(tag) {
                return Err(CatalogError::DuplicateTag(tag));
            }
        }

        let mut bands = Vec::with_capacity(band_sizes.len());
        let mut start = 0;
        for (position, (&expected, &(band, size))) in
            MetricBand::ALL.iter().zip(band_sizes).enumerate()
        {
            if band != expected {
                return Err(CatalogError::BandOrder {
                    position,
                    expected,
                    found: band,
                });
            }
            let range = start..start + size;
            for &tag in &tags[range.clone()] {
                if tag.band() != band {
                    return Err(CatalogError::MisplacedTag {
                        tag,
                        declared: band,
                        actual: tag.band(),
                    });
                }
            }
            bands.push((band, range));
            start += size;
        }

        Ok(Self {
            tags: tags.to_vec(),
            bands,
        })
    }

    pub fn tags(&self) -> &[MetricTag] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Index range of `band` within [`Self::tags`].
    pub fn band_range(&self, band: MetricBand) -> Range<usize> {
        self.bands
            .iter()
            .find(|(b, _)| *b == band)
            .map(|(_, r)| r.clone())
            .unwrap_or(0..0)
    }

    pub fn band_tags(&self, band: MetricBand) -> &[MetricTag] {
        &self.tags[self.band_range(band)]
    }

    pub fn position(&self, tag: MetricTag) -> Option<usize> {
        self.tags.iter().position(|&t| t == tag)
    }
}
