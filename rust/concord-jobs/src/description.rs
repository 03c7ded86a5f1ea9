//! Canonical, immutable descriptions of computations.

use serde::{Deserialize, Serialize};

use concord_query::Clause;
use concord_results::{HitProperty, PropertyValue, ResultProperty, SampleParameters};

/// Settings affecting a root search's output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Stop materializing once this many results exist. Truncation is
    /// recorded on the stream's `QueryInfo`.
    #[serde(default)]
    pub max_results: Option<usize>,
}

/// The canonical description of one computation.
///
/// A description is created per request, stringified once via
/// [`unique_identifier`](Self::unique_identifier), and never mutated. Derived
/// descriptions hold their upstream description by value, so the dependency
/// graph is a DAG with no back-references, and a derived description's
/// identifier is a deterministic function of its own parameters plus its
/// upstream's identifier. Two independently constructed, parameter-identical
/// descriptions therefore canonicalize to the same string, and to the same
/// cached job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobDescription {
    /// A root hits search against an index.
    Hits {
        index: String,
        field: String,
        query: Clause,
        settings: SearchSettings,
    },
    /// The upstream's results, stably sorted by a hit property.
    SortedHits {
        input: Box<JobDescription>,
        sort_by: HitProperty,
    },
    /// The upstream's results where a property equals a value.
    FilteredHits {
        input: Box<JobDescription>,
        property: HitProperty,
        value: PropertyValue,
    },
    /// A deterministic random sample of the upstream's results. The seed is
    /// resolved when the parameters are built, so it participates in the
    /// canonical identifier.
    SampledHits {
        input: Box<JobDescription>,
        parameters: SampleParameters,
    },
    /// A window into the upstream's results.
    WindowedHits {
        input: Box<JobDescription>,
        first: usize,
        size: usize,
    },
}

impl JobDescription {
    pub fn hits(
        index: impl Into<String>,
        field: impl Into<String>,
        query: Clause,
        settings: SearchSettings,
    ) -> JobDescription {
        JobDescription::Hits {
            index: index.into(),
            field: field.into(),
            query,
            settings,
        }
    }

    pub fn sorted(self, sort_by: HitProperty) -> JobDescription {
        JobDescription::SortedHits {
            input: Box::new(self),
            sort_by,
        }
    }

    pub fn filtered(self, property: HitProperty, value: PropertyValue) -> JobDescription {
        JobDescription::FilteredHits {
            input: Box::new(self),
            property,
            value,
        }
    }

    pub fn sampled(self, parameters: SampleParameters) -> JobDescription {
        JobDescription::SampledHits {
            input: Box::new(self),
            parameters,
        }
    }

    pub fn windowed(self, first: usize, size: usize) -> JobDescription {
        JobDescription::WindowedHits {
            input: Box::new(self),
            first,
            size,
        }
    }

    /// The upstream description this one depends on, if any.
    pub fn input(&self) -> Option<&JobDescription> {
        match self {
            JobDescription::Hits { .. } => None,
            JobDescription::SortedHits { input, .. }
            | JobDescription::FilteredHits { input, .. }
            | JobDescription::SampledHits { input, .. }
            | JobDescription::WindowedHits { input, .. } => Some(input),
        }
    }

    /// The deterministic canonical identifier used for cache deduplication.
    pub fn unique_identifier(&self) -> String {
        match self {
            JobDescription::Hits {
                index,
                field,
                query,
                settings,
            } => {
                let max = match settings.max_results {
                    Some(max) => max.to_string(),
                    None => "none".to_string(),
                };
                format!("hits(index={index}, field={field}, query={query}, max={max})")
            }
            JobDescription::SortedHits { input, sort_by } => {
                format!("sort({}, by={})", input.unique_identifier(), sort_by.name())
            }
            JobDescription::FilteredHits {
                input,
                property,
                value,
            } => format!(
                "filter({}, {}={})",
                input.unique_identifier(),
                property.name(),
                value
            ),
            JobDescription::SampledHits { input, parameters } => {
                format!("sample({}, {})", input.unique_identifier(), parameters)
            }
            JobDescription::WindowedHits { input, first, size } => format!(
                "window({}, first={first}, size={size})",
                input.unique_identifier()
            ),
        }
    }
}
