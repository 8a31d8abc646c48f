//! Index variant selection.
//!
//! Each variant projects to the factory string handed to the search engine.
//! Whether a variant needs a training pass is looked up once, when the
//! descriptor is built.

use std::fmt;
use std::str::FromStr;

use crate::error::VectorError;

/// Closed set of index variants understood by the engines.
#[allow(clippy::upper_case_acronyms)] // names double as factory strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Exhaustive search, L2 distance
    Flat,
    /// Exhaustive search, inner product
    FlatIP,
    /// Locality-sensitive hashing
    LSH,
    /// Scalar quantizer
    SQ,
    /// Product quantizer
    PQ,
    /// Inverted file, exact storage
    IVFFlat,
    /// Inverted file, product-quantized storage
    IVFPQ,
    /// Inverted file, scalar-quantized storage
    IVFSQ,
    /// HNSW graph over exact vectors
    HNSWFlat,
    /// PCA dimensionality-reduction prefix
    PCA,
    /// Optimized product quantizer prefix
    OPQ,
    /// Exact re-ranking suffix
    RFlat,
    /// Composite pipeline not covered above
    CustomComposite,
}

/// (variant, factory string, requires training)
const KIND_TABLE: &[(IndexKind, &str, bool)] = &[
    (IndexKind::Flat, "Flat", false),
    (IndexKind::FlatIP, "FlatIP", false),
    (IndexKind::LSH, "LSH", false),
    (IndexKind::SQ, "SQ", false),
    (IndexKind::PQ, "PQ", false),
    (IndexKind::IVFFlat, "IVFFlat", true),
    (IndexKind::IVFPQ, "IVFPQ", true),
    (IndexKind::IVFSQ, "IVFSQ", true),
    (IndexKind::HNSWFlat, "HNSWFlat", false),
    (IndexKind::PCA, "PCA", false),
    (IndexKind::OPQ, "OPQ", false),
    (IndexKind::RFlat, "RFlat", false),
    (IndexKind::CustomComposite, "CustomComposite", false),
];

impl IndexKind {
    pub const ALL: [IndexKind; 13] = [
        IndexKind::Flat,
        IndexKind::FlatIP,
        IndexKind::LSH,
        IndexKind::SQ,
        IndexKind::PQ,
        IndexKind::IVFFlat,
        IndexKind::IVFPQ,
        IndexKind::IVFSQ,
        IndexKind::HNSWFlat,
        IndexKind::PCA,
        IndexKind::OPQ,
        IndexKind::RFlat,
        IndexKind::CustomComposite,
    ];

    fn entry(self) -> (&'static str, bool) {
        KIND_TABLE
            .iter()
            .find(|(kind, _, _)| *kind == self)
            .map(|(_, name, training)| (*name, *training))
            .unwrap_or(("CustomComposite", false))
    }

    /// Factory string for this variant.
    pub fn factory_string(self) -> &'static str {
        self.entry().0
    }

    /// True for the inverted-file family.
    pub fn requires_training(self) -> bool {
        self.entry().1
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.factory_string())
    }
}

impl FromStr for IndexKind {
    type Err = VectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KIND_TABLE
            .iter()
            .find(|(_, name, _)| name.eq_ignore_ascii_case(s))
            .map(|(kind, _, _)| *kind)
            .ok_or_else(|| VectorError::InvalidArgument(format!("unknown index type: {s}")))
    }
}

/// Index variant plus its precomputed training requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDescriptor {
    kind: IndexKind,
    requires_training: bool,
}

impl IndexDescriptor {
    pub fn new(kind: IndexKind) -> Self {
        Self {
            kind,
            requires_training: kind.requires_training(),
        }
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn factory_string(&self) -> &'static str {
        self.kind.factory_string()
    }

    pub fn requires_training(&self) -> bool {
        self.requires_training
    }
}

impl From<IndexKind> for IndexDescriptor {
    fn from(kind: IndexKind) -> Self {
        Self::new(kind)
    }
}

impl Default for IndexDescriptor {
    fn default() -> Self {
        Self::new(IndexKind::Flat)
    }
}

impl fmt::Display for IndexDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl FromStr for IndexDescriptor {
    type Err = VectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<IndexKind>().map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_strings_are_names() {
        assert_eq!(IndexKind::Flat.factory_string(), "Flat");
        assert_eq!(IndexKind::FlatIP.factory_string(), "FlatIP");
        assert_eq!(IndexKind::IVFPQ.factory_string(), "IVFPQ");
        assert_eq!(IndexKind::HNSWFlat.factory_string(), "HNSWFlat");
    }

    #[test]
    fn test_only_ivf_family_requires_training() {
        for kind in IndexKind::ALL {
            let expected = kind.factory_string().contains("IVF");
            assert_eq!(kind.requires_training(), expected, "{kind}");
            assert_eq!(IndexDescriptor::new(kind).requires_training(), expected);
        }
    }

    #[test]
    fn test_table_covers_every_kind() {
        assert_eq!(KIND_TABLE.len(), IndexKind::ALL.len());
        for kind in IndexKind::ALL {
            assert!(KIND_TABLE.iter().any(|(k, _, _)| *k == kind));
        }
    }

    #[test]
    fn test_parse_round_trip() {
        for kind in IndexKind::ALL {
            assert_eq!(kind.factory_string().parse::<IndexKind>().unwrap(), kind);
        }
        assert_eq!("ivfflat".parse::<IndexKind>().unwrap(), IndexKind::IVFFlat);
        assert!(matches!(
            "IVF100,Flat".parse::<IndexKind>(),
            Err(VectorError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_descriptor_default_is_flat() {
        let desc = IndexDescriptor::default();
        assert_eq!(desc.kind(), IndexKind::Flat);
        assert!(!desc.requires_training());
        assert_eq!(desc.to_string(), "Flat");
    }
}
