//! Title normalization: cheap, deterministic cleanup of raw labels.

mod normalizer;

pub use normalizer::{
    clean_channel, collapse_whitespace, NormalizedTitle, NormalizerConfig, SplitForm,
    TitleNormalizer,
};
