//! Extraction pipeline - selector, extractor and field mapper behind one facade

pub mod extractor;
pub mod mapper;

pub use extractor::{extract, ExtractOptions, Extraction};
pub use mapper::{ContractMapper, ContractSource, EffectiveConfig, MapOutput, MapperConfig};
