//! EPUB flattening
//!
//! Loads the package descriptor, then aggregates stylesheets and content
//! documents into one scoped stylesheet and one HTML fragment.

use rayon::prelude::*;

mod aggregate;
pub mod assets;
pub mod css;
pub mod opf;
pub mod parser;
pub mod path;

pub use aggregate::{aggregate, AggregatedContent};
pub use opf::{load_descriptor, Descriptor, Manifest, ManifestItem};

/// Map `items` in order, optionally on the rayon pool
///
/// Each result lands in the slot of its input, so output order never depends
/// on scheduling.
pub(crate) fn map_ordered<T, R, F>(items: &[T], parallel: bool, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if parallel && items.len() > 1 {
        items.par_iter().map(f).collect()
    } else {
        items.iter().map(f).collect()
    }
}
