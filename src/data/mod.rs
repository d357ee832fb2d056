//! Return data containers and the collaborators that supply them.
//!
//! Everything downstream consumes [`ReturnSeries`] (one asset) or
//! [`ReturnMatrix`] (several assets aligned on common dates). Where the
//! returns come from is abstracted by [`ReturnSource`]; an in-memory
//! [`ReturnSeriesStore`], a CSV price loader and a memoizing cache wrapper
//! are provided.

mod cache;
mod frame;
mod prices;
mod series;
mod store;
mod weights;

pub use cache::{Cache, CacheStats, CachedReturnSource, MemoryCache, ReturnKey};
pub use frame::ReturnMatrix;
pub use prices::{PriceCsvLoader, PriceHistory, DATE_FORMAT};
pub use series::ReturnSeries;
pub use store::{ReturnSeriesStore, ReturnSource};
pub use weights::WeightVector;

#[cfg(test)]
#[path = "data_tests.rs"]
mod tests;
