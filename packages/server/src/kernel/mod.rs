// Kernel: infrastructure clients and the trait seams they sit behind.
//
// Business logic lives in domains/*; everything here is replaceable in tests
// via the Base* traits.

pub mod deps;
pub mod email;
pub mod places_client;
pub mod site_crawler;
pub mod traits;

pub mod test_dependencies;

pub use deps::ServerDeps;
pub use email::EmailExtractor;
pub use places_client::{NoopPlaceSearch, PlacesClient};
pub use site_crawler::{ContactCrawler, CrawlerOptions};
pub use traits::{BasePlaceSearch, BaseSiteCrawler, Place, PlacePage};
