pub mod bookmarks;
pub mod domain;
pub mod facets;
pub mod filter;
pub mod gate;
pub mod pagination;
pub mod ports;
pub mod ranking;
pub mod recommend;

pub use bookmarks::BookmarkSet;
pub use domain::{Author, Webinar, WebinarType};
pub use facets::{extract_facets, featured, Facets};
pub use filter::{filter_webinars, filter_webinars_at, DurationBucket, FacetKind, FilterState};
pub use gate::{AccessGate, GateError, Registration, RegistrationLog, ValidationError};
pub use pagination::{paginate, Page, DEFAULT_PAGE_SIZE};
pub use ports::{KeyValueStore, PortError, PortResult, ScopedStore, WebinarRepository};
pub use ranking::rank_webinars;
pub use recommend::{recommend, recommend_at, DEFAULT_RECOMMENDATION_LIMIT};
