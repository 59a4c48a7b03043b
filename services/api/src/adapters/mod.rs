pub mod cms;
pub mod db;
pub mod memory;
pub mod static_json;

pub use cms::CmsRepository;
pub use db::PgKeyValueStore;
pub use memory::MemoryKeyValueStore;
pub use static_json::StaticJsonRepository;
