//! Infrastructure layer: persistence gateways, the transactional entity
//! service and configuration.

pub mod gateway;
pub mod config;
pub mod service;

pub use config::{ConfigError, ServerConfig, StoreConfig};
pub use gateway::{
    Gateway, MemoryDatabase, MemoryDrawingGateway, MemoryShapeGateway, PgDatabase,
    PgDrawingGateway, PgShapeGateway, StoreError, StoreResult, TransactionSource, TxMode,
};
pub use service::{EntityService, ServiceError};
