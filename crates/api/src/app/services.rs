//! Store and service wiring.
//!
//! `DATABASE_URL` selects Postgres; without it everything lives in memory.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;

use shapes_core::{Circle, Drawing, Rectangle};
use shapes_infra::{
    EntityService, Gateway, MemoryDatabase, MemoryDrawingGateway, MemoryShapeGateway, PgDatabase,
    PgDrawingGateway, PgShapeGateway, StoreConfig,
};

use crate::app::resource;

/// One service per collection, all sharing a single store.
pub struct Services<C, R, D> {
    pub circles: EntityService<Circle, C>,
    pub rectangles: EntityService<Rectangle, R>,
    pub drawings: EntityService<Drawing, D>,
}

impl<C, R, D> Services<C, R, D>
where
    C: Gateway<Circle> + 'static,
    R: Gateway<Rectangle> + 'static,
    D: Gateway<Drawing> + 'static,
{
    fn router(&self) -> Router {
        Router::new()
            .merge(resource::router(self.circles.clone()))
            .merge(resource::router(self.rectangles.clone()))
            .merge(resource::router(self.drawings.clone()))
    }
}

pub type InMemoryServices =
    Services<MemoryShapeGateway<Circle>, MemoryShapeGateway<Rectangle>, MemoryDrawingGateway>;

pub type PostgresServices =
    Services<PgShapeGateway<Circle>, PgShapeGateway<Rectangle>, PgDrawingGateway>;

pub enum AppServices {
    InMemory(InMemoryServices),
    Postgres(PostgresServices),
}

impl AppServices {
    pub fn in_memory() -> Self {
        let db = Arc::new(MemoryDatabase::new());
        Self::InMemory(Services {
            circles: EntityService::new(Arc::new(MemoryShapeGateway::new(db.clone()))),
            rectangles: EntityService::new(Arc::new(MemoryShapeGateway::new(db.clone()))),
            drawings: EntityService::new(Arc::new(MemoryDrawingGateway::new(db))),
        })
    }

    pub fn postgres(db: PgDatabase) -> Self {
        let db = Arc::new(db);
        Self::Postgres(Services {
            circles: EntityService::new(Arc::new(PgShapeGateway::new(db.clone()))),
            rectangles: EntityService::new(Arc::new(PgShapeGateway::new(db.clone()))),
            drawings: EntityService::new(Arc::new(PgDrawingGateway::new(db))),
        })
    }

    /// Build the services for `config`, connecting to Postgres and creating
    /// its tables when a database URL is set.
    pub async fn from_config(config: &StoreConfig) -> anyhow::Result<Self> {
        let Some(url) = config.database_url.as_deref() else {
            tracing::info!("DATABASE_URL not set; using in-memory store");
            return Ok(Self::in_memory());
        };

        let db = PgDatabase::connect(url, config)
            .await
            .context("failed to connect to postgres")?;
        db.ensure_schema()
            .await
            .context("failed to create postgres schema")?;
        tracing::info!(
            max_connections = config.max_connections,
            "using postgres store"
        );
        Ok(Self::postgres(db))
    }

    /// Routes for every collection.
    pub fn router(&self) -> Router {
        match self {
            Self::InMemory(services) => services.router(),
            Self::Postgres(services) => services.router(),
        }
    }
}
