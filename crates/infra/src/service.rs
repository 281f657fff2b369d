//! Transactional entity service.
//!
//! One generic service per entity type. Each call opens its own transaction:
//! writes commit on success and roll back on any failure, reads run read-only.

use std::marker::PhantomData;
use std::sync::Arc;

use shapes_core::{EntityId, IdentifiedEntity};

use crate::gateway::{Gateway, StoreResult, TransactionSource, TxMode};

pub type ServiceError = crate::gateway::StoreError;

pub struct EntityService<E, G> {
    gateway: Arc<G>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, G> Clone for EntityService<E, G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            _entity: PhantomData,
        }
    }
}

impl<E, G> std::fmt::Debug for EntityService<E, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityService")
            .field("entity", &std::any::type_name::<E>())
            .finish_non_exhaustive()
    }
}

impl<E, G> EntityService<E, G>
where
    E: IdentifiedEntity,
    G: Gateway<E>,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            _entity: PhantomData,
        }
    }

    /// Insert a new entity, or merge one that already carries an identifier.
    pub async fn save(&self, entity: E) -> StoreResult<E> {
        tracing::info!(kind = E::KIND, id = ?entity.id(), "saving entity");
        let mut tx = self.gateway.begin(TxMode::ReadWrite).await?;
        let result = self.gateway.save(&mut tx, entity).await;
        self.finish(tx, result).await
    }

    /// Persist a new entity or overwrite an existing one in place.
    ///
    /// An identifier with no stored entity fails with `StoreError::Missing`.
    pub async fn update(&self, entity: E) -> StoreResult<E> {
        tracing::info!(kind = E::KIND, id = ?entity.id(), "updating entity");
        let mut tx = self.gateway.begin(TxMode::ReadWrite).await?;
        let result = self.gateway.persist_or_update(&mut tx, entity).await;
        self.finish(tx, result).await
    }

    pub async fn find(&self, id: EntityId) -> StoreResult<Option<E>> {
        tracing::info!(kind = E::KIND, %id, "finding entity");
        let mut tx = self.gateway.begin(TxMode::ReadOnly).await?;
        let result = self.gateway.find_by_id(&mut tx, id).await;
        self.finish(tx, result).await
    }

    pub async fn find_all(&self) -> StoreResult<Vec<E>> {
        tracing::info!(kind = E::KIND, "finding all entities");
        let mut tx = self.gateway.begin(TxMode::ReadOnly).await?;
        let result = self.gateway.find_all(&mut tx).await;
        self.finish(tx, result).await
    }

    pub async fn delete(&self, id: EntityId) -> StoreResult<()> {
        tracing::info!(kind = E::KIND, %id, "deleting entity");
        let mut tx = self.gateway.begin(TxMode::ReadWrite).await?;
        let result = self.gateway.delete_by_id(&mut tx, id).await;
        self.finish(tx, result).await
    }

    pub async fn delete_all(&self) -> StoreResult<()> {
        tracing::info!(kind = E::KIND, "deleting all entities");
        let mut tx = self.gateway.begin(TxMode::ReadWrite).await?;
        let result = self.gateway.delete_all(&mut tx).await;
        self.finish(tx, result).await
    }

    pub async fn count(&self) -> StoreResult<u64> {
        tracing::info!(kind = E::KIND, "counting entities");
        let mut tx = self.gateway.begin(TxMode::ReadOnly).await?;
        let result = self.gateway.count(&mut tx).await;
        self.finish(tx, result).await
    }

    async fn finish<T>(&self, tx: G::Tx, result: StoreResult<T>) -> StoreResult<T> {
        match result {
            Ok(value) => {
                self.gateway.commit(tx).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.gateway.rollback(tx).await {
                    tracing::warn!(
                        kind = E::KIND,
                        error = %rollback_err,
                        "rollback failed after store error"
                    );
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MemoryDatabase, MemoryDrawingGateway, MemoryShapeGateway, StoreError};
    use shapes_core::{Circle, Drawing, Position, Rectangle, Shape};

    type CircleService = EntityService<Circle, MemoryShapeGateway<Circle>>;
    type RectangleService = EntityService<Rectangle, MemoryShapeGateway<Rectangle>>;
    type DrawingService = EntityService<Drawing, MemoryDrawingGateway>;

    fn services() -> (CircleService, RectangleService, DrawingService) {
        let db = Arc::new(MemoryDatabase::new());
        (
            EntityService::new(Arc::new(MemoryShapeGateway::new(db.clone()))),
            EntityService::new(Arc::new(MemoryShapeGateway::new(db.clone()))),
            EntityService::new(Arc::new(MemoryDrawingGateway::new(db))),
        )
    }

    #[tokio::test]
    async fn save_then_find_returns_saved_state() {
        let (circles, _, _) = services();
        let saved = circles
            .save(Circle::new("Black 2000", Position::new(1, 2), 7))
            .await
            .unwrap();
        let id = saved.id().unwrap();

        assert_eq!(circles.find(id).await.unwrap(), Some(saved));
        assert_eq!(circles.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_preserves_identifier() {
        let (circles, _, _) = services();
        let mut saved = circles
            .save(Circle::with_defaults("red", Position::default()))
            .await
            .unwrap();
        let id = saved.id();

        saved.base.colour = "green".to_string();
        let updated = circles.update(saved).await.unwrap();
        assert_eq!(updated.id(), id);
        assert_eq!(circles.find_all().await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn update_of_unknown_id_fails_and_writes_nothing() {
        let (circles, _, _) = services();
        let mut ghost = Circle::with_defaults("red", Position::default());
        ghost.set_id(Some(EntityId::from_i64(99)));

        let err = circles.update(ghost).await.unwrap_err();
        assert!(matches!(err, StoreError::Missing { id, .. } if id == EntityId::from_i64(99)));
        assert_eq!(circles.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_drawing_update_rolls_back_cascade() {
        let (circles, _, drawings) = services();
        let mut d = Drawing::new("plan");
        d.add_shape(Circle::new("red", Position::default(), 5));
        let saved = drawings.save(d).await.unwrap();

        // Unknown drawing id: the shape upserts inside the cascade must not stick.
        let mut ghost = saved.clone();
        ghost.id = Some(EntityId::from_i64(404));
        ghost.add_shape(Circle::new("blue", Position::default(), 1));
        assert!(drawings.update(ghost).await.is_err());

        assert_eq!(circles.count().await.unwrap(), 1);
        assert_eq!(drawings.find_all().await.unwrap(), vec![saved]);
    }

    #[tokio::test]
    async fn delete_then_find_is_empty() {
        let (_, rectangles, _) = services();
        let r = rectangles
            .save(Rectangle::new("blue", Position::default(), 3, 4))
            .await
            .unwrap();
        let id = r.id().unwrap();

        rectangles.delete(id).await.unwrap();
        assert_eq!(rectangles.find(id).await.unwrap(), None);

        // Deleting again is a no-op.
        rectangles.delete(id).await.unwrap();
    }

    #[tokio::test]
    async fn delete_all_empties_only_its_own_collection() {
        let (circles, rectangles, _) = services();
        circles
            .save(Circle::with_defaults("a", Position::default()))
            .await
            .unwrap();
        rectangles
            .save(Rectangle::with_defaults("b", Position::default()))
            .await
            .unwrap();

        circles.delete_all().await.unwrap();
        assert!(circles.find_all().await.unwrap().is_empty());
        assert_eq!(rectangles.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn drawing_round_trips_with_mixed_shapes() {
        let (_, _, drawings) = services();
        let mut d = Drawing::new("mixed");
        d.add_shape(Circle::new("red", Position::new(1, 1), 5));
        d.add_shape(Rectangle::new("blue", Position::new(2, 2), 3, 4));

        let saved = drawings.save(d).await.unwrap();
        assert!(saved.shapes.iter().all(|s| s.id().is_some()));

        let found = drawings.find(saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(found.name, "mixed");
        assert_eq!(found.shapes.len(), 2);
        assert!(found.shapes.iter().any(|s| matches!(s, Shape::Circle(c) if c.radius == 5)));
        assert!(found
            .shapes
            .iter()
            .any(|s| matches!(s, Shape::Rectangle(r) if r.height == 3 && r.width == 4)));
    }
}
