use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

use shapes_core::{Drawing, EntityId, IdentifiedEntity, Shape, ShapeKind, ShapeVariant};

use super::r#trait::{Gateway, StoreError, StoreResult, TransactionSource, TxMode};

#[derive(Debug, Clone)]
struct DrawingRow {
    name: String,
    creation_date: DateTime<Utc>,
    shape_ids: BTreeSet<EntityId>,
}

/// Table contents. Circles and rectangles share one identifier sequence and
/// live in one map; the variant is the shape's own discriminant.
#[derive(Debug, Clone, Default)]
struct Tables {
    last_shape_id: i64,
    last_drawing_id: i64,
    shapes: BTreeMap<EntityId, Shape>,
    drawings: BTreeMap<EntityId, DrawingRow>,
}

impl Tables {
    fn next_shape_id(&mut self) -> EntityId {
        self.last_shape_id += 1;
        EntityId::from_i64(self.last_shape_id)
    }

    fn next_drawing_id(&mut self) -> EntityId {
        self.last_drawing_id += 1;
        EntityId::from_i64(self.last_drawing_id)
    }

    fn shape_exists(&self, kind: ShapeKind, id: EntityId) -> bool {
        self.shapes.get(&id).is_some_and(|s| s.kind() == kind)
    }

    fn insert_shape(&mut self, mut shape: Shape) -> Shape {
        let id = self.next_shape_id();
        shape.set_id(Some(id));
        self.shapes.insert(id, shape.clone());
        shape
    }

    fn overwrite_shape(&mut self, id: EntityId, shape: Shape) -> Shape {
        self.shapes.insert(id, shape.clone());
        shape
    }

    /// Overwrites the row when it exists, otherwise inserts with a fresh id.
    fn merge_shape(&mut self, shape: Shape) -> Shape {
        match shape.id() {
            Some(id) if self.shape_exists(shape.kind(), id) => self.overwrite_shape(id, shape),
            _ => self.insert_shape(shape),
        }
    }

    /// Deletes a shape row and detaches it from whichever drawing owned it.
    fn remove_shape(&mut self, id: EntityId) {
        self.shapes.remove(&id);
        for row in self.drawings.values_mut() {
            row.shape_ids.remove(&id);
        }
    }

    /// Writes a drawing row and reconciles its owned shapes.
    ///
    /// Shapes previously owned but absent from `drawing.shapes` are deleted;
    /// every shape present is merged and linked to this drawing.
    fn write_drawing(&mut self, id: EntityId, mut drawing: Drawing) -> Drawing {
        drawing.dedup_shapes();

        let previous = self
            .drawings
            .get(&id)
            .map(|row| row.shape_ids.clone())
            .unwrap_or_default();

        let mut linked = BTreeSet::new();
        let mut shapes = Vec::with_capacity(drawing.shapes.len());
        for shape in drawing.shapes {
            let saved = self.merge_shape(shape);
            if let Some(shape_id) = saved.id() {
                linked.insert(shape_id);
            }
            shapes.push(saved);
        }

        for orphan in previous.difference(&linked) {
            tracing::debug!(drawing_id = %id, shape_id = %orphan, "removing orphaned shape");
            self.shapes.remove(orphan);
        }

        // A shape has a single owner; moving it here detaches it elsewhere.
        for (other_id, row) in self.drawings.iter_mut() {
            if *other_id != id {
                row.shape_ids.retain(|s| !linked.contains(s));
            }
        }

        self.drawings.insert(
            id,
            DrawingRow {
                name: drawing.name.clone(),
                creation_date: drawing.creation_date,
                shape_ids: linked,
            },
        );

        Drawing {
            id: Some(id),
            name: drawing.name,
            creation_date: drawing.creation_date,
            shapes,
        }
    }

    fn load_drawing(&self, id: EntityId, row: &DrawingRow) -> Drawing {
        Drawing {
            id: Some(id),
            name: row.name.clone(),
            creation_date: row.creation_date,
            shapes: row
                .shape_ids
                .iter()
                .filter_map(|shape_id| self.shapes.get(shape_id).cloned())
                .collect(),
        }
    }

    fn remove_drawing(&mut self, id: EntityId) {
        if let Some(row) = self.drawings.remove(&id) {
            for shape_id in row.shape_ids {
                self.shapes.remove(&shape_id);
            }
        }
    }
}

/// In-memory relational-ish store for circles, rectangles and drawings.
///
/// Intended for tests/dev. A read-write transaction holds the store's write
/// lock and works on a staged copy that `commit` publishes, so writers are
/// serialized and a rollback (or drop) leaves no trace. Read-only
/// transactions share the read lock.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Transaction over a [`MemoryDatabase`].
#[derive(Debug)]
pub struct MemoryTx {
    state: TxState,
}

#[derive(Debug)]
enum TxState {
    ReadOnly(OwnedRwLockReadGuard<Tables>),
    ReadWrite {
        guard: OwnedRwLockWriteGuard<Tables>,
        staged: Tables,
    },
}

impl MemoryTx {
    fn tables(&self) -> &Tables {
        match &self.state {
            TxState::ReadOnly(guard) => &**guard,
            TxState::ReadWrite { staged, .. } => staged,
        }
    }

    fn tables_mut(&mut self) -> StoreResult<&mut Tables> {
        match &mut self.state {
            TxState::ReadOnly(_) => Err(StoreError::ReadOnly),
            TxState::ReadWrite { staged, .. } => Ok(staged),
        }
    }
}

#[async_trait]
impl TransactionSource for MemoryDatabase {
    type Tx = MemoryTx;

    async fn begin(&self, mode: TxMode) -> StoreResult<MemoryTx> {
        let state = match mode {
            TxMode::ReadOnly => TxState::ReadOnly(self.tables.clone().read_owned().await),
            TxMode::ReadWrite => {
                let guard = self.tables.clone().write_owned().await;
                let staged = (*guard).clone();
                TxState::ReadWrite { guard, staged }
            }
        };
        Ok(MemoryTx { state })
    }

    async fn commit(&self, tx: MemoryTx) -> StoreResult<()> {
        if let TxState::ReadWrite { mut guard, staged } = tx.state {
            *guard = staged;
        }
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> StoreResult<()> {
        drop(tx);
        Ok(())
    }
}

/// Gateway for one shape variant (circles or rectangles).
#[derive(Debug)]
pub struct MemoryShapeGateway<E> {
    db: Arc<MemoryDatabase>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> MemoryShapeGateway<E> {
    pub fn new(db: Arc<MemoryDatabase>) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

delegate_transactions!(MemoryShapeGateway<E>, MemoryTx, E);

fn extract<E: ShapeVariant>(shape: Shape) -> StoreResult<E> {
    let kind = shape.kind();
    E::from_shape(shape).ok_or_else(|| {
        StoreError::Corrupt(format!("expected {} row, found {}", E::SHAPE_KIND, kind))
    })
}

#[async_trait]
impl<E> Gateway<E> for MemoryShapeGateway<E>
where
    E: ShapeVariant,
{
    async fn save(&self, tx: &mut MemoryTx, entity: E) -> StoreResult<E> {
        let tables = tx.tables_mut()?;
        extract(tables.merge_shape(entity.into()))
    }

    async fn persist_or_update(&self, tx: &mut MemoryTx, entity: E) -> StoreResult<E> {
        let tables = tx.tables_mut()?;
        let shape: Shape = entity.into();
        let saved = match shape.id() {
            None => tables.insert_shape(shape),
            Some(id) if tables.shape_exists(E::SHAPE_KIND, id) => tables.overwrite_shape(id, shape),
            Some(id) => return Err(StoreError::Missing { kind: E::KIND, id }),
        };
        extract(saved)
    }

    async fn find_by_id(&self, tx: &mut MemoryTx, id: EntityId) -> StoreResult<Option<E>> {
        Ok(tx.tables().shapes.get(&id).cloned().and_then(E::from_shape))
    }

    async fn find_all(&self, tx: &mut MemoryTx) -> StoreResult<Vec<E>> {
        Ok(tx
            .tables()
            .shapes
            .values()
            .cloned()
            .filter_map(E::from_shape)
            .collect())
    }

    async fn delete_by_id(&self, tx: &mut MemoryTx, id: EntityId) -> StoreResult<()> {
        let tables = tx.tables_mut()?;
        if tables.shape_exists(E::SHAPE_KIND, id) {
            tables.remove_shape(id);
        }
        Ok(())
    }

    async fn delete_all(&self, tx: &mut MemoryTx) -> StoreResult<()> {
        let tables = tx.tables_mut()?;
        let ids: Vec<EntityId> = tables
            .shapes
            .iter()
            .filter(|(_, s)| s.kind() == E::SHAPE_KIND)
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            tables.remove_shape(id);
        }
        Ok(())
    }

    async fn count(&self, tx: &mut MemoryTx) -> StoreResult<u64> {
        Ok(tx
            .tables()
            .shapes
            .values()
            .filter(|s| s.kind() == E::SHAPE_KIND)
            .count() as u64)
    }
}

/// Gateway for drawings, cascading writes and deletes to owned shapes.
#[derive(Debug)]
pub struct MemoryDrawingGateway {
    db: Arc<MemoryDatabase>,
}

impl MemoryDrawingGateway {
    pub fn new(db: Arc<MemoryDatabase>) -> Self {
        Self { db }
    }
}

delegate_transactions!(MemoryDrawingGateway, MemoryTx);

#[async_trait]
impl Gateway<Drawing> for MemoryDrawingGateway {
    async fn save(&self, tx: &mut MemoryTx, drawing: Drawing) -> StoreResult<Drawing> {
        let tables = tx.tables_mut()?;
        let id = match drawing.id {
            Some(id) if tables.drawings.contains_key(&id) => id,
            _ => tables.next_drawing_id(),
        };
        Ok(tables.write_drawing(id, drawing))
    }

    async fn persist_or_update(&self, tx: &mut MemoryTx, drawing: Drawing) -> StoreResult<Drawing> {
        let tables = tx.tables_mut()?;
        let id = match drawing.id {
            None => tables.next_drawing_id(),
            Some(id) if tables.drawings.contains_key(&id) => id,
            Some(id) => {
                return Err(StoreError::Missing {
                    kind: Drawing::KIND,
                    id,
                });
            }
        };
        Ok(tables.write_drawing(id, drawing))
    }

    async fn find_by_id(&self, tx: &mut MemoryTx, id: EntityId) -> StoreResult<Option<Drawing>> {
        let tables = tx.tables();
        Ok(tables.drawings.get(&id).map(|row| tables.load_drawing(id, row)))
    }

    async fn find_all(&self, tx: &mut MemoryTx) -> StoreResult<Vec<Drawing>> {
        let tables = tx.tables();
        Ok(tables
            .drawings
            .iter()
            .map(|(id, row)| tables.load_drawing(*id, row))
            .collect())
    }

    async fn delete_by_id(&self, tx: &mut MemoryTx, id: EntityId) -> StoreResult<()> {
        tx.tables_mut()?.remove_drawing(id);
        Ok(())
    }

    async fn delete_all(&self, tx: &mut MemoryTx) -> StoreResult<()> {
        let tables = tx.tables_mut()?;
        let ids: Vec<EntityId> = tables.drawings.keys().copied().collect();
        for id in ids {
            tables.remove_drawing(id);
        }
        Ok(())
    }

    async fn count(&self, tx: &mut MemoryTx) -> StoreResult<u64> {
        Ok(tx.tables().drawings.len() as u64)
    }
}
