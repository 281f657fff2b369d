//! Postgres-backed gateways.
//!
//! Circles and rectangles live in their own tables but draw identifiers from
//! one sequence (`shape_ids`), so a shape id is unique across variants. A
//! drawing's ownership of shapes is recorded in `drawing_shapes`, keyed by
//! shape id so each shape has at most one owner.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (read-only transaction) | `25006` | `ReadOnly` |
//! | Database (other) | any | `Database` |
//! | ColumnDecode / Decode | N/A | `Corrupt` |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` |
//! | Other | N/A | `Database` |

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use shapes_core::{
    Circle, Drawing, EntityId, IdentifiedEntity, Position, Rectangle, Shape, ShapeBase, ShapeKind,
    ShapeVariant,
};

use super::r#trait::{Gateway, StoreError, StoreResult, TransactionSource, TxMode};
use crate::config::StoreConfig;

const SCHEMA: &[&str] = &[
    "CREATE SEQUENCE IF NOT EXISTS shape_ids",
    r#"
    CREATE TABLE IF NOT EXISTS circles (
        id          BIGINT PRIMARY KEY DEFAULT nextval('shape_ids'),
        colour      TEXT NOT NULL,
        position_x  INTEGER NOT NULL,
        position_y  INTEGER NOT NULL,
        radius      INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS rectangles (
        id          BIGINT PRIMARY KEY DEFAULT nextval('shape_ids'),
        colour      TEXT NOT NULL,
        position_x  INTEGER NOT NULL,
        position_y  INTEGER NOT NULL,
        height      INTEGER NOT NULL,
        width       INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS drawings (
        id             BIGSERIAL PRIMARY KEY,
        name           TEXT NOT NULL,
        creation_date  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS drawing_shapes (
        shape_id    BIGINT PRIMARY KEY,
        shape_type  TEXT NOT NULL,
        drawing_id  BIGINT NOT NULL REFERENCES drawings (id) ON DELETE CASCADE
    )
    "#,
];

/// Shared connection pool and transaction source for the Postgres gateways.
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using the pool settings in `config`.
    pub async fn connect(database_url: &str, config: &StoreConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

/// Transaction over a [`PgDatabase`]. Rolled back by sqlx if dropped unfinished.
pub struct PgTx {
    inner: Transaction<'static, Postgres>,
}

impl PgTx {
    fn conn(&mut self) -> &mut PgConnection {
        &mut *self.inner
    }
}

#[async_trait]
impl TransactionSource for PgDatabase {
    type Tx = PgTx;

    async fn begin(&self, mode: TxMode) -> StoreResult<PgTx> {
        let mut inner = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        if mode == TxMode::ReadOnly {
            sqlx::query("SET TRANSACTION READ ONLY")
                .execute(&mut *inner)
                .await
                .map_err(|e| map_sqlx_error("set_read_only", e))?;
        }

        Ok(PgTx { inner })
    }

    async fn commit(&self, tx: PgTx) -> StoreResult<()> {
        tx.inner
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(&self, tx: PgTx) -> StoreResult<()> {
        tx.inner
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

// -------------------------
// Shape rows
// -------------------------

fn table(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Circle => "circles",
        ShapeKind::Rectangle => "rectangles",
    }
}

#[derive(Debug)]
struct CircleRow {
    id: i64,
    colour: String,
    position_x: i32,
    position_y: i32,
    radius: i32,
}

impl<'r> FromRow<'r, PgRow> for CircleRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CircleRow {
            id: row.try_get("id")?,
            colour: row.try_get("colour")?,
            position_x: row.try_get("position_x")?,
            position_y: row.try_get("position_y")?,
            radius: row.try_get("radius")?,
        })
    }
}

impl From<CircleRow> for Shape {
    fn from(row: CircleRow) -> Self {
        Shape::Circle(Circle {
            base: ShapeBase {
                id: Some(EntityId::from_i64(row.id)),
                colour: row.colour,
                position: Position::new(row.position_x, row.position_y),
            },
            radius: row.radius,
        })
    }
}

#[derive(Debug)]
struct RectangleRow {
    id: i64,
    colour: String,
    position_x: i32,
    position_y: i32,
    height: i32,
    width: i32,
}

impl<'r> FromRow<'r, PgRow> for RectangleRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(RectangleRow {
            id: row.try_get("id")?,
            colour: row.try_get("colour")?,
            position_x: row.try_get("position_x")?,
            position_y: row.try_get("position_y")?,
            height: row.try_get("height")?,
            width: row.try_get("width")?,
        })
    }
}

impl From<RectangleRow> for Shape {
    fn from(row: RectangleRow) -> Self {
        Shape::Rectangle(Rectangle {
            base: ShapeBase {
                id: Some(EntityId::from_i64(row.id)),
                colour: row.colour,
                position: Position::new(row.position_x, row.position_y),
            },
            height: row.height,
            width: row.width,
        })
    }
}

const CIRCLE_COLUMNS: &str = "id, colour, position_x, position_y, radius";
const RECTANGLE_COLUMNS: &str = "id, colour, position_x, position_y, height, width";

async fn insert_shape(conn: &mut PgConnection, mut shape: Shape) -> StoreResult<Shape> {
    let row = match &shape {
        Shape::Circle(c) => sqlx::query(
            "INSERT INTO circles (colour, position_x, position_y, radius) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&c.base.colour)
        .bind(c.base.position.x)
        .bind(c.base.position.y)
        .bind(c.radius)
        .fetch_one(&mut *conn)
        .await,
        Shape::Rectangle(r) => sqlx::query(
            "INSERT INTO rectangles (colour, position_x, position_y, height, width) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&r.base.colour)
        .bind(r.base.position.x)
        .bind(r.base.position.y)
        .bind(r.height)
        .bind(r.width)
        .fetch_one(&mut *conn)
        .await,
    }
    .map_err(|e| map_sqlx_error("insert_shape", e))?;

    let id: i64 = row
        .try_get("id")
        .map_err(|e| map_sqlx_error("insert_shape", e))?;
    shape.set_id(Some(EntityId::from_i64(id)));
    Ok(shape)
}

/// Overwrites the row with the shape's id. Returns whether a row matched.
async fn update_shape(conn: &mut PgConnection, id: EntityId, shape: &Shape) -> StoreResult<bool> {
    let result = match shape {
        Shape::Circle(c) => sqlx::query(
            "UPDATE circles SET colour = $2, position_x = $3, position_y = $4, radius = $5 \
             WHERE id = $1",
        )
        .bind(id.as_i64())
        .bind(&c.base.colour)
        .bind(c.base.position.x)
        .bind(c.base.position.y)
        .bind(c.radius)
        .execute(&mut *conn)
        .await,
        Shape::Rectangle(r) => sqlx::query(
            "UPDATE rectangles SET colour = $2, position_x = $3, position_y = $4, \
             height = $5, width = $6 WHERE id = $1",
        )
        .bind(id.as_i64())
        .bind(&r.base.colour)
        .bind(r.base.position.x)
        .bind(r.base.position.y)
        .bind(r.height)
        .bind(r.width)
        .execute(&mut *conn)
        .await,
    }
    .map_err(|e| map_sqlx_error("update_shape", e))?;

    Ok(result.rows_affected() > 0)
}

/// Overwrites the row when it exists, otherwise inserts with a fresh id.
async fn merge_shape(conn: &mut PgConnection, shape: Shape) -> StoreResult<Shape> {
    if let Some(id) = shape.id() {
        if update_shape(conn, id, &shape).await? {
            return Ok(shape);
        }
    }
    insert_shape(conn, shape).await
}

async fn fetch_shape(
    conn: &mut PgConnection,
    kind: ShapeKind,
    id: EntityId,
) -> StoreResult<Option<Shape>> {
    let shape = match kind {
        ShapeKind::Circle => {
            sqlx::query_as::<_, CircleRow>(&format!(
                "SELECT {CIRCLE_COLUMNS} FROM circles WHERE id = $1"
            ))
            .bind(id.as_i64())
            .fetch_optional(&mut *conn)
            .await
            .map(|row| row.map(Shape::from))
        }
        ShapeKind::Rectangle => {
            sqlx::query_as::<_, RectangleRow>(&format!(
                "SELECT {RECTANGLE_COLUMNS} FROM rectangles WHERE id = $1"
            ))
            .bind(id.as_i64())
            .fetch_optional(&mut *conn)
            .await
            .map(|row| row.map(Shape::from))
        }
    };
    shape.map_err(|e| map_sqlx_error("fetch_shape", e))
}

async fn fetch_shapes(conn: &mut PgConnection, kind: ShapeKind) -> StoreResult<Vec<Shape>> {
    let shapes = match kind {
        ShapeKind::Circle => {
            sqlx::query_as::<_, CircleRow>(&format!(
                "SELECT {CIRCLE_COLUMNS} FROM circles ORDER BY id"
            ))
            .fetch_all(&mut *conn)
            .await
            .map(|rows| rows.into_iter().map(Shape::from).collect())
        }
        ShapeKind::Rectangle => {
            sqlx::query_as::<_, RectangleRow>(&format!(
                "SELECT {RECTANGLE_COLUMNS} FROM rectangles ORDER BY id"
            ))
            .fetch_all(&mut *conn)
            .await
            .map(|rows| rows.into_iter().map(Shape::from).collect())
        }
    };
    shapes.map_err(|e| map_sqlx_error("fetch_shapes", e))
}

/// Shapes owned by a drawing, ordered by id.
async fn fetch_owned_shapes(conn: &mut PgConnection, drawing_id: EntityId) -> StoreResult<Vec<Shape>> {
    let circles = sqlx::query_as::<_, CircleRow>(
        "SELECT c.id, c.colour, c.position_x, c.position_y, c.radius \
         FROM circles c JOIN drawing_shapes ds ON ds.shape_id = c.id \
         WHERE ds.drawing_id = $1",
    )
    .bind(drawing_id.as_i64())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("fetch_owned_circles", e))?;

    let rectangles = sqlx::query_as::<_, RectangleRow>(
        "SELECT r.id, r.colour, r.position_x, r.position_y, r.height, r.width \
         FROM rectangles r JOIN drawing_shapes ds ON ds.shape_id = r.id \
         WHERE ds.drawing_id = $1",
    )
    .bind(drawing_id.as_i64())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("fetch_owned_rectangles", e))?;

    let mut shapes: Vec<Shape> = circles
        .into_iter()
        .map(Shape::from)
        .chain(rectangles.into_iter().map(Shape::from))
        .collect();
    shapes.sort_by_key(|s| s.id());
    Ok(shapes)
}

/// Deletes a shape row and detaches it from whichever drawing owned it.
async fn delete_shape(conn: &mut PgConnection, kind: ShapeKind, id: EntityId) -> StoreResult<()> {
    sqlx::query("DELETE FROM drawing_shapes WHERE shape_id = $1 AND shape_type = $2")
        .bind(id.as_i64())
        .bind(kind.as_str())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("detach_shape", e))?;

    sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table(kind)))
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("delete_shape", e))?;
    Ok(())
}

async fn delete_shapes(conn: &mut PgConnection, kind: ShapeKind) -> StoreResult<()> {
    sqlx::query("DELETE FROM drawing_shapes WHERE shape_type = $1")
        .bind(kind.as_str())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("detach_shapes", e))?;

    sqlx::query(&format!("DELETE FROM {}", table(kind)))
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("delete_shapes", e))?;
    Ok(())
}

async fn count_rows(conn: &mut PgConnection, table: &str) -> StoreResult<u64> {
    let row = sqlx::query(&format!("SELECT COUNT(*) AS total FROM {table}"))
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("count", e))?;
    let total: i64 = row.try_get("total").map_err(|e| map_sqlx_error("count", e))?;
    Ok(total as u64)
}

fn extract<E: ShapeVariant>(shape: Shape) -> StoreResult<E> {
    let kind = shape.kind();
    E::from_shape(shape).ok_or_else(|| {
        StoreError::Corrupt(format!("expected {} row, found {}", E::SHAPE_KIND, kind))
    })
}

/// Gateway for one shape variant (circles or rectangles).
#[derive(Debug)]
pub struct PgShapeGateway<E> {
    db: Arc<PgDatabase>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> PgShapeGateway<E> {
    pub fn new(db: Arc<PgDatabase>) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

delegate_transactions!(PgShapeGateway<E>, PgTx, E);

#[async_trait]
impl<E> Gateway<E> for PgShapeGateway<E>
where
    E: ShapeVariant,
{
    #[instrument(skip_all, fields(kind = E::KIND, id = ?entity.id()), err)]
    async fn save(&self, tx: &mut PgTx, entity: E) -> StoreResult<E> {
        extract(merge_shape(tx.conn(), entity.into()).await?)
    }

    #[instrument(skip_all, fields(kind = E::KIND, id = ?entity.id()), err)]
    async fn persist_or_update(&self, tx: &mut PgTx, entity: E) -> StoreResult<E> {
        let shape: Shape = entity.into();
        match shape.id() {
            None => extract(insert_shape(tx.conn(), shape).await?),
            Some(id) => {
                if update_shape(tx.conn(), id, &shape).await? {
                    extract(shape)
                } else {
                    Err(StoreError::Missing { kind: E::KIND, id })
                }
            }
        }
    }

    #[instrument(skip(self, tx), fields(kind = E::KIND), err)]
    async fn find_by_id(&self, tx: &mut PgTx, id: EntityId) -> StoreResult<Option<E>> {
        Ok(fetch_shape(tx.conn(), E::SHAPE_KIND, id)
            .await?
            .and_then(E::from_shape))
    }

    #[instrument(skip_all, fields(kind = E::KIND), err)]
    async fn find_all(&self, tx: &mut PgTx) -> StoreResult<Vec<E>> {
        Ok(fetch_shapes(tx.conn(), E::SHAPE_KIND)
            .await?
            .into_iter()
            .filter_map(E::from_shape)
            .collect())
    }

    #[instrument(skip(self, tx), fields(kind = E::KIND), err)]
    async fn delete_by_id(&self, tx: &mut PgTx, id: EntityId) -> StoreResult<()> {
        delete_shape(tx.conn(), E::SHAPE_KIND, id).await
    }

    #[instrument(skip_all, fields(kind = E::KIND), err)]
    async fn delete_all(&self, tx: &mut PgTx) -> StoreResult<()> {
        delete_shapes(tx.conn(), E::SHAPE_KIND).await
    }

    async fn count(&self, tx: &mut PgTx) -> StoreResult<u64> {
        count_rows(tx.conn(), table(E::SHAPE_KIND)).await
    }
}

// -------------------------
// Drawings
// -------------------------

#[derive(Debug)]
struct DrawingRow {
    id: i64,
    name: String,
    creation_date: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for DrawingRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(DrawingRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            creation_date: row.try_get("creation_date")?,
        })
    }
}

async fn insert_drawing_row(conn: &mut PgConnection, drawing: &Drawing) -> StoreResult<EntityId> {
    let row = sqlx::query("INSERT INTO drawings (name, creation_date) VALUES ($1, $2) RETURNING id")
        .bind(&drawing.name)
        .bind(drawing.creation_date)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("insert_drawing", e))?;
    let id: i64 = row
        .try_get("id")
        .map_err(|e| map_sqlx_error("insert_drawing", e))?;
    Ok(EntityId::from_i64(id))
}

async fn update_drawing_row(conn: &mut PgConnection, id: EntityId, drawing: &Drawing) -> StoreResult<bool> {
    let result = sqlx::query("UPDATE drawings SET name = $2, creation_date = $3 WHERE id = $1")
        .bind(id.as_i64())
        .bind(&drawing.name)
        .bind(drawing.creation_date)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("update_drawing", e))?;
    Ok(result.rows_affected() > 0)
}

/// Reconciles the shapes owned by an already written drawing row.
///
/// Shapes linked before but absent now are deleted; every present shape is
/// merged and (re)linked to this drawing, taking it from any previous owner.
async fn reconcile_shapes(
    conn: &mut PgConnection,
    id: EntityId,
    mut drawing: Drawing,
) -> StoreResult<Drawing> {
    drawing.dedup_shapes();

    let previous = sqlx::query("SELECT shape_id, shape_type FROM drawing_shapes WHERE drawing_id = $1")
        .bind(id.as_i64())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("load_links", e))?;

    let mut shapes = Vec::with_capacity(drawing.shapes.len());
    for shape in drawing.shapes {
        let saved = merge_shape(conn, shape).await?;
        if let Some(shape_id) = saved.id() {
            sqlx::query(
                "INSERT INTO drawing_shapes (shape_id, shape_type, drawing_id) VALUES ($1, $2, $3) \
                 ON CONFLICT (shape_id) DO UPDATE \
                 SET drawing_id = EXCLUDED.drawing_id, shape_type = EXCLUDED.shape_type",
            )
            .bind(shape_id.as_i64())
            .bind(saved.kind().as_str())
            .bind(id.as_i64())
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("link_shape", e))?;
        }
        shapes.push(saved);
    }

    for row in previous {
        let shape_id = EntityId::from_i64(row.try_get("shape_id").map_err(|e| map_sqlx_error("load_links", e))?);
        let shape_type: String = row.try_get("shape_type").map_err(|e| map_sqlx_error("load_links", e))?;
        let kind = ShapeKind::parse(&shape_type)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown shape_type '{shape_type}'")))?;
        if shapes.iter().any(|s| s.kind() == kind && s.id() == Some(shape_id)) {
            continue;
        }
        tracing::debug!(drawing_id = %id, shape_id = %shape_id, "removing orphaned shape");
        delete_shape(conn, kind, shape_id).await?;
    }

    Ok(Drawing {
        id: Some(id),
        name: drawing.name,
        creation_date: drawing.creation_date,
        shapes,
    })
}

async fn load_drawing(conn: &mut PgConnection, row: DrawingRow) -> StoreResult<Drawing> {
    let id = EntityId::from_i64(row.id);
    Ok(Drawing {
        id: Some(id),
        name: row.name,
        creation_date: row.creation_date,
        shapes: fetch_owned_shapes(conn, id).await?,
    })
}

/// Gateway for drawings, cascading writes and deletes to owned shapes.
#[derive(Debug)]
pub struct PgDrawingGateway {
    db: Arc<PgDatabase>,
}

impl PgDrawingGateway {
    pub fn new(db: Arc<PgDatabase>) -> Self {
        Self { db }
    }
}

delegate_transactions!(PgDrawingGateway, PgTx);

#[async_trait]
impl Gateway<Drawing> for PgDrawingGateway {
    #[instrument(skip_all, fields(id = ?drawing.id, shapes = drawing.shapes.len()), err)]
    async fn save(&self, tx: &mut PgTx, drawing: Drawing) -> StoreResult<Drawing> {
        let conn = tx.conn();
        let existing = match drawing.id {
            Some(id) if update_drawing_row(conn, id, &drawing).await? => Some(id),
            _ => None,
        };
        let id = match existing {
            Some(id) => id,
            None => insert_drawing_row(conn, &drawing).await?,
        };
        reconcile_shapes(conn, id, drawing).await
    }

    #[instrument(skip_all, fields(id = ?drawing.id, shapes = drawing.shapes.len()), err)]
    async fn persist_or_update(&self, tx: &mut PgTx, drawing: Drawing) -> StoreResult<Drawing> {
        let conn = tx.conn();
        let id = match drawing.id {
            None => insert_drawing_row(conn, &drawing).await?,
            Some(id) => {
                if !update_drawing_row(conn, id, &drawing).await? {
                    return Err(StoreError::Missing {
                        kind: Drawing::KIND,
                        id,
                    });
                }
                id
            }
        };
        reconcile_shapes(conn, id, drawing).await
    }

    #[instrument(skip(self, tx), err)]
    async fn find_by_id(&self, tx: &mut PgTx, id: EntityId) -> StoreResult<Option<Drawing>> {
        let conn = tx.conn();
        let row = sqlx::query_as::<_, DrawingRow>(
            "SELECT id, name, creation_date FROM drawings WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("find_drawing", e))?;

        match row {
            Some(row) => Ok(Some(load_drawing(conn, row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip_all, err)]
    async fn find_all(&self, tx: &mut PgTx) -> StoreResult<Vec<Drawing>> {
        let conn = tx.conn();
        let rows = sqlx::query_as::<_, DrawingRow>(
            "SELECT id, name, creation_date FROM drawings ORDER BY id",
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("find_drawings", e))?;

        let mut drawings = Vec::with_capacity(rows.len());
        for row in rows {
            drawings.push(load_drawing(conn, row).await?);
        }
        Ok(drawings)
    }

    #[instrument(skip(self, tx), err)]
    async fn delete_by_id(&self, tx: &mut PgTx, id: EntityId) -> StoreResult<()> {
        let conn = tx.conn();
        for kind in ShapeKind::ALL {
            sqlx::query(&format!(
                "DELETE FROM {} WHERE id IN \
                 (SELECT shape_id FROM drawing_shapes WHERE drawing_id = $1 AND shape_type = $2)",
                table(kind)
            ))
            .bind(id.as_i64())
            .bind(kind.as_str())
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("delete_owned_shapes", e))?;
        }

        // Links go with the drawing row (ON DELETE CASCADE).
        sqlx::query("DELETE FROM drawings WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("delete_drawing", e))?;
        Ok(())
    }

    #[instrument(skip_all, err)]
    async fn delete_all(&self, tx: &mut PgTx) -> StoreResult<()> {
        let conn = tx.conn();
        for kind in ShapeKind::ALL {
            sqlx::query(&format!(
                "DELETE FROM {} WHERE id IN \
                 (SELECT shape_id FROM drawing_shapes WHERE shape_type = $1)",
                table(kind)
            ))
            .bind(kind.as_str())
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("delete_owned_shapes", e))?;
        }

        sqlx::query("DELETE FROM drawings")
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("delete_drawings", e))?;
        Ok(())
    }

    async fn count(&self, tx: &mut PgTx) -> StoreResult<u64> {
        count_rows(tx.conn(), "drawings").await
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().is_some_and(|code| code.as_ref() == "25006") {
                return StoreError::ReadOnly;
            }
            StoreError::Database(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(format!("decode error in {}: {}", operation, err))
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{} in {}", err, operation))
        }
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}
