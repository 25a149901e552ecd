use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use tracing::info;

use super::{stamp_ranking, PersistError, PersistResult, SnapshotStore};
use crate::market_data::types::{
    Asset, AssetListSnapshot, AssetSnapshot, GlobalStats, GlobalStatsSnapshot,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS crypto_data (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        symbol           TEXT NOT NULL,
        price            REAL NOT NULL,
        price_change_24h REAL NOT NULL,
        market_cap       REAL NOT NULL,
        volume_24h       REAL NOT NULL,
        image            TEXT NOT NULL,
        last_updated     TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS top_assets (
        position         INTEGER PRIMARY KEY,
        asset_id         TEXT NOT NULL REFERENCES crypto_data(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS top_assets_meta (
        id               INTEGER PRIMARY KEY CHECK (id = 1),
        last_updated     TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS market_stats (
        id               INTEGER PRIMARY KEY CHECK (id = 1),
        total_market_cap REAL NOT NULL,
        total_volume     REAL NOT NULL,
        btc_dominance    REAL NOT NULL,
        active_cryptos   INTEGER NOT NULL,
        last_updated     TEXT NOT NULL
    )
    "#,
];

const ASSET_COLUMNS: &str =
    "id, name, symbol, price, price_change_24h, market_cap, volume_24h, image, last_updated";

/// Durable table backend. Survives restarts; the TTL still decides whether
/// a surviving row is served.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `database_url` (e.g. `sqlite://coinboard.db?mode=rwc`) and
    /// create the tables if needed.
    pub async fn connect(database_url: &str) -> PersistResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().max_connections(4).connect_with(options).await?;
        let store = Self { pool };
        store.migrate().await?;
        info!(database_url, "Opened sqlite snapshot store");
        Ok(store)
    }

    /// Private in-memory database. A single long-lived connection keeps the
    /// database alive for the lifetime of the pool.
    pub async fn in_memory() -> PersistResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> PersistResult<()> {
        for stmt in SCHEMA {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn encode_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn decode_ts(key: &str, raw: &str) -> PersistResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PersistError::Corrupt { key: key.to_string(), reason: e.to_string() })
}

fn asset_from_row(row: &SqliteRow) -> PersistResult<AssetSnapshot> {
    let id: String = row.try_get("id")?;
    let last_updated: String = row.try_get("last_updated")?;
    let last_updated = decode_ts(&id, &last_updated)?;

    Ok(AssetSnapshot {
        name: row.try_get("name")?,
        symbol: row.try_get("symbol")?,
        price: row.try_get("price")?,
        price_change_24h: row.try_get("price_change_24h")?,
        market_cap: row.try_get("market_cap")?,
        volume_24h: row.try_get("volume_24h")?,
        image: row.try_get("image")?,
        last_updated,
        id,
    })
}

async fn upsert_asset_rows(
    conn: &mut SqliteConnection,
    assets: &[Asset],
    stamp: &str,
) -> PersistResult<()> {
    for asset in assets {
        sqlx::query(
            r#"
            INSERT INTO crypto_data
                (id, name, symbol, price, price_change_24h, market_cap, volume_24h, image, last_updated)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                symbol = excluded.symbol,
                price = excluded.price,
                price_change_24h = excluded.price_change_24h,
                market_cap = excluded.market_cap,
                volume_24h = excluded.volume_24h,
                image = excluded.image,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(&asset.id)
        .bind(&asset.name)
        .bind(&asset.symbol)
        .bind(asset.price)
        .bind(asset.price_change_24h)
        .bind(asset.market_cap)
        .bind(asset.volume_24h)
        .bind(&asset.image)
        .bind(stamp)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    async fn get_assets(&self) -> PersistResult<Vec<AssetSnapshot>> {
        let rows = sqlx::query(&format!(
            "SELECT {ASSET_COLUMNS} FROM crypto_data ORDER BY market_cap DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(asset_from_row).collect()
    }

    async fn get_asset(&self, id: &str) -> PersistResult<Option<AssetSnapshot>> {
        let row = sqlx::query(&format!("SELECT {ASSET_COLUMNS} FROM crypto_data WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(asset_from_row).transpose()
    }

    async fn upsert_assets(
        &self,
        assets: &[Asset],
        at: DateTime<Utc>,
    ) -> PersistResult<Vec<AssetSnapshot>> {
        // one transaction per batch: either every row lands or none does
        let mut tx = self.pool.begin().await?;
        upsert_asset_rows(&mut *tx, assets, &encode_ts(at)).await?;
        tx.commit().await?;

        Ok(assets.iter().cloned().map(|a| a.stamp(at)).collect())
    }

    async fn get_top_assets(&self) -> PersistResult<Option<AssetListSnapshot>> {
        let meta: Option<String> =
            sqlx::query_scalar("SELECT last_updated FROM top_assets_meta WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        let Some(meta) = meta else {
            return Ok(None);
        };

        let rows = sqlx::query(&format!(
            r#"
            SELECT {ASSET_COLUMNS}
            FROM top_assets JOIN crypto_data ON crypto_data.id = top_assets.asset_id
            ORDER BY top_assets.position
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(AssetListSnapshot {
            assets: rows.iter().map(asset_from_row).collect::<PersistResult<_>>()?,
            last_updated: decode_ts("top_assets", &meta)?,
        }))
    }

    async fn replace_top_assets(
        &self,
        assets: &[Asset],
        at: DateTime<Utc>,
    ) -> PersistResult<AssetListSnapshot> {
        let list = stamp_ranking(assets, at);
        let stamp = encode_ts(at);

        let mut tx = self.pool.begin().await?;
        upsert_asset_rows(&mut *tx, assets, &stamp).await?;
        sqlx::query("DELETE FROM top_assets").execute(&mut *tx).await?;
        for (position, asset) in list.assets.iter().enumerate() {
            sqlx::query("INSERT INTO top_assets (position, asset_id) VALUES (?1, ?2)")
                .bind(position as i64)
                .bind(&asset.id)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query(
            r#"
            INSERT INTO top_assets_meta (id, last_updated) VALUES (1, ?1)
            ON CONFLICT(id) DO UPDATE SET last_updated = excluded.last_updated
            "#,
        )
        .bind(&stamp)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(list)
    }

    async fn get_market_stats(&self) -> PersistResult<Option<GlobalStatsSnapshot>> {
        let row = sqlx::query(
            r#"
            SELECT total_market_cap, total_volume, btc_dominance, active_cryptos, last_updated
            FROM market_stats
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let last_updated: String = row.try_get("last_updated")?;
        let active_cryptos: i64 = row.try_get("active_cryptos")?;
        Ok(Some(GlobalStatsSnapshot {
            total_market_cap: row.try_get("total_market_cap")?,
            total_volume: row.try_get("total_volume")?,
            btc_dominance: row.try_get("btc_dominance")?,
            active_cryptos: u64::try_from(active_cryptos).map_err(|e| PersistError::Corrupt {
                key: "market_stats".into(),
                reason: e.to_string(),
            })?,
            last_updated: decode_ts("market_stats", &last_updated)?,
        }))
    }

    async fn upsert_market_stats(
        &self,
        stats: &GlobalStats,
        at: DateTime<Utc>,
    ) -> PersistResult<GlobalStatsSnapshot> {
        let active_cryptos = i64::try_from(stats.active_cryptos).map_err(|e| PersistError::Corrupt {
            key: "market_stats".into(),
            reason: e.to_string(),
        })?;

        sqlx::query(
            r#"
            INSERT INTO market_stats
                (id, total_market_cap, total_volume, btc_dominance, active_cryptos, last_updated)
            VALUES (1, ?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                total_market_cap = excluded.total_market_cap,
                total_volume = excluded.total_volume,
                btc_dominance = excluded.btc_dominance,
                active_cryptos = excluded.active_cryptos,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(stats.total_market_cap)
        .bind(stats.total_volume)
        .bind(stats.btc_dominance)
        .bind(active_cryptos)
        .bind(encode_ts(at))
        .execute(&self.pool)
        .await?;

        Ok(stats.clone().stamp(at))
    }
}
