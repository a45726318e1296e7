//! # PostgreSQL Kernel Store
//!
//! PostgreSQL implementation of [`KernelStore`] using sqlx.
//!
//! Layout follows the external contract: one row per trade, one row per
//! escrow account keyed by trade id, one append-only row per transition
//! event. The transition commit runs in a single database transaction
//! with optimistic locking on the trade's version column; event sequence
//! numbers come from a `BIGSERIAL`, so they are globally monotonic.

use crate::domain::entities::escrow::EscrowAccount;
use crate::domain::entities::quote::{Incoterms, Quote, QuoteStatus};
use crate::domain::entities::trade::{Trade, TradeDetails};
use crate::domain::events::transition_event::{TransitionEvent, TransitionOutcomeKind};
use crate::domain::value_objects::ids::{EventId, MilestoneId, PartyId, QuoteId, TradeId};
use crate::domain::value_objects::milestone::MilestoneSchedule;
use crate::domain::value_objects::money::{Currency, Money};
use crate::domain::value_objects::reason::ReasonCode;
use crate::domain::value_objects::stage::TradeStage;
use crate::domain::value_objects::timestamp::Timestamp;
use crate::infrastructure::persistence::traits::{
    KernelStore, RecordedEvent, StoreError, StoreResult,
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Schema bootstrap executed at startup.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS trades (
    id          TEXT PRIMARY KEY,
    details     TEXT NOT NULL,
    stage       TEXT NOT NULL,
    buyer       TEXT NOT NULL,
    seller      TEXT NOT NULL,
    amount      NUMERIC NOT NULL,
    currency    TEXT NOT NULL,
    schedule    TEXT NOT NULL,
    version     BIGINT NOT NULL,
    created_at  BIGINT NOT NULL,
    updated_at  BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS escrow_accounts (
    trade_id            TEXT PRIMARY KEY REFERENCES trades (id),
    held                NUMERIC NOT NULL,
    released            NUMERIC NOT NULL,
    currency            TEXT NOT NULL,
    released_milestones TEXT NOT NULL,
    updated_at          BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS quotes (
    id             TEXT PRIMARY KEY,
    trade_id       TEXT NOT NULL,
    supplier       TEXT NOT NULL,
    unit_price     NUMERIC NOT NULL,
    total_price    NUMERIC NOT NULL,
    currency       TEXT NOT NULL,
    lead_time_days BIGINT NOT NULL,
    incoterms      TEXT NOT NULL,
    status         TEXT NOT NULL,
    created_at     BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS transition_events (
    sequence    BIGSERIAL PRIMARY KEY,
    id          TEXT NOT NULL,
    trade_id    TEXT NOT NULL,
    from_stage  TEXT NOT NULL,
    to_stage    TEXT NOT NULL,
    outcome     TEXT NOT NULL,
    reason_code TEXT,
    actor       TEXT NOT NULL,
    occurred_at BIGINT NOT NULL
);

CREATE INDEX IF NOT EXISTS transition_events_trade_idx
    ON transition_events (trade_id, sequence DESC);
"#;

/// PostgreSQL implementation of [`KernelStore`].
///
/// Uses connection pooling via `sqlx::PgPool` and optimistic locking on
/// the trade version column.
#[derive(Debug, Clone)]
pub struct PostgresKernelStore {
    pool: PgPool,
}

impl PostgresKernelStore {
    /// Creates a new PostgreSQL kernel store.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns a query error if schema creation fails.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::query(e.to_string()))?;
        Ok(())
    }

    async fn insert_event_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event: &TransitionEvent,
    ) -> StoreResult<i64> {
        let (sequence,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO transition_events (
                id, trade_id, from_stage, to_stage, outcome, reason_code, actor, occurred_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING sequence
            "#,
        )
        .bind(event.id().to_string())
        .bind(event.trade_id().to_string())
        .bind(event.from_stage().to_string())
        .bind(event.to_stage().to_string())
        .bind(event.outcome().to_string())
        .bind(event.reason_code().map(|r| r.to_string()))
        .bind(event.actor().as_str())
        .bind(event.timestamp().timestamp_millis())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| StoreError::query(e.to_string()))?;
        Ok(sequence)
    }

    async fn upsert_escrow_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        escrow: &EscrowAccount,
    ) -> StoreResult<()> {
        let released_milestones = serde_json::to_string(escrow.released_milestones())
            .map_err(|e| StoreError::serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO escrow_accounts (
                trade_id, held, released, currency, released_milestones, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (trade_id) DO UPDATE SET
                held = EXCLUDED.held,
                released = EXCLUDED.released,
                released_milestones = EXCLUDED.released_milestones,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(escrow.trade_id().to_string())
        .bind(escrow.held().amount())
        .bind(escrow.released().amount())
        .bind(escrow.held().currency().as_str())
        .bind(&released_milestones)
        .bind(escrow.updated_at().timestamp_millis())
        .execute(&mut **tx)
        .await
        .map_err(|e| StoreError::query(e.to_string()))?;
        Ok(())
    }

    fn trade_binds(trade: &Trade) -> StoreResult<(String, String)> {
        let details = serde_json::to_string(trade.details())
            .map_err(|e| StoreError::serialization(e.to_string()))?;
        let schedule = serde_json::to_string(trade.schedule())
            .map_err(|e| StoreError::serialization(e.to_string()))?;
        Ok((details, schedule))
    }
}

#[async_trait]
impl KernelStore for PostgresKernelStore {
    async fn insert_trade(&self, trade: &Trade, escrow: &EscrowAccount) -> StoreResult<()> {
        let (details, schedule) = Self::trade_binds(trade)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO trades (
                id, details, stage, buyer, seller, amount, currency,
                schedule, version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(trade.id().to_string())
        .bind(&details)
        .bind(trade.stage().to_string())
        .bind(trade.buyer().as_str())
        .bind(trade.seller().as_str())
        .bind(trade.total().amount())
        .bind(trade.total().currency().as_str())
        .bind(&schedule)
        .bind(trade.version() as i64)
        .bind(trade.created_at().timestamp_millis())
        .bind(trade.updated_at().timestamp_millis())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(trade.id().to_string()));
        }

        Self::upsert_escrow_tx(&mut tx, escrow).await?;

        tx.commit()
            .await
            .map_err(|e| StoreError::query(e.to_string()))?;
        Ok(())
    }

    async fn get_trade(&self, id: &TradeId) -> StoreResult<Option<Trade>> {
        let row: Option<TradeRow> = sqlx::query_as(
            r#"
            SELECT id, details, stage, buyer, seller, amount, currency,
                   schedule, version, created_at, updated_at
            FROM trades WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::query(e.to_string()))?;

        row.map(TradeRow::try_into_trade).transpose()
    }

    async fn get_escrow(&self, trade_id: &TradeId) -> StoreResult<Option<EscrowAccount>> {
        let row: Option<EscrowRow> = sqlx::query_as(
            r#"
            SELECT trade_id, held, released, currency, released_milestones, updated_at
            FROM escrow_accounts WHERE trade_id = $1
            "#,
        )
        .bind(trade_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::query(e.to_string()))?;

        row.map(EscrowRow::try_into_escrow).transpose()
    }

    async fn save_escrow(&self, escrow: &EscrowAccount) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;
        Self::upsert_escrow_tx(&mut tx, escrow).await?;
        tx.commit()
            .await
            .map_err(|e| StoreError::query(e.to_string()))?;
        Ok(())
    }

    async fn save_quote(&self, quote: &Quote) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO quotes (
                id, trade_id, supplier, unit_price, total_price, currency,
                lead_time_days, incoterms, status, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status
            "#,
        )
        .bind(quote.id().to_string())
        .bind(quote.trade_id().to_string())
        .bind(quote.supplier().as_str())
        .bind(quote.unit_price().amount())
        .bind(quote.total_price().amount())
        .bind(quote.total_price().currency().as_str())
        .bind(i64::from(quote.lead_time_days()))
        .bind(quote.incoterms().to_string())
        .bind(quote.status().to_string())
        .bind(quote.created_at().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::query(e.to_string()))?;
        Ok(())
    }

    async fn get_quote(&self, id: &QuoteId) -> StoreResult<Option<Quote>> {
        let row: Option<QuoteRow> = sqlx::query_as(
            r#"
            SELECT id, trade_id, supplier, unit_price, total_price, currency,
                   lead_time_days, incoterms, status, created_at
            FROM quotes WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::query(e.to_string()))?;

        row.map(QuoteRow::try_into_quote).transpose()
    }

    async fn append_event(&self, event: TransitionEvent) -> StoreResult<RecordedEvent> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;
        let sequence = Self::insert_event_tx(&mut tx, &event).await?;
        tx.commit()
            .await
            .map_err(|e| StoreError::query(e.to_string()))?;

        Ok(RecordedEvent {
            sequence: sequence as u64,
            event,
        })
    }

    async fn commit_transition(
        &self,
        expected_version: u64,
        trade: &Trade,
        escrow: &EscrowAccount,
        event: TransitionEvent,
    ) -> StoreResult<RecordedEvent> {
        // The schedule is fixed at creation; only details and stage move.
        let details = serde_json::to_string(trade.details())
            .map_err(|e| StoreError::serialization(e.to_string()))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE trades SET
                details = $2,
                stage = $3,
                version = $4,
                updated_at = $5
            WHERE id = $1 AND version = $6
            "#,
        )
        .bind(trade.id().to_string())
        .bind(&details)
        .bind(trade.stage().to_string())
        .bind(trade.version() as i64)
        .bind(trade.updated_at().timestamp_millis())
        .bind(expected_version as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::query(e.to_string()))?;

        if result.rows_affected() == 0 {
            let stored: Option<(i64,)> =
                sqlx::query_as("SELECT version FROM trades WHERE id = $1")
                    .bind(trade.id().to_string())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| StoreError::query(e.to_string()))?;

            let actual = stored
                .map(|(version,)| version as u64)
                .unwrap_or_default();
            return Err(StoreError::version_conflict(
                "Trade",
                trade.id().to_string(),
                expected_version,
                actual,
            ));
        }

        Self::upsert_escrow_tx(&mut tx, escrow).await?;
        let sequence = Self::insert_event_tx(&mut tx, &event).await?;

        tx.commit()
            .await
            .map_err(|e| StoreError::query(e.to_string()))?;

        Ok(RecordedEvent {
            sequence: sequence as u64,
            event,
        })
    }

    async fn tail(&self, trade_id: &TradeId, limit: usize) -> StoreResult<Vec<RecordedEvent>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT sequence, id, trade_id, from_stage, to_stage, outcome,
                   reason_code, actor, occurred_at
            FROM transition_events
            WHERE trade_id = $1
            ORDER BY sequence DESC
            LIMIT $2
            "#,
        )
        .bind(trade_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::query(e.to_string()))?;

        rows.into_iter().map(EventRow::try_into_recorded).collect()
    }

    async fn count_events(&self) -> StoreResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transition_events")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::query(e.to_string()))?;
        Ok(count as u64)
    }
}

fn parse_uuid(value: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| StoreError::serialization(e.to_string()))
}

fn parse_money(amount: rust_decimal::Decimal, currency: &str) -> StoreResult<Money> {
    let currency =
        Currency::new(currency).map_err(|e| StoreError::serialization(e.to_string()))?;
    Money::new(amount, currency).map_err(|e| StoreError::serialization(e.to_string()))
}

fn parse_timestamp(millis: i64) -> StoreResult<Timestamp> {
    Timestamp::from_millis(millis)
        .ok_or_else(|| StoreError::serialization(format!("invalid timestamp: {millis}")))
}

fn parse_enum_text<T: serde::de::DeserializeOwned>(value: &str) -> StoreResult<T> {
    serde_json::from_str(&format!("\"{value}\""))
        .map_err(|e| StoreError::serialization(e.to_string()))
}

/// Row type for trade queries.
#[derive(Debug, sqlx::FromRow)]
struct TradeRow {
    id: String,
    details: String,
    stage: String,
    buyer: String,
    seller: String,
    amount: rust_decimal::Decimal,
    currency: String,
    schedule: String,
    version: i64,
    created_at: i64,
    updated_at: i64,
}

impl TradeRow {
    fn try_into_trade(self) -> StoreResult<Trade> {
        let id = TradeId::new(parse_uuid(&self.id)?);
        let details: TradeDetails = serde_json::from_str(&self.details)
            .map_err(|e| StoreError::serialization(e.to_string()))?;
        let stage: TradeStage = self
            .stage
            .parse()
            .map_err(|e: crate::domain::value_objects::stage::InvalidTradeStageError| {
                StoreError::serialization(e.to_string())
            })?;
        let schedule: MilestoneSchedule = serde_json::from_str(&self.schedule)
            .map_err(|e| StoreError::serialization(e.to_string()))?;
        let total = parse_money(self.amount, &self.currency)?;

        Ok(Trade::from_parts(
            id,
            details,
            stage,
            PartyId::new(self.buyer),
            PartyId::new(self.seller),
            total,
            schedule,
            self.version as u64,
            parse_timestamp(self.created_at)?,
            parse_timestamp(self.updated_at)?,
        ))
    }
}

/// Row type for escrow queries.
#[derive(Debug, sqlx::FromRow)]
struct EscrowRow {
    trade_id: String,
    held: rust_decimal::Decimal,
    released: rust_decimal::Decimal,
    currency: String,
    released_milestones: String,
    updated_at: i64,
}

impl EscrowRow {
    fn try_into_escrow(self) -> StoreResult<EscrowAccount> {
        let trade_id = TradeId::new(parse_uuid(&self.trade_id)?);
        let held = parse_money(self.held, &self.currency)?;
        let released = parse_money(self.released, &self.currency)?;
        let released_milestones: Vec<MilestoneId> =
            serde_json::from_str(&self.released_milestones)
                .map_err(|e| StoreError::serialization(e.to_string()))?;

        Ok(EscrowAccount::from_parts(
            trade_id,
            held,
            released,
            released_milestones,
            parse_timestamp(self.updated_at)?,
        ))
    }
}

/// Row type for quote queries.
#[derive(Debug, sqlx::FromRow)]
struct QuoteRow {
    id: String,
    trade_id: String,
    supplier: String,
    unit_price: rust_decimal::Decimal,
    total_price: rust_decimal::Decimal,
    currency: String,
    lead_time_days: i64,
    incoterms: String,
    status: String,
    created_at: i64,
}

impl QuoteRow {
    fn try_into_quote(self) -> StoreResult<Quote> {
        let id = QuoteId::new(parse_uuid(&self.id)?);
        let trade_id = TradeId::new(parse_uuid(&self.trade_id)?);
        let unit_price = parse_money(self.unit_price, &self.currency)?;
        let total_price = parse_money(self.total_price, &self.currency)?;
        let incoterms: Incoterms = parse_enum_text(&self.incoterms)?;
        let status: QuoteStatus = parse_enum_text(&self.status)?;

        Ok(Quote::from_parts(
            id,
            trade_id,
            PartyId::new(self.supplier),
            unit_price,
            total_price,
            self.lead_time_days as u32,
            incoterms,
            status,
            parse_timestamp(self.created_at)?,
        ))
    }
}

/// Row type for event queries.
#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    sequence: i64,
    id: String,
    trade_id: String,
    from_stage: String,
    to_stage: String,
    outcome: String,
    reason_code: Option<String>,
    actor: String,
    occurred_at: i64,
}

impl EventRow {
    fn try_into_recorded(self) -> StoreResult<RecordedEvent> {
        let id = EventId::new(parse_uuid(&self.id)?);
        let trade_id = TradeId::new(parse_uuid(&self.trade_id)?);
        let from_stage: TradeStage = parse_enum_text(&self.from_stage)?;
        let to_stage: TradeStage = parse_enum_text(&self.to_stage)?;
        let outcome: TransitionOutcomeKind = parse_enum_text(&self.outcome)?;
        let reason_code = self
            .reason_code
            .as_deref()
            .map(|code| {
                code.parse::<ReasonCode>()
                    .map_err(|e| StoreError::serialization(e.to_string()))
            })
            .transpose()?;

        let event = TransitionEvent::from_parts(
            id,
            trade_id,
            from_stage,
            to_stage,
            outcome,
            reason_code,
            PartyId::new(self.actor),
            parse_timestamp(self.occurred_at)?,
        );
        Ok(RecordedEvent {
            sequence: self.sequence as u64,
            event,
        })
    }
}
