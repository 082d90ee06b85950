use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::token_ledger;

/// One signed token movement. Negative amounts are debits, positive are
/// credits. `balance_after` snapshots the materialized balance as of this
/// entry, which makes the trail auditable without replaying client logs.
#[derive(Deserialize, Queryable, Identifiable, Debug, Serialize, TS, Clone)]
#[diesel(table_name = token_ledger)]
#[ts(export)]
pub struct TokenLedgerEntry {
    pub id: i32,
    pub user_id: i32,
    pub amount: i32,
    pub reason: String,
    pub balance_after: i32,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = token_ledger)]
pub struct NewTokenLedgerEntry {
    pub user_id: i32,
    pub amount: i32,
    pub reason: String,
    pub balance_after: i32,
}

/// Outcome of a debit or credit, returned to the caller that needs the
/// post-mutation balance.
#[derive(Serialize, Deserialize, Debug, TS, Clone, Copy)]
#[ts(export)]
pub struct TokenMutation {
    pub user_id: i32,
    pub amount: i32,
    pub new_balance: i32,
}
