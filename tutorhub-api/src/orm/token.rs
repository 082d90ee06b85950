//! Token balance primitive.
//!
//! Every debit and credit is one transaction that appends a signed
//! `token_ledger` row and updates the materialized `users.token_balance` in
//! the same unit. Concurrent mutations against one user serialize on the
//! database transaction. Callers composing larger workflows (cancellation,
//! rejection) invoke these inside their own transaction; Diesel turns the
//! nested call into a savepoint.

use diesel::prelude::*;

use crate::error::BookingError;
use crate::models::{NewTokenLedgerEntry, TokenLedgerEntry, TokenMutation};
use crate::orm::user::get_user;

/// Debits `amount` tokens from a user. Fails with `InsufficientBalance`
/// when the debit would push the balance negative.
pub fn deduct_tokens(
    conn: &mut SqliteConnection,
    target_user_id: i32,
    amount: i32,
    reason: &str,
) -> Result<TokenMutation, BookingError> {
    if amount <= 0 {
        return Err(BookingError::Validation(
            "deduction amount must be positive".to_string(),
        ));
    }

    conn.transaction(|conn| {
        let user = get_user(conn, target_user_id)?.ok_or(BookingError::NotFound("user"))?;

        if user.token_balance < amount {
            return Err(BookingError::InsufficientBalance {
                balance: user.token_balance,
                required: amount,
            });
        }

        apply_ledger_entry(conn, target_user_id, -amount, reason, user.token_balance - amount)
    })
}

/// Credits `amount` tokens back to a user (cancellation or rejection
/// refunds, admin grants).
pub fn refund_tokens(
    conn: &mut SqliteConnection,
    target_user_id: i32,
    amount: i32,
    reason: &str,
) -> Result<TokenMutation, BookingError> {
    if amount <= 0 {
        return Err(BookingError::Validation(
            "refund amount must be positive".to_string(),
        ));
    }

    conn.transaction(|conn| {
        let user = get_user(conn, target_user_id)?.ok_or(BookingError::NotFound("user"))?;
        apply_ledger_entry(conn, target_user_id, amount, reason, user.token_balance + amount)
    })
}

/// Writes one ledger row and the matching materialized balance. Must run
/// inside a transaction that already read the current balance.
fn apply_ledger_entry(
    conn: &mut SqliteConnection,
    target_user_id: i32,
    signed_amount: i32,
    reason_text: &str,
    new_balance: i32,
) -> Result<TokenMutation, BookingError> {
    use crate::schema::token_ledger::dsl::token_ledger;
    use crate::schema::users::dsl::{id, token_balance, users};

    let entry = NewTokenLedgerEntry {
        user_id: target_user_id,
        amount: signed_amount,
        reason: reason_text.to_string(),
        balance_after: new_balance,
    };

    diesel::insert_into(token_ledger).values(&entry).execute(conn)?;

    diesel::update(users.filter(id.eq(target_user_id)))
        .set(token_balance.eq(new_balance))
        .execute(conn)?;

    Ok(TokenMutation {
        user_id: target_user_id,
        amount: signed_amount,
        new_balance,
    })
}

/// Gets a user's current materialized balance.
pub fn get_token_balance(
    conn: &mut SqliteConnection,
    target_user_id: i32,
) -> Result<i32, BookingError> {
    let user = get_user(conn, target_user_id)?.ok_or(BookingError::NotFound("user"))?;
    Ok(user.token_balance)
}

/// Returns a user's ledger entries, newest first.
pub fn get_token_ledger(
    conn: &mut SqliteConnection,
    target_user_id: i32,
) -> Result<Vec<TokenLedgerEntry>, diesel::result::Error> {
    use crate::schema::token_ledger::dsl::*;
    token_ledger
        .filter(user_id.eq(target_user_id))
        .order(id.desc())
        .load::<TokenLedgerEntry>(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserInput;
    use crate::orm::testing::establish_test_connection;
    use crate::orm::user::insert_user;

    fn seed_student(conn: &mut SqliteConnection, balance: i32) -> i32 {
        insert_user(
            conn,
            UserInput {
                name: "Ledger Student".to_string(),
                email: format!("ledger-{}@example.com", balance),
                role: "student".to_string(),
                token_balance: balance,
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn deduct_and_refund_round_trip() {
        let mut conn = establish_test_connection();
        let uid = seed_student(&mut conn, 100);

        let debit = deduct_tokens(&mut conn, uid, 40, "session booking").unwrap();
        assert_eq!(debit.new_balance, 60);

        let credit = refund_tokens(&mut conn, uid, 40, "session cancelled").unwrap();
        assert_eq!(credit.new_balance, 100);
        assert_eq!(get_token_balance(&mut conn, uid).unwrap(), 100);
    }

    #[test]
    fn deduct_rejects_overdraft() {
        let mut conn = establish_test_connection();
        let uid = seed_student(&mut conn, 30);

        let err = deduct_tokens(&mut conn, uid, 31, "too much").unwrap_err();
        assert!(matches!(
            err,
            BookingError::InsufficientBalance { balance: 30, required: 31 }
        ));
        // Failed debit leaves no trace in the ledger.
        assert_eq!(get_token_balance(&mut conn, uid).unwrap(), 30);
        assert!(get_token_ledger(&mut conn, uid).unwrap().is_empty());
    }

    #[test]
    fn ledger_snapshots_reconcile_with_balance() {
        let mut conn = establish_test_connection();
        let uid = seed_student(&mut conn, 50);

        deduct_tokens(&mut conn, uid, 20, "booking").unwrap();
        refund_tokens(&mut conn, uid, 5, "partial credit").unwrap();
        deduct_tokens(&mut conn, uid, 10, "another booking").unwrap();

        let entries = get_token_ledger(&mut conn, uid).unwrap();
        assert_eq!(entries.len(), 3);
        // Newest first: each balance_after snapshot reflects the running sum.
        assert_eq!(entries[0].balance_after, 25);
        assert_eq!(entries[1].balance_after, 35);
        assert_eq!(entries[2].balance_after, 30);
        assert_eq!(get_token_balance(&mut conn, uid).unwrap(), 25);
    }

    #[test]
    fn mutations_reject_missing_user() {
        let mut conn = establish_test_connection();
        let err = deduct_tokens(&mut conn, 9999, 10, "ghost").unwrap_err();
        assert!(matches!(err, BookingError::NotFound("user")));
        let err = refund_tokens(&mut conn, 9999, 10, "ghost").unwrap_err();
        assert!(matches!(err, BookingError::NotFound("user")));
    }

    #[test]
    fn zero_and_negative_amounts_are_invalid() {
        let mut conn = establish_test_connection();
        let uid = seed_student(&mut conn, 10);
        assert!(matches!(
            deduct_tokens(&mut conn, uid, 0, "noop"),
            Err(BookingError::Validation(_))
        ));
        assert!(matches!(
            refund_tokens(&mut conn, uid, -5, "noop"),
            Err(BookingError::Validation(_))
        ));
    }
}
