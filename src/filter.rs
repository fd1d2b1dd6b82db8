// src/filter.rs
use crate::models::{AccountStatus, AdminTransaction, AdminUser, Transaction};

/// Case-insensitive substring match against any field. An empty query matches.
pub fn matches(query: &str, fields: &[&str]) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// `status` of `None` or `"ALL"` keeps every status.
pub fn filter_users<'a>(
    users: &'a [AdminUser],
    query: &str,
    status: Option<&str>,
) -> Vec<&'a AdminUser> {
    let wanted = status.filter(|s| !s.eq_ignore_ascii_case("ALL"));
    users
        .iter()
        .filter(|user| matches(query, &[user.name.as_str(), user.email.as_str()]))
        .filter(|user| match wanted {
            Some(s) => user.status.as_str().eq_ignore_ascii_case(s),
            None => true,
        })
        .collect()
}

pub fn filter_admin_transactions<'a>(
    transactions: &'a [AdminTransaction],
    query: &str,
) -> Vec<&'a AdminTransaction> {
    transactions
        .iter()
        .filter(|tx| matches(query, &[tx.id.as_str(), tx.user.as_str()]))
        .collect()
}

pub fn filter_transactions<'a>(transactions: &'a [Transaction], query: &str) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|tx| {
            matches(
                query,
                &[tx.symbol.as_str(), tx.kind.as_str(), tx.status.as_str()],
            )
        })
        .collect()
}

pub fn is_known_status(status: &str) -> bool {
    status.eq_ignore_ascii_case("ALL")
        || [
            AccountStatus::Active,
            AccountStatus::Suspended,
            AccountStatus::Pending,
        ]
        .iter()
        .any(|s| s.as_str().eq_ignore_ascii_case(status))
}
