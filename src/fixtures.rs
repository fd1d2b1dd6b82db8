// src/fixtures.rs
//! Sample data served by the dashboard and the admin console.

use crate::models::{
    AccountStatus, AdminTransaction, AdminUser, HealthStatus, MarketQuote, PortfolioAsset,
    PortfolioUpsert, Role, ServiceHealth, StatCard, Transaction, TransactionStatus,
    TransactionType,
};
use chrono::{DateTime, Duration, Utc};

pub const DEMO_EMAIL: &str = "demo@m4capital.com";
pub const DEMO_PASSWORD: &str = "demo123";
pub const ADMIN_EMAIL: &str = "admin@m4capital.com";
pub const ADMIN_PASSWORD: &str = "admin123";

pub fn initial_quotes() -> Vec<MarketQuote> {
    [
        ("EUR/USD", "Euro/US Dollar", 1.0543, 0.15, 1_234_567),
        ("GBP/USD", "British Pound/US Dollar", 1.2789, -0.23, 987_654),
        ("USD/JPY", "US Dollar/Japanese Yen", 149.85, 0.45, 2_345_678),
        ("AUD/USD", "Australian Dollar/US Dollar", 0.6678, -0.12, 654_321),
        ("USD/CHF", "US Dollar/Swiss Franc", 0.8765, 0.08, 876_543),
    ]
    .into_iter()
    .map(|(symbol, name, price, change, volume)| MarketQuote {
        symbol: symbol.to_string(),
        name: name.to_string(),
        price,
        change,
        volume,
    })
    .collect()
}

pub fn portfolio_assets() -> Vec<PortfolioAsset> {
    [
        ("EUR/USD", 10100.0, 1.0, "#0ea5e9"),
        ("GBP/USD", 5100.0, 2.0, "#f59e0b"),
        ("USD/JPY", 7920.0, -1.0, "#10b981"),
        ("AUD/USD", 3090.0, 3.0, "#8b5cf6"),
        ("USD/CHF", 5940.0, -1.0, "#ef4444"),
        ("USD/CAD", 4080.0, 2.0, "#f97316"),
    ]
    .into_iter()
    .map(|(name, value, change, color)| PortfolioAsset {
        name: name.to_string(),
        value,
        change,
        color: color.to_string(),
    })
    .collect()
}

/// Holdings written for the demo account on first start.
pub fn demo_portfolio() -> Vec<PortfolioUpsert> {
    [
        ("EUR/USD", "Euro/US Dollar", 10000.0, 10000.0, 0.15),
        ("GBP/USD", "British Pound/US Dollar", 5000.0, 5100.0, 2.0),
        ("USD/JPY", "US Dollar/Japanese Yen", 8000.0, 7920.0, -1.0),
        ("AUD/USD", "Australian Dollar/US Dollar", 3000.0, 3090.0, 3.0),
        ("USD/CHF", "US Dollar/Swiss Franc", 6000.0, 5940.0, -1.0),
        ("USD/CAD", "US Dollar/Canadian Dollar", 4000.0, 4080.0, 2.0),
    ]
    .into_iter()
    .map(|(symbol, name, balance, value, change_24h)| PortfolioUpsert {
        symbol: symbol.to_string(),
        name: name.to_string(),
        balance,
        value,
        change_24h,
    })
    .collect()
}

/// Recent activity, timestamped relative to `now`.
pub fn recent_transactions(now: DateTime<Utc>) -> Vec<Transaction> {
    use TransactionStatus::*;
    use TransactionType::*;

    [
        ("1", Buy, "EUR/USD", 1000.0, 1.0543, 1054.30, Completed, Duration::minutes(30)),
        ("2", Sell, "GBP/USD", 500.0, 1.2789, 639.45, Completed, Duration::hours(2)),
        ("3", Deposit, "USD", 5000.0, 1.0, 5000.0, Pending, Duration::hours(6)),
        ("4", Buy, "USD/JPY", 750.0, 149.85, 112387.50, Failed, Duration::hours(12)),
        ("5", Withdrawal, "USD", 2000.0, 1.0, 2000.0, Completed, Duration::days(1)),
    ]
    .into_iter()
    .map(|(id, kind, symbol, amount, price, total, status, age)| {
        let timestamp = now - age;
        Transaction {
            id: id.to_string(),
            kind,
            symbol: symbol.to_string(),
            amount,
            price,
            total,
            status,
            timestamp,
            relative_time: relative_time(now, timestamp),
        }
    })
    .collect()
}

/// "Nm ago" under an hour, "Nh ago" under a day, "Nd ago" otherwise.
pub fn relative_time(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes();
    if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}

pub fn admin_users() -> Vec<AdminUser> {
    [
        ("1", "John Doe", "john.doe@example.com", Role::User, AccountStatus::Active, 15420.50, "2024-01-15", "2024-01-20"),
        ("2", "Jane Smith", "jane.smith@example.com", Role::User, AccountStatus::Active, 8750.25, "2024-01-10", "2024-01-19"),
        ("3", "Mike Johnson", "mike.johnson@example.com", Role::User, AccountStatus::Suspended, 2340.00, "2023-12-20", "2024-01-18"),
        ("4", "Sarah Wilson", "sarah.wilson@example.com", Role::Admin, AccountStatus::Active, 0.0, "2023-11-01", "2024-01-20"),
    ]
    .into_iter()
    .map(|(id, name, email, role, status, balance, join_date, last_login)| AdminUser {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
        status,
        balance,
        join_date: join_date.to_string(),
        last_login: last_login.to_string(),
    })
    .collect()
}

pub fn admin_transactions() -> Vec<AdminTransaction> {
    use TransactionStatus::*;
    use TransactionType::*;

    [
        ("TX001", "John Doe", Deposit, 5000.0, "USD", Completed, "2024-01-20 14:30:00", "Bank Transfer"),
        ("TX002", "Jane Smith", Withdrawal, 2500.0, "USD", Pending, "2024-01-20 13:15:00", "Crypto Wallet"),
        ("TX003", "Mike Johnson", Trade, 1000.0, "EUR", Completed, "2024-01-20 12:00:00", "EUR/USD"),
        ("TX004", "Sarah Wilson", Deposit, 10000.0, "USD", Failed, "2024-01-20 11:30:00", "Credit Card"),
    ]
    .into_iter()
    .map(|(id, user, kind, amount, currency, status, timestamp, method)| AdminTransaction {
        id: id.to_string(),
        user: user.to_string(),
        kind,
        amount,
        currency: currency.to_string(),
        status,
        timestamp: timestamp.to_string(),
        method: method.to_string(),
    })
    .collect()
}

fn stat(title: &str, value: f64, change: f64, prefix: Option<&str>, suffix: Option<&str>) -> StatCard {
    StatCard {
        title: title.to_string(),
        value,
        change,
        prefix: prefix.map(str::to_string),
        suffix: suffix.map(str::to_string),
    }
}

pub fn dashboard_stats() -> Vec<StatCard> {
    vec![
        stat("Total Balance", 41190.0, 2.5, Some("$"), None),
        stat("Total Profit", 3420.0, 12.3, Some("$"), None),
        stat("Active Trades", 8.0, 14.2, None, None),
        stat("Win Rate", 72.5, 5.1, None, Some("%")),
    ]
}

pub fn admin_stats() -> Vec<StatCard> {
    vec![
        stat("Total Users", 2547.0, 12.5, None, None),
        stat("Trading Volume (24h)", 89_500_000.0, 8.2, Some("$"), None),
        stat("Active Trades", 1247.0, -2.1, None, None),
        stat("Pending Issues", 23.0, -15.3, None, None),
    ]
}

pub fn system_health() -> Vec<ServiceHealth> {
    [
        ("API Server", HealthStatus::Healthy, 99.9, 120, "Main trading API server"),
        ("Database", HealthStatus::Healthy, 99.8, 45, "Primary portfolio database"),
        ("Market Data Feed", HealthStatus::Warning, 98.5, 200, "Real-time market data connection"),
        ("Security System", HealthStatus::Healthy, 100.0, 30, "Authentication and security services"),
    ]
    .into_iter()
    .map(|(name, status, uptime, response_time_ms, description)| ServiceHealth {
        name: name.to_string(),
        status,
        uptime,
        response_time_ms,
        description: description.to_string(),
    })
    .collect()
}
