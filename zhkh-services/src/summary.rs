/// Aggregation of bills and payments
///
/// Totals are grouped by a key (service category or payment status) and keep
/// the order in which each key first appears, so a client sees categories in
/// the same order as the underlying rows.

use serde::{Deserialize, Serialize};
use zhkh_shared::models::bill::Bill;
use zhkh_shared::models::payment::{Payment, PaymentStatus};

/// Sum of amounts per service category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingTotal {
    pub services: Vec<CategoryTotal>,
    pub amount: f64,
}

/// Bills of an account with their totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingSummary {
    pub services: Vec<Bill>,
    pub total: BillingTotal,
}

/// Sum of amounts per payment status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTotal {
    pub status: PaymentStatus,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTotal {
    pub by_status: Vec<StatusTotal>,
    pub amount: f64,
}

/// Payments of an account with their totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub payments: Vec<Payment>,
    pub total: PaymentTotal,
}

/// Sums `(key, amount)` pairs per key, in first-seen key order
///
/// Returns the groups and the grand total.
pub fn group_totals<K, I>(items: I) -> (Vec<(K, f64)>, f64)
where
    K: PartialEq,
    I: IntoIterator<Item = (K, f64)>,
{
    let mut groups: Vec<(K, f64)> = Vec::new();
    let mut total = 0.0;

    for (key, amount) in items {
        total += amount;
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, sum)) => *sum += amount,
            None => groups.push((key, amount)),
        }
    }

    (groups, total)
}

/// Totals per service category
pub fn category_totals<'a, I>(items: I) -> (Vec<CategoryTotal>, f64)
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let (groups, total) = group_totals(items);
    let services = groups
        .into_iter()
        .map(|(kind, amount)| CategoryTotal {
            kind: kind.to_string(),
            amount,
        })
        .collect();
    (services, total)
}

pub fn summarize_bills(bills: Vec<Bill>) -> BillingSummary {
    let (services, amount) = category_totals(bills.iter().map(|b| (b.kind.as_str(), b.amount)));

    BillingSummary {
        services: bills,
        total: BillingTotal { services, amount },
    }
}

pub fn summarize_payments(payments: Vec<Payment>) -> PaymentSummary {
    let (groups, amount) = group_totals(payments.iter().map(|p| (p.status, p.amount)));
    let by_status = groups
        .into_iter()
        .map(|(status, amount)| StatusTotal { status, amount })
        .collect();

    PaymentSummary {
        payments,
        total: PaymentTotal { by_status, amount },
    }
}
