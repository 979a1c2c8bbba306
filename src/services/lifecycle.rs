//! Payment lifecycle of a reservation.
//!
//! A pure function over the reservation's money fields: any change to
//! `total` or `amount_paid` (new booking, edited items, a payment, a
//! payment correction) re-derives the balance and the Pending/Concluded
//! status from scratch.

use rust_decimal::Decimal;

use crate::models::{PaymentStatus, Reservation};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub balance_due: Decimal,
    pub status: PaymentStatus,
}

/// `balance_due = max(total − amount_paid, 0)`; Concluded iff the
/// balance is zero.
pub fn settle(total: Decimal, amount_paid: Decimal) -> Settlement {
    let balance_due = (total - amount_paid).max(Decimal::ZERO).round_dp(2);
    let status = if balance_due.is_zero() {
        PaymentStatus::Concluded
    } else {
        PaymentStatus::Pending
    };
    Settlement {
        balance_due,
        status,
    }
}

/// Re-derives a reservation's `balance_due` and `status` in place.
pub fn apply(reservation: &mut Reservation) {
    let settlement = settle(reservation.total, reservation.amount_paid);
    reservation.balance_due = settlement.balance_due;
    reservation.status = settlement.status;
}
