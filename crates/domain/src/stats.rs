//! Statistics report types for the dashboard read side.

use serde::Serialize;

use crate::money::Money;
use crate::order::{OrderStatus, PaymentStatus};

/// Order count and successful-payment sales for one time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct PeriodTotals {
    pub orders: u64,
    /// Sum of `final_amount` over orders with `payment_status == Success`.
    pub sales: Money,
}

impl PeriodTotals {
    /// Folds one order into the window.
    pub fn record(&mut self, payment_status: PaymentStatus, final_amount: Money) {
        self.orders += 1;
        if payment_status == PaymentStatus::Success {
            self.sales += final_amount;
        }
    }
}

/// All-time order counts grouped by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct StatusBreakdown {
    pub pending: u64,
    pub processing: u64,
    pub delivered: u64,
    pub cancelled: u64,
}

impl StatusBreakdown {
    pub fn record(&mut self, status: OrderStatus) {
        match status {
            OrderStatus::Pending => self.pending += 1,
            OrderStatus::Processing => self.processing += 1,
            OrderStatus::Delivered => self.delivered += 1,
            OrderStatus::Cancelled => self.cancelled += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.pending + self.processing + self.delivered + self.cancelled
    }
}

/// The dashboard rollup over all committed orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct OrderStatistics {
    pub today: PeriodTotals,
    pub this_month: PeriodTotals,
    pub status_counts: StatusBreakdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_totals_count_all_but_sum_success_only() {
        let mut totals = PeriodTotals::default();
        totals.record(PaymentStatus::Success, Money::from_minor(1400));
        totals.record(PaymentStatus::Pending, Money::from_minor(900));
        totals.record(PaymentStatus::Failed, Money::from_minor(500));

        assert_eq!(totals.orders, 3);
        assert_eq!(totals.sales.minor(), 1400);
    }

    #[test]
    fn test_status_breakdown() {
        let mut counts = StatusBreakdown::default();
        counts.record(OrderStatus::Pending);
        counts.record(OrderStatus::Pending);
        counts.record(OrderStatus::Delivered);
        counts.record(OrderStatus::Cancelled);

        assert_eq!(counts.pending, 2);
        assert_eq!(counts.processing, 0);
        assert_eq!(counts.delivered, 1);
        assert_eq!(counts.cancelled, 1);
        assert_eq!(counts.total(), 4);
    }
}
