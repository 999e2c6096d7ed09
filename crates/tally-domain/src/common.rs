//! Shared amount helpers and traits for double-entry primitives.

/// Tolerance used when comparing the two sides of the balance sheet.
pub const BALANCE_SHEET_TOLERANCE: f64 = 0.01;

/// Converts an amount to whole cents so totals can be compared exactly.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Returns true when two amounts are equal to the cent.
pub fn amounts_equal(left: f64, right: f64) -> bool {
    to_cents(left) == to_cents(right)
}

/// Rounds an amount to two decimals for presentation in reports.
pub fn round_cents(amount: f64) -> f64 {
    to_cents(amount) as f64 / 100.0
}

/// Supplies the debit and credit sides of an entry.
pub trait Sided {
    fn debit(&self) -> f64;
    fn credit(&self) -> f64;

    /// Net value under the credit-positive convention.
    fn net(&self) -> f64 {
        self.credit() - self.debit()
    }
}

/// Sums both sides of a slice of entries as `(debit, credit)`.
pub fn side_totals<T: Sided>(entries: &[T]) -> (f64, f64) {
    entries.iter().fold((0.0, 0.0), |(debit, credit), entry| {
        (debit + entry.debit(), credit + entry.credit())
    })
}

/// Returns true when the entries' debits equal their credits to the cent.
pub fn is_balanced<T: Sided>(entries: &[T]) -> bool {
    let (debit, credit) = side_totals(entries);
    amounts_equal(debit, credit)
}
