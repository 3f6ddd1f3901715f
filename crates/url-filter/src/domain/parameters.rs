//! Bloom filter false positive estimates
//!
//! Formulas:
//! - FPR = (1 - e^(-kn/m))^k    -- expected, from the insertion count
//! - FPR = (X/m)^k              -- observed, from the number of set bits X

/// Calculate the expected false positive rate for given parameters
///
/// Formula: FPR = (1 - e^(-kn/m))^k
pub fn calculate_fpr(m: usize, n: usize, k: usize) -> f64 {
    if m == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (n as f64) / (m as f64);
    (1.0 - exponent.exp()).powi(k as i32)
}

/// Estimate the false positive rate from the fill ratio of the bit array
///
/// Needs no insertion count, so it stays meaningful after a filter was
/// restored from disk.
pub fn fill_ratio_fpr(m: usize, bits_set: usize, k: usize) -> f64 {
    if m == 0 {
        return 1.0;
    }
    (bits_set as f64 / m as f64).powi(k as i32)
}
