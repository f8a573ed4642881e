use thiserror::Error;

/// Criteria weights of one rubric version must add up to exactly this many percent.
pub const TOTAL_WEIGHT: i32 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeightError {
    #[error("A rubric version needs at least one criterion")]
    NoCriteria,
    #[error("Criterion weights must be between 0 and {TOTAL_WEIGHT}, got {0}")]
    OutOfRange(i32),
    #[error("Criterion weights must sum to {TOTAL_WEIGHT}, got {0}")]
    WrongTotal(i64),
}

/// Check that a batch of criterion weights forms a valid rubric version.
///
/// The whole batch is rejected on the first problem found.
pub fn validate_weights<I>(weights: I) -> Result<(), WeightError>
where
    I: IntoIterator<Item = i32>,
{
    let mut total: i64 = 0;
    let mut count = 0usize;
    for weight in weights {
        if !(0..=TOTAL_WEIGHT).contains(&weight) {
            return Err(WeightError::OutOfRange(weight));
        }
        total += i64::from(weight);
        count += 1;
    }
    if count == 0 {
        return Err(WeightError::NoCriteria);
    }
    if total != i64::from(TOTAL_WEIGHT) {
        return Err(WeightError::WrongTotal(total));
    }
    Ok(())
}
