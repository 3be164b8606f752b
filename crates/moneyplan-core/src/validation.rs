//! Title and amount bounds shared by entries, budget lines and usernames

use crate::models::Status;

pub const TITLE_MIN_CHARS: usize = 2;
pub const TITLE_MAX_CHARS: usize = 50;
pub const AMOUNT_MIN: f64 = 1.0;
pub const AMOUNT_MAX: f64 = 10_000_000.0;

/// Title length within [2, 50] characters
pub fn is_valid_title(title: &str) -> bool {
    let len = title.chars().count();
    (TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len)
}

/// Amount within [1, 10_000_000]; NaN is rejected
pub fn is_valid_amount(amount: f64) -> bool {
    (AMOUNT_MIN..=AMOUNT_MAX).contains(&amount)
}

/// Check a titled amount, title first
pub fn check_line(title: &str, amount: f64) -> std::result::Result<(), Status> {
    if !is_valid_title(title) {
        return Err(Status::InvalidAmountOfCharacters);
    }
    if !is_valid_amount(amount) {
        return Err(Status::InvalidAmount);
    }
    Ok(())
}

/// Check every line before anything is written; the first failing line wins
pub fn check_lines<'a, I>(lines: I) -> std::result::Result<(), Status>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    lines
        .into_iter()
        .try_for_each(|(title, amount)| check_line(title, amount))
}
