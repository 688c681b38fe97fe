use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;

use crate::verbalizer::{
    MAX_READABLE_NUMBER, VerbalizeError, number_to_japanese, phone_digits_to_japanese, time_range_to_japanese,
    time_with_period,
};

/// Minutes a generated clock time can land on.
pub const MINUTE_GRID: [u32; 12] = [0, 5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55];

pub const PHONE_PREFIXES: [&str; 3] = ["090", "080", "070"];

/// Multipliers applied to the correct price to produce nearby wrong prices,
/// as `(numerator, denominator)` pairs.
pub const PRICE_VARIATIONS: [(u64, u64); 5] = [(1, 2), (3, 4), (5, 4), (3, 2), (2, 1)];

/// Resampling attempts before falling back to the deterministic sequence.
pub const MAX_DISTRACTOR_ATTEMPTS: usize = 256;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("price range minimum {min} exceeds maximum {max}")]
    InvalidPriceRange { min: u64, max: u64 },
    #[error("could only find {found} of {required} distinct wrong answers")]
    InsufficientDistractors { required: usize, found: usize },
    #[error(transparent)]
    Verbalize(#[from] VerbalizeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
}

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    pub fn reading(&self) -> Result<String, VerbalizeError> {
        time_with_period(self.hour, self.minute).map(|reading| reading.full)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A start and end time. The end can equal or precede the start when the
/// start hour is late in the day, since the end hour is clamped to 23 and
/// its minute drawn independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeRange {
    pub fn reading(&self) -> Result<String, VerbalizeError> {
        time_range_to_japanese(
            (self.start.hour, self.start.minute),
            (self.end.hour, self.end.minute),
        )
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber {
    pub prefix: String,
    pub middle: u32,
    pub last: u32,
}

impl PhoneNumber {
    /// The number with separators removed.
    pub fn digits(&self) -> String {
        format!("{}{:04}{:04}", self.prefix, self.middle, self.last)
    }

    pub fn reading(&self) -> Result<String, VerbalizeError> {
        phone_digits_to_japanese(&self.digits())
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:04}-{:04}", self.prefix, self.middle, self.last)
    }
}

pub fn price_reading(price: u64) -> Result<String, VerbalizeError> {
    number_to_japanese(price).map(|reading| format!("{reading} en"))
}

pub fn random_time<R: Rng + ?Sized>(rng: &mut R) -> ClockTime {
    ClockTime {
        hour: rng.gen_range(0..24),
        minute: random_grid_minute(rng),
    }
}

fn random_grid_minute<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    MINUTE_GRID[rng.gen_range(0..MINUTE_GRID.len())]
}

pub fn random_time_range<R: Rng + ?Sized>(rng: &mut R) -> TimeRange {
    let start = random_time(rng);
    let end_hour = (start.hour + rng.gen_range(1..=10)).min(23);

    TimeRange {
        start,
        end: ClockTime::new(end_hour, random_grid_minute(rng)),
    }
}

pub fn random_phone<R: Rng + ?Sized>(rng: &mut R) -> PhoneNumber {
    let prefix = PHONE_PREFIXES
        .choose(rng)
        .copied()
        .unwrap_or(PHONE_PREFIXES[0]);

    PhoneNumber {
        prefix: prefix.to_string(),
        middle: rng.gen_range(0..10_000),
        last: rng.gen_range(0..10_000),
    }
}

/// Picks `min + 10k` uniformly, never above `max`.
pub fn random_price<R: Rng + ?Sized>(rng: &mut R, min: u64, max: u64) -> Result<u64, GenerateError> {
    if min > max {
        return Err(GenerateError::InvalidPriceRange { min, max });
    }

    let steps = (max - min) / 10;
    Ok((min + rng.gen_range(0..=steps) * 10).min(max))
}

/// Collects `count` distinct wrong answers that all differ from `correct`.
///
/// `sample` is drawn up to [`MAX_DISTRACTOR_ATTEMPTS`] times, and a draw of
/// `None` is a rejected candidate. If that does not produce enough distinct
/// values, `fallback` is consumed in order.
///
/// # Errors
/// Returns [`GenerateError::InsufficientDistractors`] when both sources run dry,
/// and forwards any error produced by `sample` or `fallback`.
pub fn collect_distractors<R, S, F>(
    rng: &mut R,
    correct: &str,
    count: usize,
    mut sample: S,
    fallback: F,
) -> Result<Vec<String>, GenerateError>
where
    R: Rng + ?Sized,
    S: FnMut(&mut R) -> Result<Option<String>, GenerateError>,
    F: IntoIterator<Item = Result<String, GenerateError>>,
{
    let mut wrong: Vec<String> = Vec::with_capacity(count);

    let accept = |candidate: String, wrong: &mut Vec<String>| {
        if candidate != correct && !wrong.contains(&candidate) {
            wrong.push(candidate);
        }
    };

    for _ in 0..MAX_DISTRACTOR_ATTEMPTS {
        if wrong.len() >= count {
            return Ok(wrong);
        }
        if let Some(candidate) = sample(rng)? {
            accept(candidate, &mut wrong);
        }
    }

    if wrong.len() < count {
        log::debug!(
            "distractor sampling exhausted with {}/{} found, using fallback",
            wrong.len(),
            count
        );

        for candidate in fallback {
            if wrong.len() >= count {
                break;
            }
            accept(candidate?, &mut wrong);
        }
    }

    if wrong.len() < count {
        return Err(GenerateError::InsufficientDistractors {
            required: count,
            found: wrong.len(),
        });
    }

    Ok(wrong)
}

pub fn time_distractors<R: Rng + ?Sized>(
    rng: &mut R,
    correct: ClockTime,
    count: usize,
) -> Result<Vec<String>, GenerateError> {
    let correct_text = correct.reading()?;
    let fallback = (0..24u32)
        .flat_map(|hour| MINUTE_GRID.into_iter().map(move |minute| ClockTime::new(hour, minute)))
        .map(|time| time.reading().map_err(GenerateError::from));

    collect_distractors(
        rng,
        &correct_text,
        count,
        |rng| Ok(Some(random_time(rng).reading()?)),
        fallback,
    )
}

pub fn time_range_distractors<R: Rng + ?Sized>(
    rng: &mut R,
    correct: TimeRange,
    count: usize,
) -> Result<Vec<String>, GenerateError> {
    let correct_text = correct.reading()?;
    let fallback = MINUTE_GRID.into_iter().map(move |minute| {
        let shifted = TimeRange {
            start: correct.start,
            end: ClockTime::new(correct.end.hour, minute),
        };
        shifted.reading().map_err(GenerateError::from)
    });

    collect_distractors(
        rng,
        &correct_text,
        count,
        |rng| Ok(Some(random_time_range(rng).reading()?)),
        fallback,
    )
}

pub fn phone_distractors<R: Rng + ?Sized>(
    rng: &mut R,
    correct: &PhoneNumber,
    count: usize,
) -> Result<Vec<String>, GenerateError> {
    let correct_text = correct.reading()?;
    let base = correct.clone();
    let fallback = (1..10_000u32).map(move |offset| {
        let neighbour = PhoneNumber {
            last: (base.last + offset) % 10_000,
            ..base.clone()
        };
        neighbour.reading().map_err(GenerateError::from)
    });

    collect_distractors(
        rng,
        &correct_text,
        count,
        |rng| Ok(Some(random_phone(rng).reading()?)),
        fallback,
    )
}

/// Perturbs `price` by one of [`PRICE_VARIATIONS`], rounded to the nearest
/// hundred and floored at 100.
pub fn vary_price<R: Rng + ?Sized>(rng: &mut R, price: u64) -> u64 {
    let (numerator, denominator) = PRICE_VARIATIONS[rng.gen_range(0..PRICE_VARIATIONS.len())];
    let rounded = (price * numerator + denominator * 50) / (denominator * 100) * 100;
    rounded.max(100)
}

pub fn price_distractors<R: Rng + ?Sized>(
    rng: &mut R,
    correct: u64,
    count: usize,
) -> Result<Vec<String>, GenerateError> {
    let correct_text = price_reading(correct)?;
    let anchor = (correct + 50) / 100 * 100;
    let fallback = (1..=1000u64)
        .flat_map(move |step| {
            let above = Some(anchor + step * 100);
            let below = anchor.checked_sub(step * 100).filter(|value| *value >= 100);
            above.into_iter().chain(below)
        })
        .filter(move |candidate| *candidate != correct && *candidate <= MAX_READABLE_NUMBER)
        .map(|candidate| price_reading(candidate).map_err(GenerateError::from));

    // variations above the readable range are rejected draws
    let sample = |rng: &mut R| -> Result<Option<String>, GenerateError> {
        let candidate = vary_price(rng, correct);
        if candidate > MAX_READABLE_NUMBER {
            return Ok(None);
        }
        Ok(Some(price_reading(candidate)?))
    };

    collect_distractors(rng, &correct_text, count, sample, fallback)
}
