use std::fmt;

/// Readings for 0 through 10 used when counting and reading digits.
const DIGITS: [&str; 11] = [
    "zero", "ichi", "ni", "san", "yon", "go", "roku", "nana", "hachi", "kyū", "jū",
];

/// Readings used in front of the `-ji` hour counter.
const HOUR_DIGITS: [&str; 13] = [
    "zero", "ichi", "ni", "san", "yo", "go", "roku", "shichi", "hachi", "ku", "jū", "jūichi",
    "jūni",
];

/// Largest value [`number_to_japanese`] can read.
pub const MAX_READABLE_NUMBER: u64 = 99_999_999;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VerbalizeError {
    #[error("{what} out of supported range: {value}")]
    InvalidInput { what: &'static str, value: String },
}

impl VerbalizeError {
    fn out_of_range(what: &'static str, value: impl fmt::Display) -> Self {
        Self::InvalidInput {
            what,
            value: value.to_string(),
        }
    }
}

/// Half of the day a clock reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// Before noon.
    Gozen,
    /// Noon and after.
    Gogo,
}

impl Period {
    pub fn of_hour(hour: u32) -> Self {
        if hour < 12 { Self::Gozen } else { Self::Gogo }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gozen => "gozen",
            Self::Gogo => "gogo",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A clock time read aloud with its gozen/gogo prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeReading {
    pub period: Period,
    /// Twelve-hour display hour, 1 through 12.
    pub display_hour: u32,
    pub hour_text: String,
    /// Empty on the hour.
    pub minute_text: String,
    pub full: String,
}

pub fn digit_to_japanese(n: u32) -> Result<&'static str, VerbalizeError> {
    DIGITS
        .get(n as usize)
        .copied()
        .ok_or_else(|| VerbalizeError::out_of_range("digit", n))
}

/// Reads every digit of `digits` on its own, separated by single spaces.
///
/// Separators are not skipped: strip them before calling.
pub fn phone_digits_to_japanese(digits: &str) -> Result<String, VerbalizeError> {
    let readings = digits
        .chars()
        .map(|ch| {
            ch.to_digit(10)
                .map(|digit| DIGITS[digit as usize])
                .ok_or_else(|| VerbalizeError::out_of_range("phone digit", ch))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if readings.is_empty() {
        return Err(VerbalizeError::out_of_range("phone digits", "\"\""));
    }

    Ok(readings.join(" "))
}

/// Reads an hour of the day with the `-ji` counter.
///
/// In twelve-hour context 0 and 12 both read as `jūni-ji` and afternoon hours
/// drop by twelve. Otherwise the 24-hour reading is produced.
pub fn hour_to_japanese(hour: u32, twelve_hour: bool) -> Result<String, VerbalizeError> {
    if hour > 23 {
        return Err(VerbalizeError::out_of_range("hour", hour));
    }

    let reading = if twelve_hour {
        HOUR_DIGITS[display_hour(hour) as usize].to_string()
    } else {
        match hour {
            0..=12 => HOUR_DIGITS[hour as usize].to_string(),
            13..=19 => format!("jū{}", HOUR_DIGITS[(hour - 10) as usize]),
            20 => "nijū".to_string(),
            _ => format!("nijū{}", HOUR_DIGITS[(hour - 20) as usize]),
        }
    };

    Ok(format!("{reading}-ji"))
}

/// Reads a minute value with the `-fun` counter. The hour itself reads as an
/// empty string and thirty as `han`.
pub fn minute_to_japanese(minute: u32) -> Result<String, VerbalizeError> {
    if minute > 59 {
        return Err(VerbalizeError::out_of_range("minute", minute));
    }

    let tens = minute / 10;
    let ones = minute % 10;

    let text = match (minute, tens, ones) {
        (0, _, _) => String::new(),
        (30, _, _) => "han".to_string(),
        (_, 0, _) => ones_minute(ones),
        (_, 1, 0) => "juppun".to_string(),
        (_, _, 0) => format!("{}juppun", DIGITS[tens as usize]),
        (_, 1, _) => format!("jū{}", ones_minute(ones)),
        _ => format!("{}jū{}", DIGITS[tens as usize], ones_minute(ones)),
    };

    Ok(text)
}

fn ones_minute(ones: u32) -> String {
    match ones {
        1 => "ippun".to_string(),
        3 => "sanpun".to_string(),
        4 => "yonpun".to_string(),
        6 => "roppun".to_string(),
        8 => "happun".to_string(),
        _ => format!("{}-fun", DIGITS[ones as usize]),
    }
}

fn display_hour(hour: u32) -> u32 {
    match hour % 12 {
        0 => 12,
        reduced => reduced,
    }
}

pub fn time_with_period(hour: u32, minute: u32) -> Result<TimeReading, VerbalizeError> {
    let hour_text = hour_to_japanese(hour, true)?;
    let minute_text = minute_to_japanese(minute)?;
    let period = Period::of_hour(hour);

    let full = if minute_text.is_empty() {
        format!("{period} {hour_text}")
    } else {
        format!("{period} {hour_text} {minute_text}")
    };

    Ok(TimeReading {
        period,
        display_hour: display_hour(hour),
        hour_text,
        minute_text,
        full,
    })
}

/// Reads a span of time as `<start> kara <end> made`.
pub fn time_range_to_japanese(
    start: (u32, u32),
    end: (u32, u32),
) -> Result<String, VerbalizeError> {
    let start = time_with_period(start.0, start.1)?;
    let end = time_with_period(end.0, end.1)?;
    Ok(format!("{} kara {} made", start.full, end.full))
}

/// Reads a non-negative integer as hyphen-joined morphemes, e.g. 3_600 is
/// `sanzen-roppyaku`.
///
/// # Errors
/// Returns [`VerbalizeError::InvalidInput`] above [`MAX_READABLE_NUMBER`].
pub fn number_to_japanese(n: u64) -> Result<String, VerbalizeError> {
    if n > MAX_READABLE_NUMBER {
        return Err(VerbalizeError::out_of_range("number", n));
    }

    if n == 0 {
        return Ok(DIGITS[0].to_string());
    }

    let mut morphemes = Vec::new();

    let man = n / 10_000;
    match man {
        0 => {}
        1 => morphemes.push("ichiman".to_string()),
        _ => {
            let mut group = below_man(man);
            // a leading thousand in the man group takes its counter: issenman
            if let Some(first) = group.first_mut().filter(|_| man / 1000 == 1) {
                *first = "issen".to_string();
            }
            morphemes.push(format!("{}man", group.concat()));
        }
    }

    morphemes.extend(below_man(n % 10_000));

    Ok(morphemes.join("-"))
}

/// Morphemes for 0..10_000, one per non-zero place.
fn below_man(n: u64) -> Vec<String> {
    let sen = (n / 1000) as usize;
    let hyaku = (n / 100 % 10) as usize;
    let juu = (n / 10 % 10) as usize;
    let ones = (n % 10) as usize;

    let mut morphemes = Vec::new();

    match sen {
        0 => {}
        1 => morphemes.push("sen".to_string()),
        3 => morphemes.push("sanzen".to_string()),
        8 => morphemes.push("hassen".to_string()),
        _ => morphemes.push(format!("{}sen", DIGITS[sen])),
    }

    match hyaku {
        0 => {}
        1 => morphemes.push("hyaku".to_string()),
        3 => morphemes.push("sanbyaku".to_string()),
        6 => morphemes.push("roppyaku".to_string()),
        8 => morphemes.push("happyaku".to_string()),
        _ => morphemes.push(format!("{}hyaku", DIGITS[hyaku])),
    }

    match juu {
        0 => {}
        1 => morphemes.push("jū".to_string()),
        _ => morphemes.push(format!("{}jū", DIGITS[juu])),
    }

    if ones > 0 {
        morphemes.push(DIGITS[ones].to_string());
    }

    morphemes
}

pub fn format_time_display(hour: u32, minute: u32) -> String {
    format!("{hour:02}:{minute:02}")
}

/// Formats a yen amount with thousands separators, e.g. `12,345 ¥`.
pub fn format_price_display(price: u64) -> String {
    let digits = price.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{grouped} ¥")
}
