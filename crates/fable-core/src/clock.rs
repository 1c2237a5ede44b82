//! In-fiction clock: timestamp parsing, depth-driven advancement, and comparison.
//!
//! The clock is a naive timestamp formatted as `YYYY-MM-DD HH:mm:ss`. Once the
//! story enters its epilogue the clock is replaced by the sentinel `后日谈`,
//! after which every clock operation is a no-op.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{ClockError, CoreResult};

/// `strftime` pattern for every stored timestamp.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Literal stored in place of a timestamp once the epilogue begins.
pub const EPILOGUE_SENTINEL: &str = "后日谈";

/// Clock value at the start of a new game.
pub fn default_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1925, 12, 26)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// True when `s` has the exact `YYYY-MM-DD HH:mm:ss` shape (digits and separators only).
pub fn has_timestamp_shape(s: &str) -> bool {
    s.len() == 19
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            10 => b == b' ',
            13 | 16 => b == b':',
            _ => b.is_ascii_digit(),
        })
}

/// Parse a strictly shaped timestamp into a calendar time.
pub fn parse_timestamp(s: &str) -> CoreResult<NaiveDateTime> {
    if !has_timestamp_shape(s) {
        return Err(ClockError::InvalidTimestamp(s.to_string()));
    }
    NaiveDateTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|_| ClockError::InvalidTimestamp(s.to_string()))
}

/// Time step applied when a turn sets no explicit time.
///
/// Finer depth levels describe shorter stretches of story time.
pub fn default_delta(depth_level: i64) -> TimeDelta {
    match depth_level {
        1 => TimeDelta::hours(24),
        2 => TimeDelta::hours(8),
        3 => TimeDelta::hours(2),
        4 => TimeDelta::minutes(15),
        5 => TimeDelta::minutes(1),
        _ => TimeDelta::hours(2),
    }
}

/// Compare two stored clock strings.
///
/// Returns `None` if either side is the epilogue sentinel or does not parse.
pub fn compare(a: &str, b: &str) -> Option<Ordering> {
    let a = parse_timestamp(a).ok()?;
    let b = parse_timestamp(b).ok()?;
    Some(a.cmp(&b))
}

/// The current in-fiction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GameTime {
    /// A concrete calendar time.
    At(NaiveDateTime),
    /// The story has ended; time no longer moves.
    Epilogue,
}

impl GameTime {
    /// Parse a stored clock value: either a timestamp or the epilogue sentinel.
    pub fn parse(s: &str) -> CoreResult<Self> {
        if s.trim() == EPILOGUE_SENTINEL {
            return Ok(Self::Epilogue);
        }
        parse_timestamp(s.trim()).map(Self::At)
    }

    /// Whether the clock holds the epilogue sentinel.
    pub fn is_epilogue(&self) -> bool {
        matches!(self, Self::Epilogue)
    }

    /// The concrete time, if any.
    pub fn at(&self) -> Option<NaiveDateTime> {
        match self {
            Self::At(t) => Some(*t),
            Self::Epilogue => None,
        }
    }

    /// Calendar year of the clock. `None` in the epilogue.
    pub fn year(&self) -> Option<i32> {
        self.at().map(|t| t.year())
    }

    /// Advance by `delta`. No-op in the epilogue.
    pub fn advance_by(&mut self, delta: TimeDelta) -> CoreResult<()> {
        if let Self::At(t) = self {
            let next = t.checked_add_signed(delta).ok_or_else(|| ClockError::Overflow {
                from: t.format(TIME_FORMAT).to_string(),
                minutes: delta.num_minutes(),
            })?;
            *t = next;
        }
        Ok(())
    }

    /// Advance by the step associated with `depth_level`.
    pub fn advance_default(&mut self, depth_level: i64) -> CoreResult<()> {
        self.advance_by(default_delta(depth_level))
    }

    /// Sign of `self - other`; `None` if either side is the epilogue.
    pub fn compare(&self, other: &GameTime) -> Option<Ordering> {
        Some(self.at()?.cmp(&other.at()?))
    }
}

impl Default for GameTime {
    fn default() -> Self {
        Self::At(default_start())
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(t) => write!(f, "{}", t.format(TIME_FORMAT)),
            Self::Epilogue => f.write_str(EPILOGUE_SENTINEL),
        }
    }
}

impl From<GameTime> for String {
    fn from(t: GameTime) -> Self {
        t.to_string()
    }
}

impl TryFrom<String> for GameTime {
    type Error = ClockError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(s: &str) -> GameTime {
        GameTime::parse(s).unwrap()
    }

    #[test]
    fn default_is_start_time() {
        assert_eq!(GameTime::default().to_string(), "1925-12-26 00:00:00");
    }

    #[test]
    fn advance_by_depth() {
        let cases = [
            (1, "1925-12-27 00:00:00"),
            (2, "1925-12-26 08:00:00"),
            (3, "1925-12-26 02:00:00"),
            (4, "1925-12-26 00:15:00"),
            (5, "1925-12-26 00:01:00"),
            (9, "1925-12-26 02:00:00"),
            (-1, "1925-12-26 02:00:00"),
        ];
        for (depth, expected) in cases {
            let mut t = GameTime::default();
            t.advance_default(depth).unwrap();
            assert_eq!(t.to_string(), expected, "depth {depth}");
        }
    }

    #[test]
    fn advance_crosses_year_boundary() {
        let mut t = at("1925-12-31 23:30:00");
        t.advance_default(1).unwrap();
        assert_eq!(t.to_string(), "1926-01-01 23:30:00");
        assert_eq!(t.year(), Some(1926));
    }

    #[test]
    fn epilogue_is_inert() {
        let mut t = GameTime::Epilogue;
        t.advance_default(1).unwrap();
        assert_eq!(t, GameTime::Epilogue);
        assert_eq!(t.to_string(), EPILOGUE_SENTINEL);
        assert_eq!(t.year(), None);
        assert_eq!(t.compare(&GameTime::default()), None);
    }

    #[test]
    fn overflow_is_an_error() {
        let mut t = GameTime::At(NaiveDateTime::MAX);
        assert!(matches!(
            t.advance_default(1),
            Err(ClockError::Overflow { .. })
        ));
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        assert!(GameTime::parse("1925-12-26").is_err());
        assert!(GameTime::parse("1925-1-26 00:00:00").is_err());
        assert!(GameTime::parse("1925-02-30 00:00:00").is_err());
        assert!(GameTime::parse("1925-12-26 24:00:00").is_err());
        assert!(GameTime::parse("后日谈").unwrap().is_epilogue());
    }

    #[test]
    fn compare_strings() {
        assert_eq!(
            compare("1925-12-26 00:00:00", "1925-12-26 00:00:01"),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare("1926-01-01 00:00:00", "1925-12-26 00:00:00"),
            Some(Ordering::Greater)
        );
        assert_eq!(compare("后日谈", "1925-12-26 00:00:00"), None);
        assert_eq!(compare("garbage", "1925-12-26 00:00:00"), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn default_advance_never_goes_back(depths in proptest::collection::vec(-2i64..8, 0..40)) {
            let mut t = GameTime::default();
            for depth in depths {
                let before = t;
                t.advance_default(depth).unwrap();
                prop_assert_eq!(t.compare(&before), Some(Ordering::Greater));
            }
        }
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&GameTime::Epilogue).unwrap();
        assert_eq!(json, "\"后日谈\"");
        let back: GameTime = serde_json::from_str("\"1926-03-01 12:00:00\"").unwrap();
        assert_eq!(back, at("1926-03-01 12:00:00"));
        assert!(serde_json::from_str::<GameTime>("\"yesterday\"").is_err());
    }
}
