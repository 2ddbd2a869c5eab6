use std::{fmt, str::FromStr};

use crate::error::Error;

/// ScoreBorder is one endpoint of a score range. A border is either
/// closed, admitting its own value, or open (`exclude`), admitting only
/// values strictly beyond it. Unbounded ends are the infinities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreBorder {
    pub value: f64,
    pub exclude: bool,
}

impl ScoreBorder {
    /// Lower border that admits every score.
    pub const NEG_INF: ScoreBorder = ScoreBorder {
        value: f64::NEG_INFINITY,
        exclude: false,
    };

    /// Upper border that admits every score.
    pub const POS_INF: ScoreBorder = ScoreBorder {
        value: f64::INFINITY,
        exclude: false,
    };

    pub fn inclusive(value: f64) -> ScoreBorder {
        ScoreBorder {
            value,
            exclude: false,
        }
    }

    pub fn exclusive(value: f64) -> ScoreBorder {
        ScoreBorder {
            value,
            exclude: true,
        }
    }

    /// Whether `score` satisfies this border used as a lower bound.
    #[inline]
    pub fn is_below(&self, score: f64) -> bool {
        if self.exclude {
            self.value < score
        } else {
            self.value <= score
        }
    }

    /// Whether `score` satisfies this border used as an upper bound.
    #[inline]
    pub fn is_above(&self, score: f64) -> bool {
        if self.exclude {
            self.value > score
        } else {
            self.value >= score
        }
    }

    /// Whether no score can satisfy both `min` and `max`.
    pub fn is_empty_range(min: &ScoreBorder, max: &ScoreBorder) -> bool {
        min.value > max.value || (min.value == max.value && (min.exclude || max.exclude))
    }
}

impl FromStr for ScoreBorder {
    type Err = Error;

    /// Parse `inf`, `+inf`, `-inf`, `1.5` or `(1.5`, the last one
    /// being an exclusive border.
    fn from_str(s: &str) -> Result<ScoreBorder, Error> {
        match s {
            "inf" | "+inf" => return Ok(ScoreBorder::POS_INF),
            "-inf" => return Ok(ScoreBorder::NEG_INF),
            _ => (),
        }
        let (text, exclude) = match s.strip_prefix('(') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        let value = match text.parse::<f64>() {
            Ok(value) if !value.is_nan() => value,
            _ => return Err(Error::InvalidScoreBorder(s.to_string())),
        };
        Ok(ScoreBorder { value, exclude })
    }
}

impl fmt::Display for ScoreBorder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.exclude, self.value) {
            (false, v) if v == f64::INFINITY => write!(f, "+inf"),
            (false, v) if v == f64::NEG_INFINITY => write!(f, "-inf"),
            (true, v) => write!(f, "({}", v),
            (false, v) => write!(f, "{}", v),
        }
    }
}
