//! Star rating for a cleared puzzle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The rating for a cleared puzzle. "Not attempted" is the absence of a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum StarRating {
    /// Lowest passing rating.
    One = 1,
    Two = 2,
    /// At or under par.
    Three = 3,
}

impl StarRating {
    pub fn stars(self) -> u8 {
        self as u8
    }

    /// Fixed-width star string for list displays.
    pub fn label(self) -> &'static str {
        match self {
            StarRating::Three => "***",
            StarRating::Two => "** ",
            StarRating::One => "*  ",
        }
    }
}

impl From<StarRating> for u8 {
    fn from(rating: StarRating) -> Self {
        rating.stars()
    }
}

impl TryFrom<u8> for StarRating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(StarRating::One),
            2 => Ok(StarRating::Two),
            3 => Ok(StarRating::Three),
            other => Err(format!("invalid star rating: {other}")),
        }
    }
}

impl fmt::Display for StarRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().trim_end())
    }
}

/// Rates a clear: at or under par is three stars, up to floor(par * 1.5) is
/// two, anything slower is one. Only called once the goal has been reached.
pub fn score(keystrokes: u32, par: u32) -> StarRating {
    let keystrokes = u64::from(keystrokes);
    let par = u64::from(par);
    if keystrokes <= par {
        StarRating::Three
    } else if keystrokes <= par * 3 / 2 {
        StarRating::Two
    } else {
        StarRating::One
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bands() {
        let cases = [
            ("at par", 9, 9, StarRating::Three),
            ("under par", 5, 9, StarRating::Three),
            ("at 1.5x par", 13, 9, StarRating::Two),
            ("between par and 1.5x", 11, 9, StarRating::Two),
            ("over 1.5x par", 14, 9, StarRating::One),
            ("way over par", 100, 9, StarRating::One),
        ];

        for (name, keystrokes, par, expected) in cases {
            assert_eq!(score(keystrokes, par), expected, "{name}");
        }
    }

    #[test]
    fn test_score_band_edges() {
        for par in 1..=40u32 {
            let middle = par * 3 / 2;
            assert_eq!(score(par, par), StarRating::Three);
            assert!(score(middle, par) >= StarRating::Two);
            assert_eq!(score(middle + 1, par), StarRating::One);
        }
    }

    #[test]
    fn test_score_monotonic_in_keystrokes() {
        for par in 1..=20u32 {
            let mut previous = score(0, par);
            for keystrokes in 1..=(par * 3) {
                let current = score(keystrokes, par);
                assert!(current <= previous, "par={par} keystrokes={keystrokes}");
                previous = current;
            }
        }
    }

    #[test]
    fn test_par_of_one() {
        // floor(1 * 1.5) == 1, so the middle band is empty.
        assert_eq!(score(1, 1), StarRating::Three);
        assert_eq!(score(2, 1), StarRating::One);
    }

    #[test]
    fn test_star_rating_serde() {
        assert_eq!(serde_json::to_string(&StarRating::Two).unwrap(), "2");
        let rating: StarRating = serde_json::from_str("3").unwrap();
        assert_eq!(rating, StarRating::Three);
        assert!(serde_json::from_str::<StarRating>("0").is_err());
        assert!(serde_json::from_str::<StarRating>("4").is_err());
    }

    #[test]
    fn test_star_rating_order() {
        assert!(StarRating::Three > StarRating::Two);
        assert!(StarRating::Two > StarRating::One);
        assert_eq!(StarRating::Two.to_string(), "**");
    }
}
