//! Two-character anchor codes (`"lt"`, `"mm"`, `"rs"`, ...).

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAnchor {
    #[default]
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAnchor {
    /// Ascender line (`a`, `t`)
    #[default]
    Top,
    Middle,
    Baseline,
    /// Descender line (`d`, `b`)
    Bottom,
}

/// Which point of a box lands on the element's (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub struct Anchor {
    pub h: HAnchor,
    pub v: VAnchor,
}

impl Anchor {
    pub const LEFT_TOP: Anchor = Anchor {
        h: HAnchor::Left,
        v: VAnchor::Top,
    };
    pub const LEFT_MIDDLE: Anchor = Anchor {
        h: HAnchor::Left,
        v: VAnchor::Middle,
    };
    pub const CENTER: Anchor = Anchor {
        h: HAnchor::Middle,
        v: VAnchor::Middle,
    };

    /// Top-left corner of a `width` x `height` box anchored at (x, y).
    ///
    /// `ascent` is the distance from the box top to the first baseline.
    pub fn origin(&self, x: i32, y: i32, width: i32, height: i32, ascent: i32) -> (i32, i32) {
        let left = match self.h {
            HAnchor::Left => x,
            HAnchor::Middle => x - width / 2,
            HAnchor::Right => x - width,
        };
        let top = match self.v {
            VAnchor::Top => y,
            VAnchor::Middle => y - height / 2,
            VAnchor::Baseline => y - ascent,
            VAnchor::Bottom => y - height,
        };
        (left, top)
    }
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let mut chars = lower.chars();
        let (Some(hc), Some(vc), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(format!("anchor must be two characters, got '{}'", s));
        };
        let h = match hc {
            'l' => HAnchor::Left,
            'm' => HAnchor::Middle,
            'r' => HAnchor::Right,
            _ => return Err(format!("invalid horizontal anchor '{}'", hc)),
        };
        let v = match vc {
            'a' | 't' => VAnchor::Top,
            'm' => VAnchor::Middle,
            's' => VAnchor::Baseline,
            'd' | 'b' => VAnchor::Bottom,
            _ => return Err(format!("invalid vertical anchor '{}'", vc)),
        };
        Ok(Anchor { h, v })
    }
}

impl TryFrom<String> for Anchor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = match self.h {
            HAnchor::Left => 'l',
            HAnchor::Middle => 'm',
            HAnchor::Right => 'r',
        };
        let v = match self.v {
            VAnchor::Top => 'a',
            VAnchor::Middle => 'm',
            VAnchor::Baseline => 's',
            VAnchor::Bottom => 'd',
        };
        write!(f, "{}{}", h, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_anchor() {
        assert_eq!("lt".parse(), Ok(Anchor::LEFT_TOP));
        assert_eq!("MM".parse(), Ok(Anchor::CENTER));
        assert_eq!(
            "rs".parse::<Anchor>(),
            Ok(Anchor {
                h: HAnchor::Right,
                v: VAnchor::Baseline
            })
        );
        assert!("x".parse::<Anchor>().is_err());
        assert!("lq".parse::<Anchor>().is_err());
        assert!("ltx".parse::<Anchor>().is_err());
    }

    #[test]
    fn test_origin() {
        let box_ = (40, 20, 16);
        let at = |a: &str| {
            a.parse::<Anchor>()
                .unwrap()
                .origin(100, 50, box_.0, box_.1, box_.2)
        };
        assert_eq!(at("lt"), (100, 50));
        assert_eq!(at("mm"), (80, 40));
        assert_eq!(at("rd"), (60, 30));
        assert_eq!(at("ls"), (100, 34));
    }
}
