use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::geometry::{CELL_SEARCH_MARGIN, DETECTION_PADDING};
use crate::token::DEFAULT_FUZZY_THRESHOLD;

/// What to do when the backend refuses to create a radio button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum RadioHandling {
    /// Re-issue the widget as a checkbox with the same export value.
    #[default]
    Fallback,
    /// Drop the field and carry on.
    Skip,
    /// Abort the conversion.
    Strict,
}

impl FromStr for RadioHandling {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fallback" => Ok(RadioHandling::Fallback),
            "skip" => Ok(RadioHandling::Skip),
            "strict" => Ok(RadioHandling::Strict),
            other => Err(Error::Config(format!(
                "unknown radio handling '{other}' (expected fallback, skip or strict)"
            ))),
        }
    }
}

impl fmt::Display for RadioHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RadioHandling::Fallback => "fallback",
            RadioHandling::Skip => "skip",
            RadioHandling::Strict => "strict",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BorderStyle {
    pub color: [f32; 3],
    pub width: f32,
}

impl BorderStyle {
    pub const REQUIRED: BorderStyle = BorderStyle { color: [1.0, 0.0, 0.0], width: 1.0 };
    pub const DEFAULT: BorderStyle = BorderStyle { color: [0.0, 0.5, 1.0], width: 0.6 };
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub radio_handling: RadioHandling,
    pub required_border: BorderStyle,
    pub default_border: BorderStyle,
    pub detection_padding: f32,
    pub cell_margin: (f32, f32),
    /// Similarity (normalized Levenshtein) a mangled option key needs to be
    /// read as a known key.
    pub fuzzy_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            radio_handling: RadioHandling::default(),
            required_border: BorderStyle::REQUIRED,
            default_border: BorderStyle::DEFAULT,
            detection_padding: DETECTION_PADDING,
            cell_margin: CELL_SEARCH_MARGIN,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

impl Config {
    pub fn border(&self, required: bool) -> BorderStyle {
        if required { self.required_border } else { self.default_border }
    }
}

/// Parse `r,g,b` given either in 0..1 or in 0..255 (any component above 1
/// switches the whole triple to the 0..255 reading).
pub fn parse_color(value: &str) -> Result<[f32; 3], Error> {
    let parts: Vec<f32> = value
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|e| Error::Config(format!("bad color '{value}': {e}")))?;
    let [r, g, b] = parts[..] else {
        return Err(Error::Config(format!("color '{value}' needs three components")));
    };
    if [r, g, b].iter().any(|c| *c < 0.0) {
        return Err(Error::Config(format!("color '{value}' has a negative component")));
    }
    if [r, g, b].iter().any(|c| *c > 1.0) {
        Ok([r / 255.0, g / 255.0, b / 255.0])
    } else {
        Ok([r, g, b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_scales() {
        assert_eq!(parse_color("1,0,0").unwrap(), [1.0, 0.0, 0.0]);
        assert_eq!(parse_color("255, 0, 51").unwrap(), [1.0, 0.0, 0.2]);
        assert!(parse_color("1,0").is_err());
        assert!(parse_color("red").is_err());
    }

    #[test]
    fn radio_handling_names() {
        assert_eq!("Skip".parse::<RadioHandling>().unwrap(), RadioHandling::Skip);
        assert!("loose".parse::<RadioHandling>().is_err());
        assert_eq!(RadioHandling::default().to_string(), "fallback");
    }
}
