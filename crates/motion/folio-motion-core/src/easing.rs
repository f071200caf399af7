//! Easing curves.
//!
//! Names follow the anime-style vocabulary used by the site's recipes:
//! `linear`, `easeIn<Curve>`, `easeOut<Curve>`, `easeInOut<Curve>`,
//! `cubicBezier(x1,y1,x2,y2)` and `steps(n)`.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MotionError, Result};

/// Power/shape family shared by the in, out and in-out variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Curve {
    Quad,
    Cubic,
    Quart,
    Quint,
    Sine,
    Expo,
    Circ,
    Back,
}

impl Curve {
    const ALL: [Curve; 8] = [
        Curve::Quad,
        Curve::Cubic,
        Curve::Quart,
        Curve::Quint,
        Curve::Sine,
        Curve::Expo,
        Curve::Circ,
        Curve::Back,
    ];

    fn name(self) -> &'static str {
        match self {
            Curve::Quad => "Quad",
            Curve::Cubic => "Cubic",
            Curve::Quart => "Quart",
            Curve::Quint => "Quint",
            Curve::Sine => "Sine",
            Curve::Expo => "Expo",
            Curve::Circ => "Circ",
            Curve::Back => "Back",
        }
    }

    /// The ease-in form; out and in-out are derived from it.
    #[inline]
    fn ease_in(self, t: f32) -> f32 {
        match self {
            Curve::Quad => t * t,
            Curve::Cubic => t * t * t,
            Curve::Quart => t * t * t * t,
            Curve::Quint => t * t * t * t * t,
            Curve::Sine => 1.0 - (t * PI / 2.0).cos(),
            Curve::Expo => {
                if t <= 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * t - 10.0)
                }
            }
            Curve::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Curve::Back => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                C3 * t * t * t - C1 * t * t
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    Linear,
    In(Curve),
    Out(Curve),
    InOut(Curve),
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
    Steps(u32),
}

impl Default for Easing {
    /// The default smooth curve, also used whenever the engine cannot resolve one.
    fn default() -> Self {
        Easing::Out(Curve::Quad)
    }
}

impl Easing {
    /// Map linear progress in [0,1] to eased progress.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::In(c) => c.ease_in(t),
            Easing::Out(c) => 1.0 - c.ease_in(1.0 - t),
            Easing::InOut(c) => {
                if t < 0.5 {
                    c.ease_in(2.0 * t) / 2.0
                } else {
                    1.0 - c.ease_in(2.0 - 2.0 * t) / 2.0
                }
            }
            Easing::CubicBezier { x1, y1, x2, y2 } => bezier_ease_t(t, x1, y1, x2, y2),
            Easing::Steps(n) => {
                let n = n.max(1) as f32;
                ((t * n).floor() / n).min(1.0)
            }
        }
    }

    /// Resolve an easing from a bare name plus numeric arguments, e.g.
    /// `("cubicBezier", [0.4, 0.0, 0.2, 1.0])` or `("easeOutExpo", [])`.
    pub fn from_name(name: &str, args: &[f32]) -> Result<Easing> {
        let unknown = || MotionError::UnknownEasing {
            name: name.to_string(),
        };
        match name {
            "linear" => return Ok(Easing::Linear),
            "cubicBezier" => {
                let [x1, y1, x2, y2] = <[f32; 4]>::try_from(args).map_err(|_| unknown())?;
                if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
                    return Err(unknown());
                }
                return Ok(Easing::CubicBezier { x1, y1, x2, y2 });
            }
            "steps" => {
                let n = args.first().copied().ok_or_else(unknown)?;
                if n < 1.0 {
                    return Err(unknown());
                }
                return Ok(Easing::Steps(n as u32));
            }
            _ => {}
        }
        let (ctor, rest): (fn(Curve) -> Easing, &str) =
            if let Some(rest) = name.strip_prefix("easeInOut") {
                (Easing::InOut, rest)
            } else if let Some(rest) = name.strip_prefix("easeIn") {
                (Easing::In, rest)
            } else if let Some(rest) = name.strip_prefix("easeOut") {
                (Easing::Out, rest)
            } else {
                return Err(unknown());
            };
        Curve::ALL
            .iter()
            .find(|c| c.name() == rest)
            .map(|c| ctor(*c))
            .ok_or_else(unknown)
    }
}

impl FromStr for Easing {
    type Err = MotionError;

    /// Parse "easeOutQuad", "cubicBezier(.5, 0, .5, 1)" or "steps(4)".
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.find('(') {
            Some(open) if s.ends_with(')') => {
                let name = &s[..open];
                let args = s[open + 1..s.len() - 1]
                    .split(',')
                    .map(|a| a.trim().parse::<f32>())
                    .collect::<std::result::Result<Vec<f32>, _>>()
                    .map_err(|_| MotionError::UnknownEasing {
                        name: s.to_string(),
                    })?;
                Easing::from_name(name, &args)
            }
            _ => Easing::from_name(s, &[]),
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Linear => write!(f, "linear"),
            Easing::In(c) => write!(f, "easeIn{}", c.name()),
            Easing::Out(c) => write!(f, "easeOut{}", c.name()),
            Easing::InOut(c) => write!(f, "easeInOut{}", c.name()),
            Easing::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubicBezier({x1},{y1},{x2},{y2})")
            }
            Easing::Steps(n) => write!(f, "steps({n})"),
        }
    }
}

impl TryFrom<String> for Easing {
    type Error = MotionError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Easing> for String {
    fn from(e: Easing) -> Self {
        e.to_string()
    }
}

#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Invert the x bezier by binary search, then evaluate y.
#[inline]
fn bezier_ease_t(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if x1 == y1 && x2 == y2 {
        return t;
    }
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) {
        assert!((a - b).abs() <= 1e-4, "left={a} right={b}");
    }

    #[test]
    fn endpoints_hold_for_every_named_curve() {
        for c in Curve::ALL {
            for e in [Easing::In(c), Easing::Out(c), Easing::InOut(c)] {
                approx(e.evaluate(0.0), 0.0);
                approx(e.evaluate(1.0), 1.0);
            }
        }
    }

    #[test]
    fn out_quad_midpoint() {
        approx(Easing::Out(Curve::Quad).evaluate(0.5), 0.75);
        approx(Easing::InOut(Curve::Quad).evaluate(0.5), 0.5);
    }

    #[test]
    fn parse_and_display_roundtrip_names() {
        for name in ["linear", "easeOutExpo", "easeInOutSine", "easeInBack", "steps(4)"] {
            let e: Easing = name.parse().unwrap();
            assert_eq!(e.to_string(), name);
        }
        let e: Easing = "cubicBezier(0.25, 0.1, 0.25, 1)".parse().unwrap();
        assert!(matches!(e, Easing::CubicBezier { .. }));
    }

    #[test]
    fn unknown_names_error() {
        assert!("easeOutWobble".parse::<Easing>().is_err());
        assert!(Easing::from_name("cubicBezier", &[0.1, 0.2]).is_err());
        assert!(Easing::from_name("steps", &[0.0]).is_err());
    }

    #[test]
    fn linear_bezier_is_identity() {
        let e = Easing::from_name("cubicBezier", &[0.3, 0.3, 0.7, 0.7]).unwrap();
        approx(e.evaluate(0.37), 0.37);
    }

    #[test]
    fn steps_quantize() {
        let e = Easing::Steps(4);
        approx(e.evaluate(0.3), 0.25);
        approx(e.evaluate(1.0), 1.0);
    }

    #[test]
    fn serde_as_string() {
        let e: Easing = serde_json::from_str("\"easeInOutCubic\"").unwrap();
        assert_eq!(e, Easing::InOut(Curve::Cubic));
        assert_eq!(serde_json::to_string(&e).unwrap(), "\"easeInOutCubic\"");
    }
}
