//! Distributions built on top of a [`Generator`].
//!
//! Every helper only advances the generator it is given. Draw order is part
//! of the determinism contract, so each function documents how many values
//! it consumes.

use std::f64::consts::PI;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::Generator;
use crate::error::RngError;

/// `min + next() * (max - min)`. One draw.
pub fn random_float<G: Generator + ?Sized>(rng: &mut G, min: f64, max: f64) -> f64 {
    min + rng.next_f64() * (max - min)
}

/// Floor of [`random_float`]; `max` is exclusive. One draw.
pub fn random_int<G: Generator + ?Sized>(rng: &mut G, min: i64, max: i64) -> i64 {
    random_float(rng, min as f64, max as f64).floor() as i64
}

pub fn random_choice<'a, T, G: Generator + ?Sized>(
    rng: &mut G,
    items: &'a [T],
) -> Result<&'a T, RngError> {
    if items.is_empty() {
        return Err(RngError::EmptyInput {
            operation: "random_choice",
        });
    }
    let index = (rng.next_f64() * items.len() as f64).floor() as usize;
    Ok(&items[index.min(items.len() - 1)])
}

/// Fisher-Yates in place, from the last index down to 1. `len - 1` draws.
pub fn shuffle<T, G: Generator + ?Sized>(rng: &mut G, items: &mut [T]) -> Result<(), RngError> {
    if items.is_empty() {
        return Err(RngError::EmptyInput {
            operation: "shuffle",
        });
    }
    for i in (1..items.len()).rev() {
        let j = (rng.next_f64() * (i + 1) as f64).floor() as usize;
        items.swap(i, j.min(i));
    }
    Ok(())
}

pub fn shuffled<T: Clone, G: Generator + ?Sized>(
    rng: &mut G,
    items: &[T],
) -> Result<Vec<T>, RngError> {
    let mut result = items.to_vec();
    shuffle(rng, &mut result)?;
    Ok(result)
}

/// Picks `count` items. Without duplicates this is a prefix of a shuffled
/// copy, so asking for more than `items.len()` returns every item once.
pub fn random_choices<T: Clone, G: Generator + ?Sized>(
    rng: &mut G,
    items: &[T],
    count: usize,
    allow_duplicates: bool,
) -> Result<Vec<T>, RngError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if allow_duplicates {
        (0..count)
            .map(|_| random_choice(rng, items).cloned())
            .collect()
    } else {
        let mut result = shuffled(rng, items)?;
        result.truncate(count);
        Ok(result)
    }
}

/// Cumulative-weight scan. If rounding lets the draw fall past the last
/// bucket, the last item is returned. One draw.
pub fn weighted_choice<'a, T, G: Generator + ?Sized>(
    rng: &mut G,
    items: &'a [T],
    weights: &[f64],
) -> Result<&'a T, RngError> {
    if items.len() != weights.len() {
        return Err(RngError::LengthMismatch {
            items: items.len(),
            weights: weights.len(),
        });
    }
    let Some(last) = items.last() else {
        return Err(RngError::EmptyInput {
            operation: "weighted_choice",
        });
    };

    let total: f64 = weights.iter().sum();
    let target = rng.next_f64() * total;
    let mut cumulative = 0.0;
    for (item, weight) in items.iter().zip(weights) {
        cumulative += weight;
        if target < cumulative {
            return Ok(item);
        }
    }
    Ok(last)
}

/// One draw.
pub fn random_boolean<G: Generator + ?Sized>(rng: &mut G, probability: f64) -> bool {
    rng.next_f64() < probability
}

/// Box-Muller, two draws. `u1 == u2 == 0.5` yields exactly `mean`.
pub fn random_normal<G: Generator + ?Sized>(rng: &mut G, mean: f64, std_dev: f64) -> f64 {
    let u1 = rng.next_f64();
    let u2 = rng.next_f64();

    if u1 == 0.5 && u2 == 0.5 {
        return mean;
    }

    // ln(0) would poison the result with infinity
    let u1 = u1.max(f64::MIN_POSITIVE);
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    z0 * std_dev + mean
}

/// Uniform over the ball volume. Draws theta, phi, then the radius.
pub fn random_position_in_sphere<G: Generator + ?Sized>(rng: &mut G, radius: f64) -> DVec3 {
    let theta = rng.next_f64() * 2.0 * PI;
    let phi = (2.0 * rng.next_f64() - 1.0).acos();
    let r = radius * rng.next_f64().cbrt();
    spherical_to_cartesian(r, theta, phi)
}

/// Uniform over the sphere surface. Two draws.
pub fn random_position_on_sphere<G: Generator + ?Sized>(rng: &mut G, radius: f64) -> DVec3 {
    let theta = rng.next_f64() * 2.0 * PI;
    let phi = (2.0 * rng.next_f64() - 1.0).acos();
    spherical_to_cartesian(radius, theta, phi)
}

fn spherical_to_cartesian(r: f64, theta: f64, phi: f64) -> DVec3 {
    DVec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}

/// 8-bit colour channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_unit(self) -> [f64; 3] {
        [
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        ]
    }
}

/// Three draws: red, green, blue.
pub fn random_color<G: Generator + ?Sized>(rng: &mut G) -> Rgb8 {
    let mut channel = || (rng.next_f64() * 256.0).floor() as u8;
    let r = channel();
    let g = channel();
    let b = channel();
    Rgb8 { r, g, b }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Mulberry32;

    /// Replays a fixed list of draws.
    struct Scripted {
        values: Vec<f64>,
        cursor: usize,
    }

    impl Scripted {
        fn new(values: &[f64]) -> Self {
            Self {
                values: values.to_vec(),
                cursor: 0,
            }
        }
    }

    impl Generator for Scripted {
        fn next_f64(&mut self) -> f64 {
            let value = self.values[self.cursor % self.values.len()];
            self.cursor += 1;
            value
        }
    }

    #[test]
    fn test_random_float_and_int() {
        let mut rng = Scripted::new(&[0.5, 0.999, 0.0]);
        assert_eq!(random_float(&mut rng, 10.0, 20.0), 15.0);
        assert_eq!(random_int(&mut rng, 0, 10), 9);
        assert_eq!(random_int(&mut rng, -3, 3), -3);
    }

    #[test]
    fn test_random_int_never_reaches_max() {
        let mut rng = Mulberry32::new(99);
        for _ in 0..1000 {
            let value = random_int(&mut rng, 1, 6);
            assert!((1..6).contains(&value));
        }
    }

    #[test]
    fn test_random_choice() {
        let items = ["a", "b", "c", "d"];
        let mut rng = Scripted::new(&[0.0, 0.26, 0.99]);
        assert_eq!(random_choice(&mut rng, &items), Ok(&"a"));
        assert_eq!(random_choice(&mut rng, &items), Ok(&"b"));
        assert_eq!(random_choice(&mut rng, &items), Ok(&"d"));

        let empty: [u8; 0] = [];
        assert_eq!(
            random_choice(&mut rng, &empty),
            Err(RngError::EmptyInput {
                operation: "random_choice"
            })
        );
    }

    #[test]
    fn test_shuffle_is_permutation_and_repeatable() {
        let original: Vec<u32> = (0..20).collect();
        let a = shuffled(&mut Mulberry32::new(5), &original).unwrap();
        let b = shuffled(&mut Mulberry32::new(5), &original).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, original);

        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, original);
    }

    #[test]
    fn test_shuffle_swap_indices() {
        // i=2 -> j=floor(0.0*3)=0, i=1 -> j=floor(0.99*2)=1
        let mut items = [1, 2, 3];
        let mut rng = Scripted::new(&[0.0, 0.99]);
        shuffle(&mut rng, &mut items).unwrap();
        assert_eq!(items, [3, 2, 1]);
    }

    #[test]
    fn test_shuffle_rejects_empty() {
        let mut empty: [u8; 0] = [];
        assert!(shuffle(&mut Mulberry32::new(1), &mut empty).is_err());
    }

    #[test]
    fn test_random_choices() {
        let items = [1, 2, 3, 4, 5];
        let mut rng = Mulberry32::new(3);
        assert!(random_choices(&mut rng, &items, 0, false).unwrap().is_empty());

        let unique = random_choices(&mut rng, &items, 3, false).unwrap();
        assert_eq!(unique.len(), 3);
        let mut deduped = unique.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 3);

        let all = random_choices(&mut rng, &items, 10, false).unwrap();
        assert_eq!(all.len(), 5);

        let with_dupes = random_choices(&mut rng, &items, 10, true).unwrap();
        assert_eq!(with_dupes.len(), 10);
    }

    #[test]
    fn test_weighted_choice() {
        let items = ["low", "high"];
        let weights = [1.0, 3.0];
        let mut rng = Scripted::new(&[0.2, 0.3, 0.9]);
        assert_eq!(weighted_choice(&mut rng, &items, &weights), Ok(&"low"));
        assert_eq!(weighted_choice(&mut rng, &items, &weights), Ok(&"high"));
        assert_eq!(weighted_choice(&mut rng, &items, &weights), Ok(&"high"));
    }

    #[test]
    fn test_weighted_choice_errors_and_fallback() {
        let mut rng = Mulberry32::new(1);
        assert_eq!(
            weighted_choice(&mut rng, &[1, 2], &[1.0]),
            Err(RngError::LengthMismatch {
                items: 2,
                weights: 1
            })
        );
        let empty: [u8; 0] = [];
        assert!(matches!(
            weighted_choice(&mut rng, &empty, &[]),
            Err(RngError::EmptyInput { .. })
        ));
        // all-zero weights never satisfy target < cumulative
        assert_eq!(weighted_choice(&mut rng, &[1, 2, 3], &[0.0, 0.0, 0.0]), Ok(&3));
    }

    #[test]
    fn test_random_boolean() {
        let mut rng = Scripted::new(&[0.1, 0.6]);
        assert!(random_boolean(&mut rng, 0.5));
        assert!(!random_boolean(&mut rng, 0.5));
        assert!(!random_boolean(&mut Mulberry32::new(1), 0.0));
    }

    #[test]
    fn test_random_normal_special_case() {
        let mut rng = Scripted::new(&[0.5, 0.5]);
        assert_eq!(random_normal(&mut rng, 3.25, 2.0), 3.25);
    }

    #[test]
    fn test_random_normal_statistics() {
        let mut rng = Mulberry32::new(2024);
        let samples: Vec<f64> = (0..5000).map(|_| random_normal(&mut rng, 10.0, 2.0)).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance =
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        assert!((mean - 10.0).abs() < 0.2, "mean {mean}");
        assert!((variance.sqrt() - 2.0).abs() < 0.2, "std dev {}", variance.sqrt());
    }

    #[test]
    fn test_random_normal_zero_draw_is_finite() {
        let mut rng = Scripted::new(&[0.0, 0.25]);
        assert!(random_normal(&mut rng, 0.0, 1.0).is_finite());
    }

    #[test]
    fn test_sphere_sampling() {
        let mut rng = Mulberry32::new(77);
        for _ in 0..500 {
            let inside = random_position_in_sphere(&mut rng, 4.0);
            assert!(inside.length() <= 4.0 + 1e-9);
            let surface = random_position_on_sphere(&mut rng, 4.0);
            assert!((surface.length() - 4.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sphere_draw_order() {
        // theta = 0, phi = acos(0) = pi/2, r = radius * cbrt(1/8)
        let mut rng = Scripted::new(&[0.0, 0.5, 0.125]);
        let position = random_position_in_sphere(&mut rng, 2.0);
        assert!((position.x - 1.0).abs() < 1e-12);
        assert!(position.y.abs() < 1e-12);
        assert!(position.z.abs() < 1e-12);
        assert_eq!(rng.cursor, 3);
    }

    #[test]
    fn test_random_color() {
        let mut rng = Scripted::new(&[0.5, 0.25, 0.75]);
        let color = random_color(&mut rng);
        assert_eq!(color, Rgb8 { r: 128, g: 64, b: 192 });
        assert_eq!(color.to_hex(), "#8040c0");
        assert_eq!(Rgb8 { r: 255, g: 0, b: 0 }.to_unit(), [1.0, 0.0, 0.0]);
    }
}
