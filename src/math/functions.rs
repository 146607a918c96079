//! Model functions for peak fits.
//!
//! - `gaus`: unnormalised Gaussian with explicit amplitude
//! - `landau`: Landau density (rational approximations of CERNLIB `DENLAN`)
//! - `langaus`: Landau convolved with a Gaussian, evaluated by a midpoint sum
//! - `moyal`: closed-form approximation of the Landau shape

const INV_SQRT_2PI: f64 = 0.398_942_280_401_4;

/// Location of the Landau maximum for `mpv = 0, width = 1`.
pub const LANDAU_MP_SHIFT: f64 = -0.222_782_98;

/// Number of convolution steps in `langaus`.
const LANGAUS_STEPS: usize = 100;
/// The convolution extends to this many Gaussian sigmas on each side.
const LANGAUS_SIGMAS: f64 = 5.0;

/// `amplitude * exp(-0.5 ((x - mean) / sigma)^2)`.
pub fn gaus(x: f64, amplitude: f64, mean: f64, sigma: f64) -> f64 {
    if sigma == 0.0 {
        return if x == mean { amplitude } else { 0.0 };
    }
    let t = (x - mean) / sigma;
    amplitude * (-0.5 * t * t).exp()
}

/// Standard Landau density of `v = (x - location) / width`, without the `1 / width`
/// normalisation (callers that need a density in `x` divide by `width`).
pub fn landau(x: f64, location: f64, width: f64) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    denlan((x - location) / width)
}

fn ratio(p: &[f64; 5], q: &[f64; 5], t: f64) -> f64 {
    let num = p[0] + (p[1] + (p[2] + (p[3] + p[4] * t) * t) * t) * t;
    let den = q[0] + (q[1] + (q[2] + (q[3] + q[4] * t) * t) * t) * t;
    num / den
}

fn denlan(v: f64) -> f64 {
    const P1: [f64; 5] = [0.425_989_487_5, -0.124_976_255_0, 0.039_842_437_00, -0.006_298_287_635, 0.001_511_162_253];
    const Q1: [f64; 5] = [1.0, -0.338_826_062_9, 0.095_943_933_23, -0.016_080_422_83, 0.003_778_942_063];
    const P2: [f64; 5] = [0.178_854_160_9, 0.117_395_740_3, 0.014_888_505_18, -0.001_394_989_411, 0.000_128_361_721_1];
    const Q2: [f64; 5] = [1.0, 0.742_879_508_2, 0.315_393_296_1, 0.066_942_195_48, 0.008_790_609_714];
    const P3: [f64; 5] = [0.178_854_450_3, 0.093_591_616_62, 0.006_325_387_654, 0.000_066_116_673_19, -0.000_002_031_049_101];
    const Q3: [f64; 5] = [1.0, 0.609_780_992_1, 0.256_061_666_5, 0.047_467_223_84, 0.006_957_301_675];
    const P4: [f64; 5] = [0.987_405_440_7, 118.672_327_3, 849.279_436_0, -743.779_244_4, 427.026_218_6];
    const Q4: [f64; 5] = [1.0, 106.861_596_1, 337.649_621_4, 2016.712_389, 1597.063_511];
    const P5: [f64; 5] = [1.003_675_074, 167.570_243_4, 4789.711_289, 21217.867_67, -22324.949_10];
    const Q5: [f64; 5] = [1.0, 156.942_453_7, 3745.310_488, 9834.698_876, 66924.283_57];
    const P6: [f64; 5] = [1.000_827_619, 664.914_313_6, 62972.926_65, 475_554.699_8, -5_743_609.109];
    const Q6: [f64; 5] = [1.0, 651.410_109_8, 56974.733_33, 165_917.472_5, -2_815_759.939];
    const A1: [f64; 3] = [0.041_666_666_67, -0.019_965_277_78, 0.027_095_389_66];
    const A2: [f64; 2] = [-1.845_568_670, -4.284_640_743];

    if v < -5.5 {
        let u = (v + 1.0).exp();
        if u < 1e-10 {
            return 0.0;
        }
        let ue = (-1.0 / u).exp();
        let us = u.sqrt();
        0.398_942_280_3 * (ue / us) * (1.0 + (A1[0] + (A1[1] + A1[2] * u) * u) * u)
    } else if v < -1.0 {
        let u = (-v - 1.0).exp();
        (-u).exp() * u.sqrt() * ratio(&P1, &Q1, v)
    } else if v < 1.0 {
        ratio(&P2, &Q2, v)
    } else if v < 5.0 {
        ratio(&P3, &Q3, v)
    } else if v < 12.0 {
        let u = 1.0 / v;
        u * u * ratio(&P4, &Q4, u)
    } else if v < 50.0 {
        let u = 1.0 / v;
        u * u * ratio(&P5, &Q5, u)
    } else if v < 300.0 {
        let u = 1.0 / v;
        u * u * ratio(&P6, &Q6, u)
    } else {
        let u = 1.0 / (v - v * v.ln() / (v + 1.0));
        u * u * (1.0 + (A2[0] + A2[1] * u) * u)
    }
}

/// Landau ⊗ Gaussian.
///
/// Parameters:
/// - `par[0]`: Landau width (scale)
/// - `par[1]`: most probable value
/// - `par[2]`: total area
/// - `par[3]`: Gaussian sigma
pub fn langaus(x: f64, par: &[f64]) -> f64 {
    let (width, mp, area, gsigma) = (par[0], par[1], par[2], par[3]);
    if width <= 0.0 || gsigma <= 0.0 {
        return 0.0;
    }
    let mpc = mp - LANDAU_MP_SHIFT * width;
    let xlow = x - LANGAUS_SIGMAS * gsigma;
    let xupp = x + LANGAUS_SIGMAS * gsigma;
    let step = (xupp - xlow) / LANGAUS_STEPS as f64;

    let mut sum = 0.0;
    for i in 1..=LANGAUS_STEPS / 2 {
        let offset = (i as f64 - 0.5) * step;
        for xx in [xlow + offset, xupp - offset] {
            let fland = landau(xx, mpc, width) / width;
            sum += fland * gaus(x, 1.0, xx, gsigma);
        }
    }
    area * step * sum * INV_SQRT_2PI / gsigma
}

/// Moyal density with location `mean` and scale `sigma`.
pub fn moyal(x: f64, mean: f64, sigma: f64) -> f64 {
    if sigma <= 0.0 {
        return 0.0;
    }
    let t = (x - mean) / sigma;
    INV_SQRT_2PI / sigma * (-0.5 * ((-t).exp() + t)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integrate(f: impl Fn(f64) -> f64, a: f64, b: f64, n: usize) -> f64 {
        let h = (b - a) / n as f64;
        (0..n).map(|i| f(a + (i as f64 + 0.5) * h)).sum::<f64>() * h
    }

    #[test]
    fn gaus_peaks_at_mean() {
        assert_eq!(gaus(2.0, 3.0, 2.0, 0.5), 3.0);
        assert!((gaus(2.5, 1.0, 2.0, 0.5) - (-0.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn landau_maximum_near_known_shift() {
        let mut best = (f64::NEG_INFINITY, 0.0);
        let mut v = -2.0;
        while v < 2.0 {
            let d = landau(v, 0.0, 1.0);
            if d > best.0 {
                best = (d, v);
            }
            v += 0.001;
        }
        assert!((best.1 - LANDAU_MP_SHIFT).abs() < 0.01, "max at {}", best.1);
        assert!((best.0 - 0.1806).abs() < 0.002, "peak {}", best.0);
    }

    #[test]
    fn langaus_area_and_peak() {
        let par = [1.0, 20.0, 1000.0, 1.5];
        let area = integrate(|x| langaus(x, &par), -20.0, 2000.0, 60_000);
        // The Landau tail beyond the integration range holds a few permille.
        assert!((area - 1000.0).abs() < 15.0, "area {area}");

        let peak_x = (0..400)
            .map(|i| 10.0 + i as f64 * 0.05)
            .max_by(|a, b| langaus(*a, &par).partial_cmp(&langaus(*b, &par)).unwrap())
            .unwrap();
        // Gaussian smearing moves the maximum slightly above the Landau MP.
        assert!(peak_x > 19.5 && peak_x < 22.0, "peak at {peak_x}");
    }

    #[test]
    fn moyal_normalised() {
        let area = integrate(|x| moyal(x, 1.0, 0.5), -5.0, 60.0, 50_000);
        assert!((area - 1.0).abs() < 1e-3, "area {area}");
    }
}
