//! 2D simplex noise.
//!
//! This is the permutation-polynomial variant that needs no lookup tables,
//! which is why the exact same arithmetic can run in `terrain.wgsl`. Keep
//! both in sync: the CPU copy is what the tests and height queries see.

const C: [f32; 4] = [
    0.211324865405187,  // (3 - sqrt(3)) / 6
    0.366025403784439,  // (sqrt(3) - 1) / 2
    -0.577350269189626, // -1 + 2 * C[0]
    0.024390243902439,  // 1 / 41
];

fn mod289(x: f32) -> f32 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute(x: f32) -> f32 {
    mod289((x * 34.0 + 1.0) * x)
}

fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Simplex noise at `(x, y)`. Roughly in `[-1, 1]`, exactly zero on lattice
/// points of the skewed grid such as the origin.
pub fn simplex2(x: f32, y: f32) -> f32 {
    // skew onto the simplex grid
    let s = (x + y) * C[1];
    let (ix, iy) = ((x + s).floor(), (y + s).floor());
    let t = (ix + iy) * C[0];
    let x0 = [x - ix + t, y - iy + t];

    let i1 = if x0[0] > x0[1] { [1.0, 0.0] } else { [0.0, 1.0] };
    let x1 = [x0[0] + C[0] - i1[0], x0[1] + C[0] - i1[1]];
    let x2 = [x0[0] + C[2], x0[1] + C[2]];

    let (ix, iy) = (mod289(ix), mod289(iy));
    let hashes = [
        permute(permute(iy) + ix),
        permute(permute(iy + i1[1]) + ix + i1[0]),
        permute(permute(iy + 1.0) + ix + 1.0),
    ];

    let corners = [x0, x1, x2];
    let mut n = 0.0;
    for (corner, hash) in corners.iter().zip(hashes) {
        let m = (0.5 - (corner[0] * corner[0] + corner[1] * corner[1])).max(0.0);
        let m = m * m;
        let m = m * m;
        // gradients from 41 points on a line, mapped onto a diamond
        let gx = 2.0 * fract(hash * C[3]) - 1.0;
        let h = gx.abs() - 0.5;
        let a0 = gx - (gx + 0.5).floor();
        let m = m * (1.79284291400159 - 0.85373472095314 * (a0 * a0 + h * h));
        n += m * (a0 * corner[0] + h * corner[1]);
    }
    130.0 * n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanishes_at_the_origin() {
        assert_eq!(simplex2(0.0, 0.0), 0.0);
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(simplex2(1.37, -4.2), simplex2(1.37, -4.2));
    }

    #[test]
    fn stays_within_unit_range() {
        let mut max: f32 = 0.0;
        for i in -100..100 {
            for j in -100..100 {
                let v = simplex2(i as f32 * 0.173, j as f32 * 0.219);
                max = max.max(v.abs());
            }
        }
        assert!(max <= 1.05, "noise peaked at {max}");
        assert!(max > 0.5, "noise is suspiciously flat: {max}");
    }

    #[test]
    fn is_continuous() {
        for i in 0..200 {
            let x = i as f32 * 0.05 - 5.0;
            let a = simplex2(x, 0.3);
            let b = simplex2(x + 1e-3, 0.3);
            assert!((a - b).abs() < 0.05);
        }
    }
}
