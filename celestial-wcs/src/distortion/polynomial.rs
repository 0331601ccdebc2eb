//! Polynomial evaluation and the 2-D root finder used to invert distortions.

/// `u^p · v^q`.
#[inline]
pub fn power_term(u: f64, v: f64, p: u16, q: u16) -> f64 {
    u.powi(i32::from(p)) * v.powi(i32::from(q))
}

/// Solves `f(x, y) = target` by Newton iteration with a central-difference
/// Jacobian. Converges when the step falls below `tol` relative to the
/// magnitude of the solution.
pub fn newton_raphson_2d<F>(
    target: (f64, f64),
    initial: (f64, f64),
    f: F,
    max_iter: usize,
    tol: f64,
) -> Result<(f64, f64), &'static str>
where
    F: Fn(f64, f64) -> (f64, f64),
{
    let (mut x, mut y) = initial;
    for _ in 0..max_iter {
        let (fx, fy) = f(x, y);
        let rx = fx - target.0;
        let ry = fy - target.1;

        let hx = 1e-6 * (1.0 + x.abs());
        let hy = 1e-6 * (1.0 + y.abs());
        let (ax_p, ay_p) = f(x + hx, y);
        let (ax_m, ay_m) = f(x - hx, y);
        let (bx_p, by_p) = f(x, y + hy);
        let (bx_m, by_m) = f(x, y - hy);
        let j = [
            [(ax_p - ax_m) / (2.0 * hx), (bx_p - bx_m) / (2.0 * hy)],
            [(ay_p - ay_m) / (2.0 * hx), (by_p - by_m) / (2.0 * hy)],
        ];

        let (dx, dy) = solve_2x2(j, (rx, ry)).ok_or("singular Jacobian")?;
        x -= dx;
        y -= dy;
        if !x.is_finite() || !y.is_finite() {
            return Err("iteration diverged");
        }
        if dx.abs() <= tol * (1.0 + x.abs()) && dy.abs() <= tol * (1.0 + y.abs()) {
            return Ok((x, y));
        }
    }
    Err("did not converge")
}

fn solve_2x2(m: [[f64; 2]; 2], b: (f64, f64)) -> Option<(f64, f64)> {
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    let scale = m.iter().flatten().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || det.abs() <= 1e-14 * scale * scale {
        return None;
    }
    Some((
        (b.0 * m[1][1] - b.1 * m[0][1]) / det,
        (m[0][0] * b.1 - m[1][0] * b.0) / det,
    ))
}
