//! One-dimensional Gaussian blur with reflected edges.

/// Gaussian kernel for `sigma`, truncated at 4 standard deviations and
/// normalized to unit sum. Always has odd length `2 * radius + 1`.
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (4.0 * sigma + 0.5) as usize;
    let mut kernel: Vec<f32> = (-(radius as isize)..=radius as isize)
        .map(|x| {
            let x = x as f32;
            (-0.5 * (x / sigma).powi(2)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Blurs a row in place, reflecting samples at the edges.
///
/// Reflection duplicates the edge sample (`a b c | c b a`), so a constant
/// row stays exactly constant under any kernel.
pub fn gaussian_blur_row(row: &mut [f32], sigma: f32) {
    let n = row.len();
    if n == 0 || sigma <= 0.0 {
        return;
    }
    let kernel = gaussian_kernel(sigma);
    let radius = kernel.len() / 2;
    let src = row.to_vec();
    for (i, slot) in row.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (j, &w) in kernel.iter().enumerate() {
            let idx = i as isize + j as isize - radius as isize;
            acc += src[reflect(idx, n)] * w;
        }
        *slot = acc;
    }
}

/// Maps an out-of-range index back into `[0, n)` by edge reflection.
fn reflect(idx: isize, n: usize) -> usize {
    let n = n as isize;
    let mut i = idx;
    // Period of the reflected sequence is 2n.
    i = i.rem_euclid(2 * n);
    if i >= n {
        i = 2 * n - 1 - i;
    }
    i as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel(0.5);
        assert_eq!(k.len(), 5);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert_eq!(k[0], k[4]);
        assert_eq!(k[1], k[3]);
        assert!(k[2] > k[1]);
    }

    #[test]
    fn constant_row_is_unchanged() {
        let mut row = vec![3.0; 16];
        gaussian_blur_row(&mut row, 0.5);
        for v in row {
            assert!((v - 3.0).abs() < 1e-5);
        }
    }

    #[test]
    fn blur_preserves_total_energy() {
        let mut row = vec![0.0; 32];
        row[16] = 100.0;
        let before: f32 = row.iter().sum();
        gaussian_blur_row(&mut row, 0.5);
        let after: f32 = row.iter().sum();
        assert!((before - after).abs() < 1e-3);
        // The impulse spread but stayed centered.
        assert!(row[16] > row[15] && row[15] > row[14]);
    }

    #[test]
    fn reflect_maps_out_of_range() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(2, 4), 2);
    }
}
