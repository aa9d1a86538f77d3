//! Piecewise-linear region resampling to the canonical 68-point schema
//! (design spec §4.2).

use glam::Vec2;

use crate::observation::CENTROID_FALLBACK;

/// Resample `region` to exactly `target_len` points by piecewise-linear
/// interpolation along its parameter. An empty region is padded entirely
/// with [`CENTROID_FALLBACK`]; a single-point region is replicated.
#[must_use]
pub fn resample(region: &[Vec2], target_len: usize) -> Vec<Vec2> {
    if region.is_empty() {
        return vec![CENTROID_FALLBACK; target_len];
    }
    if region.len() == 1 || target_len == 1 {
        return vec![region[0]; target_len];
    }

    let src_last = (region.len() - 1) as f32;
    let dst_last = (target_len - 1) as f32;
    (0..target_len)
        .map(|i| {
            let t = (i as f32) / dst_last * src_last;
            let lo = t.floor() as usize;
            let hi = (lo + 1).min(region.len() - 1);
            let frac = t - (lo as f32);
            region[lo].lerp(region[hi], frac)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::resample;
    use glam::Vec2;

    #[test]
    fn empty_region_padded_with_centroid() {
        let out = resample(&[], 5);
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|p| (*p - super::CENTROID_FALLBACK).length() < 1e-6));
    }

    #[test]
    fn exact_length_is_preserved() {
        let region = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)];
        let out = resample(&region, 3);
        for (a, b) in out.iter().zip(region.iter()) {
            assert!((*a - *b).length() < 1e-5);
        }
    }

    #[test]
    fn upsampling_interpolates_between_endpoints() {
        let region = vec![Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0)];
        let out = resample(&region, 3);
        assert_eq!(out.len(), 3);
        assert!((out[0] - Vec2::new(0.0, 0.0)).length() < 1e-5);
        assert!((out[1] - Vec2::new(1.0, 0.0)).length() < 1e-5);
        assert!((out[2] - Vec2::new(2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn single_point_region_is_replicated() {
        let region = vec![Vec2::new(0.3, 0.4)];
        let out = resample(&region, 4);
        assert!(out.iter().all(|p| (*p - region[0]).length() < 1e-6));
    }
}
