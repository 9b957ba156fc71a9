//! Peak detection on one-dimensional signals
//!
//! Candidates are local maxima (flat tops resolve to their midpoint) which
//! are then filtered by height, by minimum separation and finally by
//! prominence, in that order.

use core::cmp::Ordering;

/// Conditions a local maximum has to satisfy to count as a peak.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeakCriteria {
    /// Minimum sample value
    pub height: Option<f64>,
    /// Minimum separation in samples; higher peaks win
    pub distance: Option<f64>,
    /// Minimum vertical drop to the higher of the two surrounding bases
    pub prominence: Option<f64>,
}

/// Indices of the peaks of `x`, in ascending order.
///
/// # Example
/// ```
/// use swing_fusion::peaks::{find_peaks, PeakCriteria};
///
/// let signal = [0.0, 2.0, 0.0, 1.0, 1.0, 1.0, 0.0, 5.0, 0.0];
/// assert_eq!(find_peaks(&signal, &PeakCriteria::default()), vec![1, 4, 7]);
///
/// let tall = PeakCriteria { height: Some(1.5), ..Default::default() };
/// assert_eq!(find_peaks(&signal, &tall), vec![1, 7]);
/// ```
pub fn find_peaks(x: &[f64], criteria: &PeakCriteria) -> Vec<usize> {
    let mut peaks = local_maxima(x);

    if let Some(height) = criteria.height {
        peaks.retain(|&p| x[p] >= height);
    }

    if let Some(distance) = criteria.distance {
        peaks = select_by_distance(x, &peaks, distance);
    }

    if let Some(min_prominence) = criteria.prominence {
        peaks.retain(|&p| prominence(x, p) >= min_prominence);
    }

    peaks
}

/// Local maxima, including the midpoint of flat maxima. The first and last
/// samples are never maxima.
pub fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if x.len() < 3 {
        return maxima;
    }

    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    maxima
}

/// Drop peaks closer than `distance` samples to a higher peak.
fn select_by_distance(x: &[f64], peaks: &[usize], distance: f64) -> Vec<usize> {
    let distance = distance.ceil().max(1.0) as usize;
    let mut keep = vec![true; peaks.len()];

    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| x[peaks[a]].partial_cmp(&x[peaks[b]]).unwrap_or(Ordering::Equal));

    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        for k in (0..j).rev() {
            if peaks[j] - peaks[k] >= distance {
                break;
            }
            keep[k] = false;
        }
        for k in j + 1..peaks.len() {
            if peaks[k] - peaks[j] >= distance {
                break;
            }
            keep[k] = false;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}

/// Prominence of the sample at `peak`: its height above the higher of the
/// lowest points reached walking left and right until a higher sample or
/// the signal edge.
pub fn prominence(x: &[f64], peak: usize) -> f64 {
    let top = x[peak];

    let left_base = x[..=peak]
        .iter()
        .rev()
        .take_while(|&&v| v <= top)
        .fold(top, |min, &v| min.min(v));

    let right_base = x[peak..]
        .iter()
        .take_while(|&&v| v <= top)
        .fold(top, |min, &v| min.min(v));

    top - left_base.max(right_base)
}
