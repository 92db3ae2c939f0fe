//! Vector helpers shared by the engine.
//!
//! Every vector carries its features first and an opaque identifier tag as
//! the last component. The tag is copied around but never takes part in a
//! distance, a sum or a division.

use crate::error::{KMeansError, Result};
use ndarray::{s, Array2, ArrayView1, ArrayViewMut1};

#[inline]
fn check_arity(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(KMeansError::ArityMismatch { expected, found });
    }
    Ok(())
}

/// Feature components of a vector, without the trailing tag
#[inline]
pub fn features<'a>(v: &ArrayView1<'a, f64>) -> ArrayView1<'a, f64> {
    let n = v.len().saturating_sub(1);
    (*v).slice_move(s![..n])
}

/// Euclidean distance between two vectors over their feature components
pub fn distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> Result<f64> {
    check_arity(a.len(), b.len())?;

    let mut sum = 0.0f64;
    for j in 0..a.len().saturating_sub(1) {
        let d = a[j] - b[j];
        sum += d * d;
    }
    Ok(sum.sqrt())
}

/// Exact feature-wise equality. Vectors of different lengths are never equal.
pub fn features_equal(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> bool {
    a.len() == b.len() && features(a) == features(b)
}

/// Add the features of `v` into `acc`, leaving the tag of `acc` untouched
pub fn add_features(acc: &mut ArrayViewMut1<f64>, v: &ArrayView1<f64>) -> Result<()> {
    check_arity(acc.len(), v.len())?;

    for j in 0..v.len().saturating_sub(1) {
        acc[j] += v[j];
    }
    Ok(())
}

/// Divide the features of `v` in place
pub fn divide_features(v: &mut ArrayViewMut1<f64>, divisor: f64) {
    let n = v.len().saturating_sub(1);
    v.slice_mut(s![..n]).mapv_inplace(|x| x / divisor);
}

/// Build a batch from row vectors, rejecting ragged input.
///
/// The arity of the first row is the reference; the first row that differs
/// yields [`KMeansError::ArityMismatch`]. An empty slice gives an empty batch.
pub fn batch_from_rows(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let arity = rows.first().map_or(0, Vec::len);
    for row in rows {
        check_arity(arity, row.len())?;
    }

    Ok(Array2::from_shape_fn((rows.len(), arity), |(i, j)| rows[i][j]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_distance_ignores_tag() {
        let a = array![0.0, 0.0, 100.0];
        let b = array![3.0, 4.0, -7.0];

        let d = distance(&a.view(), &b.view()).unwrap();
        assert_relative_eq!(d, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = array![1.5, -2.0, 8.25, 0.0];
        let b = array![-3.0, 4.5, 1.0, 9.0];

        assert_eq!(
            distance(&a.view(), &b.view()).unwrap(),
            distance(&b.view(), &a.view()).unwrap()
        );
    }

    #[test]
    fn test_distance_arity_mismatch() {
        let a = array![1.0, 2.0, 0.0];
        let b = array![1.0, 2.0, 3.0, 0.0];

        let err = distance(&a.view(), &b.view()).unwrap_err();
        assert_eq!(
            err,
            KMeansError::ArityMismatch {
                expected: 3,
                found: 4
            }
        );
    }

    #[test]
    fn test_features_equal() {
        let a = array![5.0, 5.0, 0.0];
        let b = array![5.0, 5.0, 1.0];
        let c = array![5.0, 5.5, 0.0];
        let d = array![5.0, 5.0, 5.0, 0.0];

        assert!(features_equal(&a.view(), &b.view()));
        assert!(!features_equal(&a.view(), &c.view()));
        assert!(!features_equal(&a.view(), &d.view()));
    }

    #[test]
    fn test_add_and_divide_leave_tag_alone() {
        let mut acc = array![0.0, 0.0, 0.0];
        add_features(&mut acc.view_mut(), &array![1.0, 2.0, 40.0].view()).unwrap();
        add_features(&mut acc.view_mut(), &array![3.0, 6.0, 41.0].view()).unwrap();
        divide_features(&mut acc.view_mut(), 2.0);

        assert_eq!(acc, array![2.0, 4.0, 0.0]);
    }

    #[test]
    fn test_add_arity_mismatch() {
        let mut acc = array![0.0, 0.0];
        let result = add_features(&mut acc.view_mut(), &array![1.0, 2.0, 3.0].view());
        assert!(matches!(result, Err(KMeansError::ArityMismatch { .. })));
    }

    #[test]
    fn test_batch_from_rows() {
        let batch = batch_from_rows(&[vec![0.0, 1.0, 0.0], vec![2.0, 3.0, 1.0]]).unwrap();
        assert_eq!(batch, array![[0.0, 1.0, 0.0], [2.0, 3.0, 1.0]]);

        let ragged = batch_from_rows(&[vec![0.0, 1.0, 0.0], vec![2.0, 1.0]]);
        assert_eq!(
            ragged.unwrap_err(),
            KMeansError::ArityMismatch {
                expected: 3,
                found: 2
            }
        );

        assert_eq!(batch_from_rows(&[]).unwrap().nrows(), 0);
    }
}
